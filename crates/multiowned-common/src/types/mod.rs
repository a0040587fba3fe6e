//! Core data types for the multiowned engine

pub mod address;
pub mod bitmap;
pub mod operation;
