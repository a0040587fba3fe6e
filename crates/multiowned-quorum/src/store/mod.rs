//! Owned state of the quorum engine
//!
//! This module provides:
//! - The owner registry (slot table with compaction)
//! - The pending operation store (confirmation bitmaps and the sweep index)

pub mod pending;
pub mod registry;

use multiowned_common::OperationId;
use thiserror::Error;

pub use pending::{ConfirmOutcome, ConfirmReport, PendingOperationStore, PendingState};
pub use registry::OwnerRegistry;

/// A broken internal invariant; never produced by a correct engine
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("Owner count out of range: {0}")]
    OwnerCount(usize),

    #[error("Sentinel slot is occupied")]
    SentinelOccupied,

    #[error("Requirement {required} invalid for {owners} owners")]
    Quorum { required: usize, owners: usize },

    #[error("Owner index has {indexed} entries for {owners} owners")]
    IndexSize { indexed: usize, owners: usize },

    #[error("Slot {0} breaks the owner bijection")]
    Slot(usize),

    #[error("Pending index has {indexed} entries for {pending} operations")]
    PendingIndex { indexed: usize, pending: usize },

    #[error("Pending operation {0} is inconsistent")]
    Operation(OperationId),
}
