//! Error types for the multiowned engine
//!
//! Provides a unified error type and domain-specific error variants

use crate::types::{address::Address, operation::OperationId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Result type alias using MultiownedError
pub type Result<T> = std::result::Result<T, MultiownedError>;

/// Unified error type for multiowned operations
#[derive(Debug, Error)]
pub enum MultiownedError {
    // Quorum and ownership errors
    #[error("Quorum error: {0}")]
    Quorum(#[from] QuorumError),

    // Host action errors
    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl MultiownedError {
    /// The quorum failure behind this error, if any
    pub fn as_quorum(&self) -> Option<&QuorumError> {
        match self {
            MultiownedError::Quorum(err) => Some(err),
            _ => None,
        }
    }
}

/// Authorization and quorum failures
///
/// Every variant names the precondition that failed. A call that returns
/// one of these has left owner and pending state untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuorumError {
    #[error("Caller {caller} is not an owner")]
    NotAnOwner { caller: Address },

    #[error("Unknown owner: {owner}")]
    UnknownOwner { owner: Address },

    #[error("Duplicate or reserved owner address: {owner}")]
    DuplicateOwner { owner: Address },

    #[error("Invalid owner count: {count} (must be 1..={max})")]
    InvalidOwnerCount { count: usize, max: usize },

    #[error("Invalid quorum: {required} of {owners} owners")]
    InvalidQuorum { required: usize, owners: usize },

    #[error("Owner capacity exceeded: {max} owners")]
    CapacityExceeded { max: usize },

    #[error("Operation {operation} is not active")]
    OperationNotActive { operation: OperationId },

    #[error("Owner {owner} has not confirmed operation {operation}")]
    NotConfirmedYet {
        operation: OperationId,
        owner: Address,
    },
}

/// Failures of the oracle host action layer
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OracleError {
    #[error("Invalid nonce: expected {expected}, got {got}")]
    InvalidNonce { expected: u64, got: u64 },

    #[error("Incorrect payment: price is {expected}, paid {got}")]
    IncorrectPayment { expected: Decimal, got: Decimal },

    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        requested: Decimal,
        available: Decimal,
    },

    #[error("Amount must not be negative")]
    InvalidAmount,
}

impl From<bincode::Error> for MultiownedError {
    fn from(err: bincode::Error) -> Self {
        MultiownedError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for MultiownedError {
    fn from(err: serde_json::Error) -> Self {
        MultiownedError::Serialization(err.to_string())
    }
}

impl From<hex::FromHexError> for MultiownedError {
    fn from(err: hex::FromHexError) -> Self {
        MultiownedError::Serialization(err.to_string())
    }
}
