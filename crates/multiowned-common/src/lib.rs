//! # Multiowned Common
//!
//! Shared types, errors, and digests for the multiowned quorum engine.
//!
//! ## Core Types
//!
//! - [`Address`]: opaque 20-byte owner identity, zero is the reserved sentinel
//! - [`OperationId`]: BLAKE3 digest of a canonically encoded call
//! - [`ConfirmationBitmap`]: one bit per owner slot
//! - [`QuorumEvent`]/[`EventJournal`]: record of every state-changing outcome
//!
//! ## Errors
//!
//! - [`QuorumError`]: authorization and quorum failures
//! - [`OracleError`]: failures of the oracle host layer

pub mod error;
pub mod events;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{MultiownedError, OracleError, QuorumError, Result};
pub use events::{ClearReason, EventJournal, QuorumEvent, RecordedEvent};
pub use types::{
    address::Address,
    bitmap::ConfirmationBitmap,
    operation::{AdminAction, OperationId},
};

/// Multiowned version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum number of owners; slots run from 1 to this value inclusive
pub const MAX_OWNERS: usize = 250;

/// Default bound on the pending-operation index before it is swept
pub const DEFAULT_MAX_PENDING: usize = 512;

/// Default bound on buffered events per journal
pub const DEFAULT_MAX_EVENTS: usize = 1024;
