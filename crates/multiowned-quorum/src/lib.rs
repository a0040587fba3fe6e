//! # Multiowned Quorum
//!
//! Quorum-gated confirmation engine: a bounded set of equal-weight owners
//! jointly authorizes operations once a required number of distinct owners
//! have confirmed them.
//!
//! ## Components
//!
//! - **OwnerRegistry**: slot-indexed owner set with compaction on removal
//! - **PendingOperationStore**: per-operation confirmation bitmaps with a
//!   bounded sweep index
//! - **QuorumEngine**: caller authentication, confirmation, revocation, and
//!   quorum-gated administration of the owner set and threshold
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                    QuorumEngine                      │
//! ├──────────────────────────────────────────────────────┤
//! │  ┌───────────────┐          ┌─────────────────────┐  │
//! │  │ OwnerRegistry │──slot──▶ │ PendingOperation    │  │
//! │  │  (slots 1..n) │          │ Store (bitmaps)     │  │
//! │  └───────────────┘          └─────────────────────┘  │
//! │          ▲ admin actions finalize, then sweep         │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use multiowned_common::{Address, OperationId};
//! use multiowned_quorum::{ConfirmOutcome, QuorumEngine};
//!
//! let owners: Vec<Address> = (1..=3).map(Address::from_low_u64).collect();
//! let mut engine = QuorumEngine::initialize(&owners, 2).unwrap();
//! let op = OperationId::for_call("withdraw(uint256)", &10u64).unwrap();
//!
//! assert!(!engine.confirm_or_execute(op, owners[0]).unwrap().is_finalized());
//! assert_eq!(engine.confirm_or_execute(op, owners[1]).unwrap(), ConfirmOutcome::Finalized);
//! ```

pub mod config;
pub mod engine;
pub mod store;

pub use config::QuorumConfig;
pub use engine::QuorumEngine;
pub use store::{
    ConfirmOutcome, ConfirmReport, InvariantViolation, OwnerRegistry, PendingOperationStore,
    PendingState,
};
