//! Quorum engine
//!
//! Composes the owner registry and the pending store into the callable
//! surface:
//! 1. Authenticates the caller against the registry
//! 2. Records the caller's confirmation under its slot bit
//! 3. Reports whether the protected action may run on this call
//!
//! The caller identity is an explicit argument of every call. Failed calls
//! leave both stores untouched.

mod admin;

use crate::config::QuorumConfig;
use crate::store::{
    ConfirmOutcome, InvariantViolation, OwnerRegistry, PendingOperationStore, PendingState,
};
use multiowned_common::{
    Address, ClearReason, EventJournal, OperationId, QuorumError, QuorumEvent, RecordedEvent,
    Result, MAX_OWNERS,
};
use tracing::{debug, info, instrument};

/// Multi-owner confirmation engine
#[derive(Debug, Clone)]
pub struct QuorumEngine {
    registry: OwnerRegistry,
    pending: PendingOperationStore,
    journal: EventJournal,
}

impl QuorumEngine {
    /// Create an engine from configuration
    pub fn new(config: &QuorumConfig) -> Result<Self> {
        config.validate()?;
        let registry = OwnerRegistry::initialize(&config.owners, config.required)?;

        info!(
            owners = registry.num_owners(),
            required = registry.required(),
            max_pending = config.max_pending,
            max_events = config.max_events,
            "Quorum engine initialized"
        );

        Ok(Self {
            registry,
            pending: PendingOperationStore::new(config.max_pending),
            journal: EventJournal::with_max_events(config.max_events),
        })
    }

    /// Create an engine with the default pending-index bound
    pub fn initialize(owners: &[Address], required: usize) -> Result<Self> {
        Self::new(&QuorumConfig::new(owners.to_vec(), required))
    }

    /// Record `caller`'s confirmation of `operation`.
    ///
    /// Only [`ConfirmOutcome::Finalized`] permits the protected action to run
    /// on this call. The other outcomes are the normal state while a quorum
    /// accumulates, not errors.
    #[instrument(skip(self))]
    pub fn confirm_or_execute(
        &mut self,
        operation: OperationId,
        caller: Address,
    ) -> Result<ConfirmOutcome> {
        let slot = self.caller_slot(&caller)?;
        Ok(self.record_confirmation(operation, caller, slot))
    }

    /// Confirm `operation` and run `body` if this confirmation is decisive.
    ///
    /// Returns `Ok(None)` while confirmations are still outstanding. If
    /// `body` fails, its error is returned and the confirmation is not
    /// recorded, so the call as a whole has no effect.
    pub fn execute_if_confirmed<T, F>(
        &mut self,
        operation: OperationId,
        caller: Address,
        body: F,
    ) -> Result<Option<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        let slot = self.caller_slot(&caller)?;

        if !self
            .pending
            .would_finalize(&operation, slot, self.registry.required())
        {
            self.record_confirmation(operation, caller, slot);
            return Ok(None);
        }

        let value = body()?;
        let outcome = self.record_confirmation(operation, caller, slot);
        debug_assert!(outcome.is_finalized());
        Ok(Some(value))
    }

    /// Withdraw `caller`'s earlier confirmation of an active operation
    #[instrument(skip(self))]
    pub fn revoke_confirmation(&mut self, operation: OperationId, caller: Address) -> Result<()> {
        let slot = self.caller_slot(&caller)?;
        let remaining = self.pending.revoke(&operation, slot, caller)?;

        debug!(owner = %caller, operation = %operation, remaining, "Confirmation revoked");
        self.journal.record(QuorumEvent::Revoke {
            owner: caller,
            operation,
        });
        Ok(())
    }

    /// Whether `owner` has confirmed the active `operation`
    pub fn has_owner_confirmed(&self, operation: &OperationId, owner: &Address) -> Result<bool> {
        if !self.pending.is_active(operation) {
            return Err(QuorumError::OperationNotActive {
                operation: *operation,
            }
            .into());
        }
        let slot = self
            .registry
            .slot_of(owner)
            .ok_or(QuorumError::UnknownOwner { owner: *owner })?;
        Ok(self.pending.has_confirmed(operation, slot)?)
    }

    /// Succeeds only for owners, so a new owner can check their identity
    pub fn am_i_owner(&self, caller: &Address) -> Result<bool> {
        self.caller_slot(caller)?;
        Ok(true)
    }

    pub fn is_owner(&self, identity: &Address) -> bool {
        self.registry.is_owner(identity)
    }

    /// Owner at a 0-indexed position
    pub fn get_owner(&self, index: usize) -> Option<Address> {
        self.registry.get_owner(index)
    }

    pub fn owners(&self) -> Vec<Address> {
        self.registry.owners()
    }

    pub fn num_owners(&self) -> usize {
        self.registry.num_owners()
    }

    pub fn required(&self) -> usize {
        self.registry.required()
    }

    pub fn max_owners(&self) -> usize {
        MAX_OWNERS
    }

    pub fn is_operation_active(&self, operation: &OperationId) -> bool {
        self.pending.is_active(operation)
    }

    pub fn pending_state(&self, operation: &OperationId) -> Option<&PendingState> {
        self.pending.state(operation)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Active operations in index order
    pub fn pending_operations(&self) -> &[OperationId] {
        self.pending.operations()
    }

    pub fn events(&self) -> impl Iterator<Item = &QuorumEvent> {
        self.journal.events()
    }

    /// Take every event recorded since the last drain
    pub fn drain_events(&mut self) -> Vec<RecordedEvent<QuorumEvent>> {
        self.journal.drain()
    }

    pub fn check_invariants(&self) -> std::result::Result<(), InvariantViolation> {
        self.registry.check_invariants()?;
        self.pending.check_invariants(self.registry.required())
    }

    fn caller_slot(&self, caller: &Address) -> std::result::Result<usize, QuorumError> {
        self.registry
            .slot_of(caller)
            .ok_or(QuorumError::NotAnOwner { caller: *caller })
    }

    fn record_confirmation(
        &mut self,
        operation: OperationId,
        caller: Address,
        slot: usize,
    ) -> ConfirmOutcome {
        let report = self
            .pending
            .confirm(operation, slot, self.registry.required());

        if let Some(count) = report.swept {
            debug!(count, reason = %ClearReason::Capacity, "Pending operations cleared");
            self.journal.record(QuorumEvent::PendingCleared {
                reason: ClearReason::Capacity,
                count,
            });
        }

        match report.outcome {
            ConfirmOutcome::Finalized => {
                info!(owner = %caller, operation = %operation, "Operation finalized");
                self.journal.record(QuorumEvent::FinalConfirmation {
                    owner: caller,
                    operation,
                });
            }
            ConfirmOutcome::RecordedPending { remaining } => {
                debug!(owner = %caller, operation = %operation, remaining, "Confirmation recorded");
                self.journal.record(QuorumEvent::Confirmation {
                    owner: caller,
                    operation,
                });
            }
            ConfirmOutcome::AlreadyConfirmed => {
                debug!(owner = %caller, operation = %operation, "Duplicate confirmation ignored");
            }
        }

        debug_assert!(self.check_invariants().is_ok());
        report.outcome
    }

    /// Sweep every pending operation after an owner or threshold change
    fn clear_pending(&mut self) {
        let count = self.pending.clear_all();
        debug!(count, reason = %ClearReason::AdminChange, "Pending operations cleared");
        self.journal.record(QuorumEvent::PendingCleared {
            reason: ClearReason::AdminChange,
            count,
        });
    }
}
