//! Quorum-gated administration
//!
//! Owner set and threshold changes go through the same confirmation path as
//! any business operation, keyed by the action's own operation id. The
//! change is applied on the decisive confirmation, and every applied change
//! sweeps all pending operations since their confirmations were collected
//! under a different quorum.

use super::QuorumEngine;
use crate::store::ConfirmOutcome;
use multiowned_common::{AdminAction, Address, QuorumError, QuorumEvent, Result};
use tracing::{info, instrument};

impl QuorumEngine {
    /// Confirm adding `owner`
    pub fn add_owner(&mut self, caller: Address, owner: Address) -> Result<ConfirmOutcome> {
        self.administer(caller, AdminAction::AddOwner { owner })
    }

    /// Confirm removing `owner`
    pub fn remove_owner(&mut self, caller: Address, owner: Address) -> Result<ConfirmOutcome> {
        self.administer(caller, AdminAction::RemoveOwner { owner })
    }

    /// Confirm replacing `from` with `to` in `from`'s slot
    pub fn change_owner(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
    ) -> Result<ConfirmOutcome> {
        self.administer(caller, AdminAction::ChangeOwner { from, to })
    }

    /// Confirm a new requirement
    pub fn change_requirement(&mut self, caller: Address, required: usize) -> Result<ConfirmOutcome> {
        self.administer(caller, AdminAction::ChangeRequirement { required })
    }

    /// Validate, confirm, and on the decisive confirmation apply `action`
    #[instrument(skip(self))]
    pub fn administer(&mut self, caller: Address, action: AdminAction) -> Result<ConfirmOutcome> {
        let slot = self.caller_slot(&caller)?;
        self.validate_admin(&action)?;
        let operation = action.operation_id()?;

        let outcome = self.record_confirmation(operation, caller, slot);
        if outcome.is_finalized() {
            self.apply_admin(action);
        }
        Ok(outcome)
    }

    fn validate_admin(&self, action: &AdminAction) -> std::result::Result<(), QuorumError> {
        match action {
            AdminAction::AddOwner { owner } => self.registry.validate_add(owner),
            AdminAction::RemoveOwner { owner } => self.registry.validate_remove(owner),
            AdminAction::ChangeOwner { from, to } => self.registry.validate_change(from, to),
            AdminAction::ChangeRequirement { required } => {
                self.registry.validate_requirement(*required)
            }
        }
    }

    /// Apply an action that passed `validate_admin` on this call, then sweep
    /// the pending operations collected under the old quorum
    fn apply_admin(&mut self, action: AdminAction) {
        let event = match action {
            AdminAction::AddOwner { owner } => {
                self.registry.insert_owner(owner);
                QuorumEvent::OwnerAdded { owner }
            }
            AdminAction::RemoveOwner { owner } => {
                self.registry.drop_owner(&owner);
                QuorumEvent::OwnerRemoved { owner }
            }
            AdminAction::ChangeOwner { from, to } => {
                self.registry.replace_owner(&from, to);
                QuorumEvent::OwnerChanged {
                    old_owner: from,
                    new_owner: to,
                }
            }
            AdminAction::ChangeRequirement { required } => {
                self.registry.set_required(required);
                QuorumEvent::RequirementChanged { required }
            }
        };

        info!(
            ?event,
            owners = self.registry.num_owners(),
            required = self.registry.required(),
            "Administrative change applied"
        );
        self.journal.record(event);
        self.clear_pending();
        debug_assert!(self.check_invariants().is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiowned_common::{ClearReason, OperationId};

    fn owners(n: u64) -> Vec<Address> {
        (1..=n).map(Address::from_low_u64).collect()
    }

    #[test]
    fn test_add_owner_needs_quorum() {
        let o = owners(3);
        let mut engine = QuorumEngine::initialize(&o, 2).unwrap();
        let new_owner = Address::from_low_u64(10);

        assert_eq!(
            engine.add_owner(o[0], new_owner).unwrap(),
            ConfirmOutcome::RecordedPending { remaining: 1 }
        );
        assert!(!engine.is_owner(&new_owner));

        assert_eq!(engine.add_owner(o[2], new_owner).unwrap(), ConfirmOutcome::Finalized);
        assert!(engine.is_owner(&new_owner));
        assert_eq!(engine.num_owners(), 4);
        assert_eq!(engine.get_owner(3), Some(new_owner));
    }

    #[test]
    fn test_admin_change_clears_pending() {
        let o = owners(3);
        let mut engine = QuorumEngine::initialize(&o, 2).unwrap();
        let business = OperationId::for_call("withdraw(uint256)", &5u64).unwrap();

        engine.confirm_or_execute(business, o[0]).unwrap();
        engine.change_requirement(o[0], 3).unwrap();
        engine.change_requirement(o[1], 3).unwrap();

        assert_eq!(engine.required(), 3);
        assert!(!engine.is_operation_active(&business));
        assert!(matches!(
            engine.has_owner_confirmed(&business, &o[0]).unwrap_err().as_quorum(),
            Some(QuorumError::OperationNotActive { .. })
        ));
        assert!(engine.events().any(|e| matches!(
            e,
            QuorumEvent::PendingCleared {
                reason: ClearReason::AdminChange,
                count: 1
            }
        )));
    }

    #[test]
    fn test_sweep_follows_applied_change() {
        let o = owners(3);
        let mut engine = QuorumEngine::initialize(&o, 2).unwrap();
        let newcomer = Address::from_low_u64(40);
        let business = OperationId::for_call("withdraw(uint256)", &9u64).unwrap();

        engine.confirm_or_execute(business, o[1]).unwrap();
        engine.add_owner(o[0], newcomer).unwrap();
        engine.drain_events();

        assert!(engine.add_owner(o[2], newcomer).unwrap().is_finalized());
        let events: Vec<_> = engine.drain_events().into_iter().map(|r| r.event).collect();
        assert!(matches!(events[0], QuorumEvent::FinalConfirmation { .. }));
        assert_eq!(events[1], QuorumEvent::OwnerAdded { owner: newcomer });
        assert_eq!(
            events[2],
            QuorumEvent::PendingCleared {
                reason: ClearReason::AdminChange,
                count: 1
            }
        );
        assert_eq!(engine.pending_count(), 0);
        engine.check_invariants().unwrap();
    }

    #[test]
    fn test_validation_failure_leaves_state_untouched() {
        let o = owners(2);
        let mut engine = QuorumEngine::initialize(&o, 2).unwrap();

        let err = engine.add_owner(o[0], o[1]).unwrap_err();
        assert!(matches!(
            err.as_quorum(),
            Some(QuorumError::DuplicateOwner { .. })
        ));
        let err = engine.remove_owner(o[0], o[1]).unwrap_err();
        assert!(matches!(
            err.as_quorum(),
            Some(QuorumError::InvalidQuorum { .. })
        ));
        let err = engine.change_requirement(o[0], 0).unwrap_err();
        assert!(matches!(
            err.as_quorum(),
            Some(QuorumError::InvalidQuorum { .. })
        ));
        assert_eq!(engine.pending_count(), 0);
    }

    #[test]
    fn test_non_owner_cannot_administer() {
        let o = owners(2);
        let mut engine = QuorumEngine::initialize(&o, 1).unwrap();
        let stranger = Address::from_low_u64(50);

        let err = engine.add_owner(stranger, stranger).unwrap_err();
        assert!(matches!(err.as_quorum(), Some(QuorumError::NotAnOwner { .. })));
        assert!(!engine.is_owner(&stranger));
    }

    #[test]
    fn test_change_owner_keeps_slot() {
        let o = owners(3);
        let mut engine = QuorumEngine::initialize(&o, 1).unwrap();
        let replacement = Address::from_low_u64(30);

        assert!(engine.change_owner(o[0], o[1], replacement).unwrap().is_finalized());
        assert_eq!(engine.owners(), vec![o[0], replacement, o[2]]);
        assert!(engine.events().any(|e| *e
            == QuorumEvent::OwnerChanged {
                old_owner: o[1],
                new_owner: replacement
            }));
    }

    #[test]
    fn test_remove_owner_compacts() {
        let o = owners(4);
        let mut engine = QuorumEngine::initialize(&o, 1).unwrap();

        engine.remove_owner(o[3], o[0]).unwrap();
        assert_eq!(engine.owners(), vec![o[3], o[1], o[2]]);
        engine.check_invariants().unwrap();
    }

    #[test]
    fn test_removed_owner_loses_vote() {
        let o = owners(3);
        let mut engine = QuorumEngine::initialize(&o, 1).unwrap();

        engine.remove_owner(o[0], o[2]).unwrap();
        let op = OperationId::for_call("ping()", &()).unwrap();
        assert!(matches!(
            engine.confirm_or_execute(op, o[2]).unwrap_err().as_quorum(),
            Some(QuorumError::NotAnOwner { .. })
        ));
    }
}
