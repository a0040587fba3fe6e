//! Pending operation store
//!
//! Tracks operations that still need confirmations. An entry exists only
//! while its operation is active; finalization or a sweep removes it and
//! the id becomes reusable.
//!
//! The insertion-ordered index lets a sweep visit every active operation
//! without scanning the map, and its length is bounded: starting a fresh
//! operation on a full index first discards every pending confirmation.

use super::InvariantViolation;
use multiowned_common::{Address, ConfirmationBitmap, OperationId, QuorumError};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// In-flight confirmation record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingState {
    /// Confirmations still needed, always > 0
    pub yet_needed: usize,
    /// Slots that have confirmed
    pub done: ConfirmationBitmap,
    /// Position in the pending index
    pub list_index: usize,
}

/// Result of a single confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Caller had already confirmed; nothing changed
    AlreadyConfirmed,
    /// Confirmation recorded, `remaining` more needed
    RecordedPending { remaining: usize },
    /// Decisive confirmation; the entry has been removed
    Finalized,
}

impl ConfirmOutcome {
    #[inline]
    pub fn is_finalized(&self) -> bool {
        matches!(self, ConfirmOutcome::Finalized)
    }
}

/// What a confirm call did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmReport {
    pub outcome: ConfirmOutcome,
    /// The call started a previously inactive operation
    pub started: bool,
    /// Number of operations discarded by the capacity guard, if it fired
    pub swept: Option<usize>,
}

/// Active operations awaiting confirmation
#[derive(Debug, Clone)]
pub struct PendingOperationStore {
    pending: HashMap<OperationId, PendingState>,
    index: Vec<OperationId>,
    capacity: usize,
}

impl PendingOperationStore {
    /// Create an empty store whose index holds at most `capacity` operations
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: HashMap::new(),
            index: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    #[inline]
    pub fn is_active(&self, operation: &OperationId) -> bool {
        self.pending
            .get(operation)
            .map(|state| state.yet_needed > 0)
            .unwrap_or(false)
    }

    pub fn state(&self, operation: &OperationId) -> Option<&PendingState> {
        self.pending.get(operation)
    }

    /// Active operations in index order
    pub fn operations(&self) -> &[OperationId] {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether a confirmation from `slot` would finalize the operation
    pub fn would_finalize(&self, operation: &OperationId, slot: usize, required: usize) -> bool {
        match self.pending.get(operation) {
            Some(state) => state.yet_needed == 1 && !state.done.contains(slot),
            None => required == 1,
        }
    }

    /// Record a confirmation from `slot`; a fresh operation starts at
    /// `required` outstanding confirmations
    pub fn confirm(&mut self, operation: OperationId, slot: usize, required: usize) -> ConfirmReport {
        let mut swept = None;
        let started = !self.is_active(&operation);

        if started {
            if self.index.len() >= self.capacity {
                let count = self.clear_all();
                warn!(count, capacity = self.capacity, "Pending index full, discarding all pending confirmations");
                swept = Some(count);
            }

            self.pending.insert(
                operation,
                PendingState {
                    yet_needed: required,
                    done: ConfirmationBitmap::EMPTY,
                    list_index: self.index.len(),
                },
            );
            self.index.push(operation);
            debug!(operation = %operation, required, "Operation started");
        }

        let decisive = self
            .pending
            .get(&operation)
            .map(|state| !state.done.contains(slot) && state.yet_needed <= 1)
            .unwrap_or(false);

        let outcome = if decisive {
            self.remove(&operation);
            ConfirmOutcome::Finalized
        } else {
            match self.pending.get_mut(&operation) {
                Some(state) if !state.done.contains(slot) => {
                    state.yet_needed -= 1;
                    state.done.insert(slot);
                    ConfirmOutcome::RecordedPending {
                        remaining: state.yet_needed,
                    }
                }
                _ => ConfirmOutcome::AlreadyConfirmed,
            }
        };

        ConfirmReport {
            outcome,
            started,
            swept,
        }
    }

    /// Withdraw a non-final confirmation; returns confirmations still needed
    pub fn revoke(
        &mut self,
        operation: &OperationId,
        slot: usize,
        owner: Address,
    ) -> Result<usize, QuorumError> {
        let state = self
            .pending
            .get_mut(operation)
            .filter(|state| state.yet_needed > 0)
            .ok_or(QuorumError::OperationNotActive {
                operation: *operation,
            })?;

        if !state.done.remove(slot) {
            return Err(QuorumError::NotConfirmedYet {
                operation: *operation,
                owner,
            });
        }
        state.yet_needed += 1;
        Ok(state.yet_needed)
    }

    pub fn has_confirmed(&self, operation: &OperationId, slot: usize) -> Result<bool, QuorumError> {
        self.pending
            .get(operation)
            .filter(|state| state.yet_needed > 0)
            .map(|state| state.done.contains(slot))
            .ok_or(QuorumError::OperationNotActive {
                operation: *operation,
            })
    }

    /// Drop every pending operation; returns how many were dropped
    pub fn clear_all(&mut self) -> usize {
        let count = self.index.len();
        for operation in self.index.drain(..) {
            self.pending.remove(&operation);
        }
        count
    }

    /// Remove one entry, keeping the index dense
    fn remove(&mut self, operation: &OperationId) {
        let Some(state) = self.pending.remove(operation) else {
            return;
        };
        self.index.swap_remove(state.list_index);
        if let Some(moved) = self.index.get(state.list_index) {
            if let Some(moved_state) = self.pending.get_mut(moved) {
                moved_state.list_index = state.list_index;
            }
        }
    }

    /// Verify every entry is active, accounts for `required` confirmations,
    /// and is indexed
    pub fn check_invariants(&self, required: usize) -> Result<(), InvariantViolation> {
        if self.index.len() != self.pending.len() || self.index.len() > self.capacity {
            return Err(InvariantViolation::PendingIndex {
                indexed: self.index.len(),
                pending: self.pending.len(),
            });
        }
        for (operation, state) in &self.pending {
            // Each recorded bit accounts for exactly one confirmation already spent
            if state.yet_needed == 0
                || state.yet_needed + state.done.len() != required
                || self.index.get(state.list_index) != Some(operation)
            {
                return Err(InvariantViolation::Operation(*operation));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(n: u64) -> OperationId {
        OperationId::for_call("test(uint256)", &n).unwrap()
    }

    #[test]
    fn test_fresh_confirmation_records_pending() {
        let mut store = PendingOperationStore::new(8);
        let report = store.confirm(op(1), 1, 2);

        assert!(report.started);
        assert_eq!(report.swept, None);
        assert_eq!(report.outcome, ConfirmOutcome::RecordedPending { remaining: 1 });
        assert!(store.is_active(&op(1)));
        assert_eq!(store.has_confirmed(&op(1), 1), Ok(true));
        assert_eq!(store.has_confirmed(&op(1), 2), Ok(false));
        store.check_invariants(2).unwrap();
    }

    #[test]
    fn test_duplicate_confirmation_is_noop() {
        let mut store = PendingOperationStore::new(8);
        store.confirm(op(1), 1, 3);
        let before = store.state(&op(1)).cloned();

        let report = store.confirm(op(1), 1, 3);
        assert!(!report.started);
        assert_eq!(report.outcome, ConfirmOutcome::AlreadyConfirmed);
        assert_eq!(store.state(&op(1)).cloned(), before);
    }

    #[test]
    fn test_decisive_confirmation_removes_entry() {
        let mut store = PendingOperationStore::new(8);
        store.confirm(op(1), 1, 2);
        store.confirm(op(2), 1, 2);

        assert_eq!(store.confirm(op(1), 2, 2).outcome, ConfirmOutcome::Finalized);
        assert!(!store.is_active(&op(1)));
        assert_eq!(store.operations(), &[op(2)]);
        store.check_invariants(2).unwrap();
    }

    #[test]
    fn test_required_one_finalizes_immediately() {
        let mut store = PendingOperationStore::new(8);
        assert!(store.would_finalize(&op(1), 1, 1));

        let report = store.confirm(op(1), 1, 1);
        assert!(report.started);
        assert_eq!(report.outcome, ConfirmOutcome::Finalized);
        assert!(store.is_empty());
    }

    #[test]
    fn test_revoke_restores_state() {
        let mut store = PendingOperationStore::new(8);
        let owner = Address::from_low_u64(1);
        store.confirm(op(1), 1, 2);

        assert_eq!(store.revoke(&op(1), 1, owner), Ok(2));
        let state = store.state(&op(1)).unwrap();
        assert_eq!(state.yet_needed, 2);
        assert!(state.done.is_empty());
        assert!(store.is_active(&op(1)));
        store.check_invariants(2).unwrap();
    }

    #[test]
    fn test_revoke_errors() {
        let mut store = PendingOperationStore::new(8);
        let owner = Address::from_low_u64(2);

        assert!(matches!(
            store.revoke(&op(1), 2, owner),
            Err(QuorumError::OperationNotActive { .. })
        ));

        store.confirm(op(1), 1, 2);
        assert_eq!(
            store.revoke(&op(1), 2, owner),
            Err(QuorumError::NotConfirmedYet {
                operation: op(1),
                owner
            })
        );
    }

    #[test]
    fn test_has_confirmed_on_inactive() {
        let store = PendingOperationStore::new(8);
        assert!(matches!(
            store.has_confirmed(&op(9), 1),
            Err(QuorumError::OperationNotActive { .. })
        ));
    }

    #[test]
    fn test_swap_remove_keeps_index_consistent() {
        let mut store = PendingOperationStore::new(8);
        for n in 0..4 {
            store.confirm(op(n), 1, 2);
        }
        store.confirm(op(0), 2, 2);

        assert_eq!(store.state(&op(3)).unwrap().list_index, 0);
        assert_eq!(store.len(), 3);
        store.check_invariants(2).unwrap();
    }

    #[test]
    fn test_capacity_guard_sweeps_before_fresh_operation() {
        let mut store = PendingOperationStore::new(4);
        for n in 0..4 {
            store.confirm(op(n), 1, 2);
        }

        // Existing operation does not trip the guard
        let report = store.confirm(op(0), 1, 2);
        assert_eq!(report.swept, None);

        let report = store.confirm(op(4), 1, 2);
        assert_eq!(report.swept, Some(4));
        assert_eq!(report.outcome, ConfirmOutcome::RecordedPending { remaining: 1 });
        assert_eq!(store.operations(), &[op(4)]);
        for n in 0..4 {
            assert!(!store.is_active(&op(n)));
        }
    }

    #[test]
    fn test_clear_all() {
        let mut store = PendingOperationStore::new(8);
        store.confirm(op(1), 1, 3);
        store.confirm(op(2), 2, 3);

        assert_eq!(store.clear_all(), 2);
        assert!(store.is_empty());
        assert!(!store.is_active(&op(1)));
        store.check_invariants(3).unwrap();
    }
}
