//! Owner registry
//!
//! Owners live in a fixed table indexed by slot. Slot 0 is the sentinel and
//! stays empty; occupied slots are kept dense in `1..=num_owners` by
//! compacting after every removal. The reverse index maps each owner back
//! to its slot, which is also its bit in confirmation bitmaps.

use super::InvariantViolation;
use multiowned_common::{Address, QuorumError, MAX_OWNERS};
use std::collections::HashMap;
use tracing::debug;

/// Bounded owner set with stable slot assignment
#[derive(Debug, Clone)]
pub struct OwnerRegistry {
    /// Slot table, index 0 unused; `Address::ZERO` marks an empty slot
    slots: Vec<Address>,
    /// Reverse lookup: owner -> slot
    index: HashMap<Address, usize>,
    num_owners: usize,
    required: usize,
}

impl OwnerRegistry {
    /// Build the registry from the initial owner list, assigning slots `1..=n`
    /// in input order
    pub fn initialize(owners: &[Address], required: usize) -> Result<Self, QuorumError> {
        if owners.is_empty() || owners.len() > MAX_OWNERS {
            return Err(QuorumError::InvalidOwnerCount {
                count: owners.len(),
                max: MAX_OWNERS,
            });
        }
        check_quorum(required, owners.len())?;

        let mut registry = Self {
            slots: vec![Address::ZERO; MAX_OWNERS + 1],
            index: HashMap::with_capacity(owners.len()),
            num_owners: 0,
            required,
        };

        for (i, owner) in owners.iter().enumerate() {
            if owner.is_zero() || registry.is_owner(owner) {
                return Err(QuorumError::DuplicateOwner { owner: *owner });
            }
            let slot = i + 1;
            registry.slots[slot] = *owner;
            registry.index.insert(*owner, slot);
        }
        registry.num_owners = owners.len();

        Ok(registry)
    }

    #[inline]
    pub fn is_owner(&self, identity: &Address) -> bool {
        self.index.contains_key(identity)
    }

    /// Slot of an owner, `None` for non-owners
    #[inline]
    pub fn slot_of(&self, identity: &Address) -> Option<usize> {
        self.index.get(identity).copied()
    }

    /// Owner at a 0-indexed position
    pub fn get_owner(&self, index: usize) -> Option<Address> {
        if index >= self.num_owners {
            return None;
        }
        Some(self.slots[index + 1])
    }

    /// Owners in slot order
    pub fn owners(&self) -> Vec<Address> {
        self.slots[1..=self.num_owners].to_vec()
    }

    pub fn num_owners(&self) -> usize {
        self.num_owners
    }

    pub fn required(&self) -> usize {
        self.required
    }

    pub fn validate_add(&self, owner: &Address) -> Result<(), QuorumError> {
        if owner.is_zero() || self.is_owner(owner) {
            return Err(QuorumError::DuplicateOwner { owner: *owner });
        }
        if self.num_owners == MAX_OWNERS {
            return Err(QuorumError::CapacityExceeded { max: MAX_OWNERS });
        }
        Ok(())
    }

    /// Append an owner in the next free slot
    pub fn add_owner(&mut self, owner: Address) -> Result<usize, QuorumError> {
        self.validate_add(&owner)?;
        Ok(self.insert_owner(owner))
    }

    /// Append without validation; `validate_add` must have passed
    pub(crate) fn insert_owner(&mut self, owner: Address) -> usize {
        self.num_owners += 1;
        let slot = self.num_owners;
        self.slots[slot] = owner;
        self.index.insert(owner, slot);

        debug!(owner = %owner, slot, "Owner slot assigned");
        slot
    }

    pub fn validate_remove(&self, owner: &Address) -> Result<(), QuorumError> {
        if !self.is_owner(owner) {
            return Err(QuorumError::UnknownOwner { owner: *owner });
        }
        check_quorum(self.required, self.num_owners - 1)
    }

    /// Remove an owner and compact the slot table
    pub fn remove_owner(&mut self, owner: &Address) -> Result<(), QuorumError> {
        self.validate_remove(owner)?;
        self.drop_owner(owner);
        Ok(())
    }

    /// Remove without validation; `validate_remove` must have passed
    pub(crate) fn drop_owner(&mut self, owner: &Address) {
        if let Some(slot) = self.index.remove(owner) {
            self.slots[slot] = Address::ZERO;
        }
        self.reorganize();
    }

    pub fn validate_change(&self, from: &Address, to: &Address) -> Result<(), QuorumError> {
        if !self.is_owner(from) {
            return Err(QuorumError::UnknownOwner { owner: *from });
        }
        if to.is_zero() || self.is_owner(to) {
            return Err(QuorumError::DuplicateOwner { owner: *to });
        }
        Ok(())
    }

    /// Replace `from` with `to`, keeping the slot
    pub fn change_owner(&mut self, from: &Address, to: Address) -> Result<usize, QuorumError> {
        self.validate_change(from, &to)?;
        self.replace_owner(from, to)
            .ok_or(QuorumError::UnknownOwner { owner: *from })
    }

    /// Swap `to` into `from`'s slot; `validate_change` must have passed
    pub(crate) fn replace_owner(&mut self, from: &Address, to: Address) -> Option<usize> {
        let slot = self.index.remove(from)?;
        self.slots[slot] = to;
        self.index.insert(to, slot);
        Some(slot)
    }

    pub fn validate_requirement(&self, required: usize) -> Result<(), QuorumError> {
        check_quorum(required, self.num_owners)
    }

    pub fn change_requirement(&mut self, required: usize) -> Result<(), QuorumError> {
        self.validate_requirement(required)?;
        self.set_required(required);
        Ok(())
    }

    pub(crate) fn set_required(&mut self, required: usize) {
        self.required = required;
    }

    /// Move owners from the tail into holes until the table is dense.
    ///
    /// Owners already below the last hole keep their slots, so the cost is
    /// bounded by the number of holes rather than the owner count.
    fn reorganize(&mut self) {
        let mut free = 1;
        while free < self.num_owners {
            while free < self.num_owners && !self.slots[free].is_zero() {
                free += 1;
            }
            while self.num_owners > 1 && self.slots[self.num_owners].is_zero() {
                self.num_owners -= 1;
            }
            if free < self.num_owners
                && self.slots[free].is_zero()
                && !self.slots[self.num_owners].is_zero()
            {
                let moved = self.slots[self.num_owners];
                self.slots[free] = moved;
                self.slots[self.num_owners] = Address::ZERO;
                self.index.insert(moved, free);
                debug!(owner = %moved, from = self.num_owners, to = free, "Owner slot compacted");
            }
        }
    }

    /// Verify the slot table and reverse index describe the same bijection
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        if self.num_owners == 0 || self.num_owners > MAX_OWNERS {
            return Err(InvariantViolation::OwnerCount(self.num_owners));
        }
        if !self.slots[0].is_zero() {
            return Err(InvariantViolation::SentinelOccupied);
        }
        if self.required == 0 || self.required > self.num_owners {
            return Err(InvariantViolation::Quorum {
                required: self.required,
                owners: self.num_owners,
            });
        }
        if self.index.len() != self.num_owners {
            return Err(InvariantViolation::IndexSize {
                indexed: self.index.len(),
                owners: self.num_owners,
            });
        }
        for (slot, owner) in self.slots.iter().enumerate().skip(1) {
            let occupied = slot <= self.num_owners;
            if occupied == owner.is_zero() || (occupied && self.slot_of(owner) != Some(slot)) {
                return Err(InvariantViolation::Slot(slot));
            }
        }
        Ok(())
    }
}

fn check_quorum(required: usize, owners: usize) -> Result<(), QuorumError> {
    if required == 0 || required > owners {
        return Err(QuorumError::InvalidQuorum { required, owners });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addrs(n: u64) -> Vec<Address> {
        (1..=n).map(Address::from_low_u64).collect()
    }

    #[test]
    fn test_initialize_assigns_slots_in_order() {
        let owners = addrs(3);
        let registry = OwnerRegistry::initialize(&owners, 2).unwrap();

        assert_eq!(registry.num_owners(), 3);
        assert_eq!(registry.owners(), owners);
        assert_eq!(registry.slot_of(&owners[0]), Some(1));
        assert_eq!(registry.slot_of(&owners[2]), Some(3));
        assert_eq!(registry.get_owner(0), Some(owners[0]));
        assert_eq!(registry.get_owner(3), None);
        registry.check_invariants().unwrap();
    }

    #[test]
    fn test_initialize_rejects_bad_input() {
        assert!(matches!(
            OwnerRegistry::initialize(&[], 1),
            Err(QuorumError::InvalidOwnerCount { count: 0, .. })
        ));
        assert!(matches!(
            OwnerRegistry::initialize(&addrs(MAX_OWNERS as u64 + 1), 1),
            Err(QuorumError::InvalidOwnerCount { .. })
        ));
        assert!(matches!(
            OwnerRegistry::initialize(&addrs(2), 3),
            Err(QuorumError::InvalidQuorum { required: 3, owners: 2 })
        ));
        assert!(matches!(
            OwnerRegistry::initialize(&addrs(2), 0),
            Err(QuorumError::InvalidQuorum { .. })
        ));

        let dup = vec![Address::from_low_u64(1), Address::from_low_u64(1)];
        assert!(matches!(
            OwnerRegistry::initialize(&dup, 1),
            Err(QuorumError::DuplicateOwner { .. })
        ));
        assert!(matches!(
            OwnerRegistry::initialize(&[Address::ZERO], 1),
            Err(QuorumError::DuplicateOwner { .. })
        ));
    }

    #[test]
    fn test_add_owner_appends() {
        let mut registry = OwnerRegistry::initialize(&addrs(2), 1).unwrap();
        let new_owner = Address::from_low_u64(9);

        assert_eq!(registry.add_owner(new_owner).unwrap(), 3);
        assert!(registry.is_owner(&new_owner));
        assert!(matches!(
            registry.add_owner(new_owner),
            Err(QuorumError::DuplicateOwner { .. })
        ));
        registry.check_invariants().unwrap();
    }

    #[test]
    fn test_add_owner_capacity() {
        let mut registry = OwnerRegistry::initialize(&addrs(MAX_OWNERS as u64), 1).unwrap();
        assert!(matches!(
            registry.add_owner(Address::from_low_u64(10_000)),
            Err(QuorumError::CapacityExceeded { max: MAX_OWNERS })
        ));
    }

    #[test]
    fn test_remove_middle_owner_moves_last_into_hole() {
        let owners = addrs(5);
        let mut registry = OwnerRegistry::initialize(&owners, 2).unwrap();

        registry.remove_owner(&owners[1]).unwrap();

        assert_eq!(registry.num_owners(), 4);
        assert!(!registry.is_owner(&owners[1]));
        // Last owner fills slot 2, the rest stay put
        assert_eq!(registry.slot_of(&owners[4]), Some(2));
        assert_eq!(registry.slot_of(&owners[0]), Some(1));
        assert_eq!(registry.slot_of(&owners[2]), Some(3));
        assert_eq!(registry.slot_of(&owners[3]), Some(4));
        registry.check_invariants().unwrap();
    }

    #[test]
    fn test_remove_last_owner() {
        let owners = addrs(3);
        let mut registry = OwnerRegistry::initialize(&owners, 1).unwrap();

        registry.remove_owner(&owners[2]).unwrap();
        assert_eq!(registry.owners(), owners[..2].to_vec());
        registry.check_invariants().unwrap();
    }

    #[test]
    fn test_remove_first_of_two() {
        let owners = addrs(2);
        let mut registry = OwnerRegistry::initialize(&owners, 1).unwrap();

        registry.remove_owner(&owners[0]).unwrap();
        assert_eq!(registry.owners(), vec![owners[1]]);
        assert_eq!(registry.slot_of(&owners[1]), Some(1));
        registry.check_invariants().unwrap();
    }

    #[test]
    fn test_remove_rejects_unknown_and_quorum_break() {
        let owners = addrs(2);
        let mut registry = OwnerRegistry::initialize(&owners, 2).unwrap();

        assert!(matches!(
            registry.remove_owner(&Address::from_low_u64(77)),
            Err(QuorumError::UnknownOwner { .. })
        ));
        assert!(matches!(
            registry.remove_owner(&owners[0]),
            Err(QuorumError::InvalidQuorum { required: 2, owners: 1 })
        ));
        assert_eq!(registry.owners(), owners);
    }

    #[test]
    fn test_change_owner_keeps_slot() {
        let owners = addrs(3);
        let mut registry = OwnerRegistry::initialize(&owners, 2).unwrap();
        let replacement = Address::from_low_u64(50);

        assert_eq!(registry.change_owner(&owners[1], replacement).unwrap(), 2);
        assert!(!registry.is_owner(&owners[1]));
        assert_eq!(registry.get_owner(1), Some(replacement));
        assert!(matches!(
            registry.change_owner(&owners[0], owners[2]),
            Err(QuorumError::DuplicateOwner { .. })
        ));
        assert!(matches!(
            registry.change_owner(&owners[1], Address::from_low_u64(51)),
            Err(QuorumError::UnknownOwner { .. })
        ));
        registry.check_invariants().unwrap();
    }

    #[test]
    fn test_change_requirement_bounds() {
        let mut registry = OwnerRegistry::initialize(&addrs(3), 2).unwrap();
        registry.change_requirement(3).unwrap();
        assert_eq!(registry.required(), 3);
        assert!(registry.change_requirement(4).is_err());
        assert!(registry.change_requirement(0).is_err());
        assert_eq!(registry.required(), 3);
    }
}
