//! Confirmation bitmap
//!
//! One bit per owner slot. Slot 0 is the reserved sentinel and is never set,
//! so the usable range is `1..=MAX_OWNERS`.

use crate::MAX_OWNERS;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Total number of bits in the bitmap
pub const BITMAP_BITS: usize = 256;

const WORDS: usize = BITMAP_BITS / 64;

// Every assignable slot needs a bit.
const _: () = assert!(MAX_OWNERS < BITMAP_BITS);

/// Set of owner slots that have confirmed an operation
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ConfirmationBitmap([u64; WORDS]);

impl ConfirmationBitmap {
    pub const EMPTY: ConfirmationBitmap = ConfirmationBitmap([0; WORDS]);

    /// Word index and mask for a slot, `None` outside `1..=MAX_OWNERS`
    #[inline]
    fn locate(slot: usize) -> Option<(usize, u64)> {
        if slot == 0 || slot > MAX_OWNERS {
            return None;
        }
        Some((slot / 64, 1u64 << (slot % 64)))
    }

    /// Whether the slot's bit is set
    pub fn contains(&self, slot: usize) -> bool {
        Self::locate(slot)
            .map(|(word, mask)| self.0[word] & mask != 0)
            .unwrap_or(false)
    }

    /// Set the slot's bit; returns true if it was previously clear
    pub fn insert(&mut self, slot: usize) -> bool {
        match Self::locate(slot) {
            Some((word, mask)) if self.0[word] & mask == 0 => {
                self.0[word] |= mask;
                true
            }
            _ => false,
        }
    }

    /// Clear the slot's bit; returns true if it was previously set
    pub fn remove(&mut self, slot: usize) -> bool {
        match Self::locate(slot) {
            Some((word, mask)) if self.0[word] & mask != 0 => {
                self.0[word] &= !mask;
                true
            }
            _ => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|w| *w == 0)
    }

    /// Number of confirmed slots
    pub fn len(&self) -> usize {
        self.0.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Confirmed slots in ascending order
    pub fn slots(&self) -> impl Iterator<Item = usize> + '_ {
        (1..=MAX_OWNERS).filter(move |slot| self.contains(*slot))
    }
}

impl fmt::Debug for ConfirmationBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.slots()).finish()
    }
}
