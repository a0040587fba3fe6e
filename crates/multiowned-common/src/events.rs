//! Event journal
//!
//! Every state-changing outcome of the engine is recorded as a typed event:
//! - Confirmations, revocations and final confirmations
//! - Owner set and requirement changes
//! - Sweeps of the pending-operation index
//!
//! The host drains the journal after each call, for example to publish the
//! events or to assert on them in tests. A journal holds at most
//! `max_events` entries; once full, the oldest entry is dropped for each new
//! one, so an undrained journal never outgrows its bound.

use crate::types::{address::Address, operation::OperationId};
use crate::DEFAULT_MAX_EVENTS;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, trace};

/// Why the pending-operation index was swept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClearReason {
    /// Owner set or requirement changed
    AdminChange,
    /// Index reached its capacity bound
    Capacity,
}

impl fmt::Display for ClearReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClearReason::AdminChange => write!(f, "admin-change"),
            ClearReason::Capacity => write!(f, "capacity"),
        }
    }
}

/// Engine events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuorumEvent {
    /// Non-final confirmation recorded
    Confirmation {
        owner: Address,
        operation: OperationId,
    },
    Revoke {
        owner: Address,
        operation: OperationId,
    },
    /// Decisive confirmation; the protected action runs
    FinalConfirmation {
        owner: Address,
        operation: OperationId,
    },
    OwnerChanged {
        old_owner: Address,
        new_owner: Address,
    },
    OwnerAdded {
        owner: Address,
    },
    OwnerRemoved {
        owner: Address,
    },
    RequirementChanged {
        required: usize,
    },
    PendingCleared {
        reason: ClearReason,
        count: usize,
    },
}

/// Event with its recording time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvent<E> {
    /// Timestamp (Unix millis)
    pub timestamp: i64,
    pub event: E,
}

/// Bounded event buffer owned by the emitting component
#[derive(Debug, Clone)]
pub struct EventJournal<E = QuorumEvent> {
    events: VecDeque<RecordedEvent<E>>,
    max_events: usize,
    dropped: u64,
}

impl<E> Default for EventJournal<E> {
    fn default() -> Self {
        Self::with_max_events(DEFAULT_MAX_EVENTS)
    }
}

impl<E> EventJournal<E> {
    /// Journal keeping at most `max_events` entries (at least one)
    pub fn with_max_events(max_events: usize) -> Self {
        Self {
            events: VecDeque::new(),
            max_events: max_events.max(1),
            dropped: 0,
        }
    }
}

impl<E: fmt::Debug> EventJournal<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event stamped with the current time, evicting the oldest
    /// entry when the journal is full
    pub fn record(&mut self, event: E) {
        trace!(?event, "Event recorded");
        if self.events.len() >= self.max_events {
            if let Some(evicted) = self.events.pop_front() {
                self.dropped += 1;
                debug!(
                    evicted = ?evicted.event,
                    dropped = self.dropped,
                    max_events = self.max_events,
                    "Event journal full, oldest entry dropped"
                );
            }
        }
        self.events.push_back(RecordedEvent {
            timestamp: chrono::Utc::now().timestamp_millis(),
            event,
        });
    }

    /// Remove and return every buffered event, oldest first
    pub fn drain(&mut self) -> Vec<RecordedEvent<E>> {
        self.events.drain(..).collect()
    }

    pub fn events(&self) -> impl Iterator<Item = &E> {
        self.events.iter().map(|recorded| &recorded.event)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn max_events(&self) -> usize {
        self.max_events
    }

    /// Events evicted since creation because the journal was full
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_drain() {
        let mut journal = EventJournal::new();
        journal.record(QuorumEvent::OwnerAdded {
            owner: Address::from_low_u64(1),
        });
        journal.record(QuorumEvent::RequirementChanged { required: 2 });
        assert_eq!(journal.len(), 2);

        let drained = journal.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(
            drained[1].event,
            QuorumEvent::RequirementChanged { required: 2 }
        );
        assert!(journal.is_empty());
    }

    #[test]
    fn test_full_journal_drops_oldest() {
        let mut journal = EventJournal::with_max_events(3);
        for required in 1..=10 {
            journal.record(QuorumEvent::RequirementChanged { required });
        }

        assert_eq!(journal.len(), 3);
        assert_eq!(journal.dropped(), 7);
        let kept: Vec<_> = journal.events().cloned().collect();
        assert_eq!(
            kept,
            (8..=10)
                .map(|required| QuorumEvent::RequirementChanged { required })
                .collect::<Vec<_>>()
        );

        journal.drain();
        journal.record(QuorumEvent::RequirementChanged { required: 11 });
        assert_eq!(journal.len(), 1);
        assert_eq!(journal.dropped(), 7);
    }

    #[test]
    fn test_zero_bound_keeps_latest() {
        let mut journal: EventJournal = EventJournal::with_max_events(0);
        assert_eq!(journal.max_events(), 1);
        journal.record(QuorumEvent::RequirementChanged { required: 1 });
        journal.record(QuorumEvent::RequirementChanged { required: 2 });
        assert_eq!(journal.len(), 1);
    }

    #[test]
    fn test_clear_reason_display() {
        assert_eq!(ClearReason::AdminChange.to_string(), "admin-change");
        assert_eq!(ClearReason::Capacity.to_string(), "capacity");
    }

    #[test]
    fn test_event_json() {
        let event = QuorumEvent::PendingCleared {
            reason: ClearReason::Capacity,
            count: 512,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("Capacity"));
        let back: QuorumEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
