//! Action sink and the suspend/resume deduplication latch board.

use std::fmt;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use bora_core::actions::{ActionFamily, ActionKind, LatchDirection, Subject};
use bora_core::dimensions::DimensionKey;
use bora_core::events::EventRef;
use bora_core::types::Nanos;

/// What caused an action: an event moving through the pipeline, or an
/// external timekeeping tick.
#[derive(Debug, Clone, Copy)]
pub enum ActionTrigger<'a> {
    /// An ingested event.
    Event(EventRef<'a>),
    /// A [`crate::RiskEngine::tick`] call at the given time.
    Tick(Nanos),
}

impl ActionTrigger<'_> {
    /// Returns the trigger's timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> Nanos {
        match self {
            Self::Event(event) => event.timestamp(),
            Self::Tick(now) => *now,
        }
    }

    /// Returns the originating event, if the trigger was one.
    #[must_use]
    pub const fn event(&self) -> Option<EventRef<'_>> {
        match self {
            Self::Event(event) => Some(*event),
            Self::Tick(_) => None,
        }
    }
}

/// One action delivery handed to the sink callback.
///
/// The callback is invoked synchronously on the ingest thread; callees that
/// need to do real work should enqueue and return. The callback must not
/// re-enter the engine with a new event.
#[derive(Debug)]
pub struct ActionRecord<'a> {
    /// The directive.
    pub action: ActionKind,
    /// The rule that proposed it.
    pub rule_id: &'a str,
    /// What triggered it.
    pub trigger: ActionTrigger<'a>,
    /// The (masked) dimension key the rule fired on.
    pub key: &'a DimensionKey,
    /// Human-readable firing reason.
    pub reason: &'a str,
}

impl fmt::Display for ActionRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.action, self.rule_id, self.reason)
    }
}

/// Latch state per (subject, action family).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatchState {
    /// Normal operation; a suspend proposal transitions and forwards.
    Allowed,
    /// Suspended; only a resume proposal transitions and forwards.
    Suspended,
}

impl LatchState {
    /// Returns true if the subject is currently suspended.
    #[must_use]
    pub const fn is_suspended(&self) -> bool {
        matches!(self, Self::Suspended)
    }
}

/// Per-(subject, family) two-state latch board.
///
/// The board guarantees at-most-once delivery per state transition: while a
/// subject is SUSPENDED, further suspend proposals for the same family are
/// dropped, and symmetrically for resume. Non-paired action kinds bypass
/// the board entirely.
#[derive(Debug, Default)]
pub struct LatchBoard {
    latches: DashMap<(Subject, ActionFamily), LatchState>,
}

impl LatchBoard {
    /// Creates an empty board (every subject implicitly ALLOWED).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decides whether `action` fired on `key` should be forwarded,
    /// transitioning the subject's latch when it is.
    ///
    /// Returns `true` for every non-paired action, for a suspend proposal
    /// finding the latch ALLOWED, and for a resume proposal finding it
    /// SUSPENDED; `false` otherwise (the proposal is redundant).
    pub fn admit(&self, action: ActionKind, key: &DimensionKey) -> bool {
        let Some((family, direction)) = action.latch_edge() else {
            return true;
        };
        let Some(subject) = action.subject(key) else {
            // The key cannot name a subject for this family; treat the
            // action as unlatched rather than silently dropping it.
            return true;
        };

        let mut entry = self
            .latches
            .entry((subject, family))
            .or_insert(LatchState::Allowed);
        match (direction, *entry.value()) {
            (LatchDirection::Suspend, LatchState::Allowed) => {
                *entry.value_mut() = LatchState::Suspended;
                info!(subject = %entry.key().0, family = %family, "latch suspended");
                true
            }
            (LatchDirection::Resume, LatchState::Suspended) => {
                *entry.value_mut() = LatchState::Allowed;
                info!(subject = %entry.key().0, family = %family, "latch resumed");
                true
            }
            _ => false,
        }
    }

    /// Returns the latch state for (subject, family); absent means ALLOWED.
    #[must_use]
    pub fn state(&self, subject: &Subject, family: ActionFamily) -> LatchState {
        self.latches
            .get(&(subject.clone(), family))
            .map_or(LatchState::Allowed, |entry| *entry.value())
    }

    /// Returns the number of tracked latches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.latches.len()
    }

    /// Returns true if no latch has been touched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.latches.is_empty()
    }

    /// Visits every (subject, family, state) triple.
    pub fn for_each<F: FnMut(&Subject, ActionFamily, LatchState)>(&self, mut visit: F) {
        for entry in self.latches.iter() {
            let (subject, family) = entry.key();
            visit(subject, *family, *entry.value());
        }
    }

    /// Sets one latch explicitly (snapshot restore path).
    pub fn set(&self, subject: Subject, family: ActionFamily, state: LatchState) {
        self.latches.insert((subject, family), state);
    }

    /// Drops every latch back to the implicit ALLOWED state.
    pub fn clear(&self) {
        self.latches.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bora_core::types::AccountId;

    fn account_key(name: &str) -> DimensionKey {
        DimensionKey {
            account: Some(AccountId::new_unchecked(name)),
            ..DimensionKey::empty()
        }
    }

    #[test]
    fn test_suspend_admitted_once() {
        let board = LatchBoard::new();
        let key = account_key("A");

        assert!(board.admit(ActionKind::SuspendOrdering, &key));
        assert!(!board.admit(ActionKind::SuspendOrdering, &key));
        assert!(!board.admit(ActionKind::SuspendOrdering, &key));
    }

    #[test]
    fn test_resume_requires_suspended() {
        let board = LatchBoard::new();
        let key = account_key("A");

        // Resume on an untouched latch is redundant.
        assert!(!board.admit(ActionKind::ResumeOrdering, &key));

        assert!(board.admit(ActionKind::SuspendOrdering, &key));
        assert!(board.admit(ActionKind::ResumeOrdering, &key));
        assert!(!board.admit(ActionKind::ResumeOrdering, &key));

        // A full cycle later, suspend admits again.
        assert!(board.admit(ActionKind::SuspendOrdering, &key));
    }

    #[test]
    fn test_families_independent() {
        let board = LatchBoard::new();
        let key = account_key("A");

        assert!(board.admit(ActionKind::SuspendOrdering, &key));
        // Same subject, different family: its own latch.
        assert!(board.admit(ActionKind::SuspendAccountTrading, &key));
    }

    #[test]
    fn test_subjects_independent() {
        let board = LatchBoard::new();
        assert!(board.admit(ActionKind::SuspendOrdering, &account_key("A")));
        assert!(board.admit(ActionKind::SuspendOrdering, &account_key("B")));
    }

    #[test]
    fn test_unpaired_actions_always_admitted() {
        let board = LatchBoard::new();
        let key = account_key("A");
        for _ in 0..3 {
            assert!(board.admit(ActionKind::Alert, &key));
            assert!(board.admit(ActionKind::BlockOrder, &key));
        }
        assert!(board.is_empty());
    }

    #[test]
    fn test_keyless_paired_action_forwarded_unlatched() {
        let board = LatchBoard::new();
        let key = DimensionKey::empty();
        assert!(board.admit(ActionKind::SuspendOrdering, &key));
        assert!(board.admit(ActionKind::SuspendOrdering, &key));
        assert!(board.is_empty());
    }

    #[test]
    fn test_state_and_roundtrip() {
        let board = LatchBoard::new();
        let key = account_key("A");
        board.admit(ActionKind::SuspendOrdering, &key);

        let subject = Subject::Account(AccountId::new_unchecked("A"));
        assert_eq!(
            board.state(&subject, ActionFamily::Ordering),
            LatchState::Suspended
        );

        let copy = LatchBoard::new();
        board.for_each(|subject, family, state| copy.set(subject.clone(), family, state));
        assert_eq!(
            copy.state(&subject, ActionFamily::Ordering),
            LatchState::Suspended
        );
    }
}
