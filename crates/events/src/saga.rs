//! Saga / Process Manager contract (mechanics only, no business rules).
//!
//! - A process instance is identified by a correlation id read from event data
//!   (e.g. an order id)
//! - State is a monotonically growing set of observed milestones plus the set
//!   of outcomes already issued
//! - Reactions are computed from that state alone, never from arrival order,
//!   so replaying or redelivering events cannot produce a second command
//! - Runners (see the processes crate) serialize updates per correlation id
//!   and dispatch the resulting commands

use std::collections::BTreeSet;

use serde::Serialize;

use crate::command::Command;

/// A follow-up command tied to a named milestone combination.
#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    /// Stable name of the milestone combination; issued at most once.
    pub outcome: &'static str,
    pub command: Command,
    /// Whether issuing this reaction closes the process instance.
    pub completes: bool,
    /// Event types that prove the command took effect for this instance.
    ///
    /// Replay only counts the outcome as issued when the history holds one of
    /// them. An empty list means the outcome leaves no trace and is assumed
    /// issued.
    pub evidence: &'static [&'static str],
}

impl Reaction {
    pub fn new(outcome: &'static str, command: Command) -> Self {
        Self {
            outcome,
            command,
            completes: false,
            evidence: &[],
        }
    }

    pub fn completing(mut self) -> Self {
        self.completes = true;
        self
    }

    pub fn confirmed_by(mut self, event_types: &'static [&'static str]) -> Self {
        self.evidence = event_types;
        self
    }
}

/// Per-correlation-id state of one process instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessState<M: Ord> {
    milestones: BTreeSet<M>,
    issued: BTreeSet<&'static str>,
    completed: bool,
}

impl<M: Ord> Default for ProcessState<M> {
    fn default() -> Self {
        Self {
            milestones: BTreeSet::new(),
            issued: BTreeSet::new(),
            completed: false,
        }
    }
}

impl<M: Ord + Copy> ProcessState<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a milestone; `false` if it had already been observed.
    pub fn observe(&mut self, milestone: M) -> bool {
        self.milestones.insert(milestone)
    }

    /// Undo an observation (used when the resulting dispatch failed).
    pub fn forget(&mut self, milestone: M) {
        self.milestones.remove(&milestone);
    }

    /// Undo a transition whose reactions from `undone` on never took effect.
    pub fn roll_back(&mut self, milestone: M, undone: &[Reaction]) {
        self.forget(milestone);
        for reaction in undone {
            self.unmark_issued(reaction);
        }
    }

    pub fn has(&self, milestone: M) -> bool {
        self.milestones.contains(&milestone)
    }

    pub fn has_all(&self, milestones: &[M]) -> bool {
        milestones.iter().all(|m| self.milestones.contains(m))
    }

    pub fn milestones(&self) -> impl Iterator<Item = M> + '_ {
        self.milestones.iter().copied()
    }

    pub fn was_issued(&self, outcome: &str) -> bool {
        self.issued.contains(outcome)
    }

    pub fn issued(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.issued.iter().copied()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn mark_issued(&mut self, reaction: &Reaction) {
        self.issued.insert(reaction.outcome);
        if reaction.completes {
            self.completed = true;
        }
    }

    pub fn unmark_issued(&mut self, reaction: &Reaction) {
        self.issued.remove(reaction.outcome);
        if reaction.completes {
            self.completed = false;
        }
    }

    pub fn close(&mut self) {
        self.completed = true;
    }
}

/// Process manager contract.
///
/// Implementors define:
/// - which event types are milestones (and which milestone each one is)
/// - where the correlation id lives in event data
/// - which commands the current state calls for
pub trait ProcessManager: Send + Sync + 'static {
    type Milestone: Copy + Ord + core::fmt::Debug + Send + Sync + 'static;

    /// Stable process name (used in logs).
    fn name(&self) -> &'static str;

    /// Event types this process subscribes to.
    fn event_types(&self) -> &'static [&'static str];

    fn milestone(&self, event_type: &str) -> Option<Self::Milestone>;

    /// Event data field holding the correlation id.
    fn correlation_field(&self) -> &'static str {
        "order_id"
    }

    /// Every reaction the state currently calls for.
    ///
    /// Must be a pure function of `state`. Reactions whose outcome was already
    /// issued are filtered out by the runner, so implementations may simply
    /// return everything whose condition holds.
    fn react(&self, state: &ProcessState<Self::Milestone>, correlation_id: &str) -> Vec<Reaction>;

    /// Whether the state closes the process without issuing anything further.
    fn is_closed(&self, _state: &ProcessState<Self::Milestone>) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
    enum Step {
        A,
        B,
    }

    #[test]
    fn milestones_grow_monotonically() {
        let mut state = ProcessState::new();
        assert!(state.observe(Step::A));
        assert!(!state.observe(Step::A));
        assert!(state.has(Step::A));
        assert!(!state.has_all(&[Step::A, Step::B]));
        state.observe(Step::B);
        assert!(state.has_all(&[Step::A, Step::B]));
    }

    #[test]
    fn completing_reaction_closes_the_instance_and_can_be_rolled_back() {
        let mut state: ProcessState<Step> = ProcessState::new();
        let reaction = Reaction::new("done", Command::new("Finish")).completing();

        state.mark_issued(&reaction);
        assert!(state.was_issued("done"));
        assert!(state.is_completed());

        state.unmark_issued(&reaction);
        assert!(!state.was_issued("done"));
        assert!(!state.is_completed());
    }

    #[test]
    fn roll_back_forgets_the_milestone_and_every_undone_outcome() {
        let mut state = ProcessState::new();
        let first = Reaction::new("first", Command::new("First"));
        let second = Reaction::new("second", Command::new("Second")).completing();
        state.observe(Step::A);
        state.observe(Step::B);
        state.mark_issued(&first);
        state.mark_issued(&second);

        state.roll_back(Step::B, std::slice::from_ref(&second));

        assert!(state.has(Step::A));
        assert!(!state.has(Step::B));
        assert!(state.was_issued("first"));
        assert!(!state.was_issued("second"));
        assert!(!state.is_completed());
    }
}
