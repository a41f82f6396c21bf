//! Process manager runtime.
//!
//! ```text
//! EventEnvelope
//!   ↓ milestone? (otherwise ignored)
//! 1. Read the correlation id from event data (missing → contract violation)
//!   ↓
//! 2. Under the instance lock: skip if closed or already observed,
//!    record the milestone, compute reactions not yet issued, mark them issued
//!   ↓
//! 3. Release the lock, dispatch each reaction (caused by the event)
//!   ↓
//! 4. On dispatch failure: roll the transition back and propagate
//! ```
//!
//! Replay folds the same transitions over history and treats a reaction whose
//! evidence is missing from the log like a failed dispatch.
//!
//! The lock is released before dispatching because a follow-up command may
//! cascade back into the same instance on the same thread.

use std::collections::BTreeSet;
use std::sync::Arc;

use ecommerce_events::{
    ChoreographyError, CommandSink, EventEnvelope, EventHandler, ProcessManager, ProcessState, Reaction,
};

use crate::state_store::ProcessStateStore;

pub struct ProcessRunner<P: ProcessManager> {
    process: P,
    sink: Arc<dyn CommandSink>,
    states: ProcessStateStore<P::Milestone>,
}

impl<P: ProcessManager> ProcessRunner<P> {
    pub fn new(process: P, sink: Arc<dyn CommandSink>) -> Self {
        Self {
            process,
            sink,
            states: ProcessStateStore::new(),
        }
    }

    pub fn process(&self) -> &P {
        &self.process
    }

    /// Current state of one instance (for inspection).
    pub fn state(&self, correlation_id: &str) -> Option<ProcessState<P::Milestone>> {
        self.states.snapshot(correlation_id)
    }

    pub fn instance_count(&self) -> usize {
        self.states.len()
    }

    /// Rebuild state from history without dispatching anything.
    ///
    /// A reaction the history implies counts as issued only when the history
    /// also holds its evidence (see [`Reaction::evidence`]). Otherwise its
    /// transition is rolled back exactly as a failed live dispatch would be,
    /// so redelivering the triggering event retries it.
    pub fn replay<'a>(&self, history: impl IntoIterator<Item = &'a EventEnvelope>) -> Result<(), ChoreographyError> {
        let history: Vec<&EventEnvelope> = history.into_iter().collect();
        let evidence = Evidence::collect(&history, self.process.correlation_field());

        for event in history {
            let Some(milestone) = self.process.milestone(event.event_type()) else {
                continue;
            };
            let key = self.correlation_id(event)?;
            let instance = self.states.instance(&key)?;
            let mut state = instance
                .lock()
                .map_err(|_| ChoreographyError::LockPoisoned("process state"))?;
            let reactions = self.transition(&mut state, milestone, &key);
            if let Some(i) = reactions.iter().position(|r| !evidence.confirms(r, &key)) {
                tracing::warn!(
                    process = self.process.name(),
                    correlation_id = %key,
                    outcome = reactions[i].outcome,
                    "follow-up command left no trace; pending until redelivery"
                );
                state.roll_back(milestone, &reactions[i..]);
            }
        }
        Ok(())
    }

    fn correlation_id(&self, event: &EventEnvelope) -> Result<String, ChoreographyError> {
        let field = self.process.correlation_field();
        event.require_str(field).map(str::to_string).inspect_err(|e| {
            tracing::error!(
                process = self.process.name(),
                event_type = event.event_type(),
                error = %e,
                "cannot correlate event"
            );
        })
    }

    /// Apply one milestone; returns the reactions to dispatch (possibly none).
    fn transition(
        &self,
        state: &mut ProcessState<P::Milestone>,
        milestone: P::Milestone,
        correlation_id: &str,
    ) -> Vec<Reaction> {
        if state.is_completed() || !state.observe(milestone) {
            return vec![];
        }

        let reactions: Vec<Reaction> = self
            .process
            .react(state, correlation_id)
            .into_iter()
            .filter(|r| !state.was_issued(r.outcome))
            .collect();
        for reaction in &reactions {
            state.mark_issued(reaction);
        }
        if reactions.is_empty() && self.process.is_closed(state) {
            state.close();
        }
        reactions
    }
}

impl<P: ProcessManager> core::fmt::Debug for ProcessRunner<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProcessRunner")
            .field("process", &self.process.name())
            .field("instances", &self.states.len())
            .finish()
    }
}

impl<P: ProcessManager> EventHandler for ProcessRunner<P> {
    fn name(&self) -> &str {
        self.process.name()
    }

    fn handle(&self, event: &EventEnvelope) -> Result<(), ChoreographyError> {
        let Some(milestone) = self.process.milestone(event.event_type()) else {
            return Ok(());
        };
        let key = self.correlation_id(event)?;
        let instance = self.states.instance(&key)?;

        let reactions = {
            let mut state = instance
                .lock()
                .map_err(|_| ChoreographyError::LockPoisoned("process state"))?;
            if state.is_completed() || state.has(milestone) {
                tracing::debug!(
                    process = self.process.name(),
                    correlation_id = %key,
                    ?milestone,
                    "milestone ignored (closed or already observed)"
                );
                return Ok(());
            }
            self.transition(&mut state, milestone, &key)
        };

        for (i, reaction) in reactions.iter().enumerate() {
            tracing::debug!(
                process = self.process.name(),
                correlation_id = %key,
                outcome = reaction.outcome,
                command_type = reaction.command.command_type(),
                "issuing follow-up command"
            );
            if let Err(e) = self.sink.dispatch(reaction.command.clone().caused_by(event)) {
                let mut state = instance
                    .lock()
                    .map_err(|_| ChoreographyError::LockPoisoned("process state"))?;
                state.roll_back(milestone, &reactions[i..]);
                return Err(e);
            }
        }
        Ok(())
    }
}

/// `(event type, correlation id)` pairs present in a history.
struct Evidence(BTreeSet<(String, String)>);

impl Evidence {
    fn collect(history: &[&EventEnvelope], correlation_field: &str) -> Self {
        let seen = history
            .iter()
            .filter_map(|e| {
                let key = e.field(correlation_field)?.as_str()?;
                Some((e.event_type().to_string(), key.to_string()))
            })
            .collect();
        Self(seen)
    }

    fn confirms(&self, reaction: &Reaction, correlation_id: &str) -> bool {
        reaction.evidence.is_empty()
            || reaction
                .evidence
                .iter()
                .any(|t| self.0.contains(&(t.to_string(), correlation_id.to_string())))
    }
}
