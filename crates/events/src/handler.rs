use std::marker::PhantomData;
use std::sync::Arc;

use ecommerce_core::{Aggregate, ExpectedVersion};

use crate::command::{Command, DomainCommand};
use crate::envelope::EventEnvelope;
use crate::error::ChoreographyError;
use crate::event::{DomainEvent, UncommittedEvent};
use crate::store::EventStore;

/// Reacts to published events.
///
/// One interface for every subscriber kind: adapter handlers, process
/// manager runners, local context handlers and infrastructure subscribers
/// (log linking). Closures `Fn(&EventEnvelope) -> Result<(), ChoreographyError>`
/// implement it too.
pub trait EventHandler: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn handle(&self, event: &EventEnvelope) -> Result<(), ChoreographyError>;
}

impl<F> EventHandler for F
where
    F: Fn(&EventEnvelope) -> Result<(), ChoreographyError> + Send + Sync,
{
    fn handle(&self, event: &EventEnvelope) -> Result<(), ChoreographyError> {
        self(event)
    }
}

/// Decides the events produced by one command (command handler abstraction).
///
/// Handlers are synchronous and side-effect free except through the events
/// they return: the dispatcher appends the returned batch atomically and then
/// publishes it. Returning an error appends nothing.
pub trait CommandHandler: Send + Sync {
    fn handle(&self, command: &Command) -> Result<Vec<UncommittedEvent>, ChoreographyError>;
}

impl<F> CommandHandler for F
where
    F: Fn(&Command) -> Result<Vec<UncommittedEvent>, ChoreographyError> + Send + Sync,
{
    fn handle(&self, command: &Command) -> Result<Vec<UncommittedEvent>, ChoreographyError> {
        self(command)
    }
}

/// Stream name of one aggregate instance, e.g. `Ordering::Order$O1`.
pub fn stream_name(category: &str, id: &str) -> String {
    format!("{category}${id}")
}

/// Command handler for an event-sourced aggregate.
///
/// Pipeline per command:
///
/// ```text
/// Command
///   ↓ decode into the context's typed command
/// 1. Load the aggregate stream from the log
///   ↓
/// 2. Rehydrate (apply historical events in order)
///   ↓
/// 3. Decide (pure, produces events)
///   ↓
/// 4. Return the events, pinned to the loaded stream version
/// ```
///
/// The version pin makes a concurrent writer to the same stream fail the
/// append instead of silently interleaving.
pub struct AggregateHandler<A, F> {
    store: Arc<dyn EventStore>,
    category: &'static str,
    factory: F,
    _aggregate: PhantomData<fn() -> A>,
}

impl<A, F> AggregateHandler<A, F>
where
    A: Aggregate,
    A::Event: DomainEvent,
    F: Fn(&str) -> A + Send + Sync,
{
    pub fn new(store: Arc<dyn EventStore>, category: &'static str, factory: F) -> Self {
        Self {
            store,
            category,
            factory,
            _aggregate: PhantomData,
        }
    }

    pub fn category(&self) -> &'static str {
        self.category
    }

    /// Rebuild the current state of one aggregate instance from the log.
    pub fn load(&self, id: &str) -> Result<(A, u64), ChoreographyError> {
        let history = self.store.read_stream(&stream_name(self.category, id))?;
        let mut aggregate = (self.factory)(id);
        for envelope in &history {
            aggregate.apply(&envelope.decode::<A::Event>()?);
        }
        Ok((aggregate, history.len() as u64))
    }

    /// Load instance `id`, let it decide on `command` and pin the decided
    /// events to the loaded version.
    ///
    /// Used directly by contexts whose aggregates take internal commands
    /// (e.g. enriched with data read from another stream).
    pub fn execute(
        &self,
        id: &str,
        command_type: &str,
        command: &A::Command,
    ) -> Result<Vec<UncommittedEvent>, ChoreographyError> {
        let (aggregate, version) = self.load(id)?;

        let decided = aggregate
            .handle(command)
            .map_err(|e| ChoreographyError::handler_failure(command_type, e))?;

        let stream = stream_name(self.category, id);
        decided
            .iter()
            .map(|ev| UncommittedEvent::from_typed(stream.clone(), ev, ExpectedVersion::Exact(version)))
            .collect()
    }
}

impl<A, F> CommandHandler for AggregateHandler<A, F>
where
    A: Aggregate,
    A::Command: DomainCommand,
    A::Event: DomainEvent,
    F: Fn(&str) -> A + Send + Sync,
{
    fn handle(&self, command: &Command) -> Result<Vec<UncommittedEvent>, ChoreographyError> {
        let typed: A::Command = command.decode()?;
        self.execute(typed.target_id(), command.command_type(), &typed)
    }
}
