//! The registry object owned by the composition root.
//!
//! Bundles the event log, the bus and the dispatcher. Components that need to
//! publish, subscribe or dispatch receive a reference (or a command sink)
//! explicitly; there is no ambient global.

use std::sync::Arc;

use crate::bus::EventBus;
use crate::cascade::DEFAULT_CASCADE_DEPTH_LIMIT;
use crate::command::{Command, DomainCommand};
use crate::dispatcher::{CommandDispatcher, CommandSink, DispatcherHandle};
use crate::envelope::EventEnvelope;
use crate::error::ChoreographyError;
use crate::event::UncommittedEvent;
use crate::handler::{CommandHandler, EventHandler};
use crate::in_memory_store::InMemoryEventStore;
use crate::store::EventStore;

#[derive(Debug)]
pub struct Cqrs {
    bus: Arc<EventBus>,
    dispatcher: Arc<CommandDispatcher>,
}

impl Cqrs {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self::with_depth_limit(store, DEFAULT_CASCADE_DEPTH_LIMIT)
    }

    pub fn with_depth_limit(store: Arc<dyn EventStore>, depth_limit: usize) -> Self {
        let bus = Arc::new(EventBus::new(store));
        let dispatcher = Arc::new(CommandDispatcher::with_depth_limit(bus.clone(), depth_limit));
        Self { bus, dispatcher }
    }

    /// In-memory log; for tests and demos.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryEventStore::new()))
    }

    pub fn event_store(&self) -> Arc<dyn EventStore> {
        self.bus.store().clone()
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn dispatcher(&self) -> &Arc<CommandDispatcher> {
        &self.dispatcher
    }

    /// Sink to inject into adapters and process managers.
    pub fn command_sink(&self) -> Arc<dyn CommandSink> {
        Arc::new(DispatcherHandle::new(&self.dispatcher))
    }

    pub fn register_command(&self, command_type: &str, handler: Arc<dyn CommandHandler>) -> Result<(), ChoreographyError> {
        self.dispatcher.register(command_type, handler)
    }

    /// Register one handler for several command types (typically a whole
    /// `DomainCommand` enum).
    pub fn register_commands(&self, command_types: &[&str], handler: Arc<dyn CommandHandler>) -> Result<(), ChoreographyError> {
        command_types
            .iter()
            .try_for_each(|t| self.dispatcher.register(t, handler.clone()))
    }

    pub fn declare_events(&self, event_types: &[&str]) -> Result<(), ChoreographyError> {
        event_types.iter().try_for_each(|t| self.bus.declare(t))
    }

    /// Subscribe one handler to several event types.
    pub fn subscribe(&self, handler: Arc<dyn EventHandler>, event_types: &[&str]) -> Result<(), ChoreographyError> {
        event_types
            .iter()
            .try_for_each(|t| self.bus.register(t, handler.clone()))
    }

    pub fn subscribe_to_all_events(&self, handler: Arc<dyn EventHandler>) -> Result<(), ChoreographyError> {
        self.bus.register_all(handler)
    }

    /// Dispatch a command and run its whole cascade.
    pub fn run(&self, command: Command) -> Result<Vec<EventEnvelope>, ChoreographyError> {
        self.dispatcher.dispatch(command)
    }

    pub fn run_typed<C: DomainCommand>(&self, command: &C) -> Result<Vec<EventEnvelope>, ChoreographyError> {
        self.run(Command::from_typed(command)?)
    }

    /// Publish an event produced outside any command handler (e.g. by an
    /// external scheduler).
    pub fn publish(&self, event: UncommittedEvent) -> Result<EventEnvelope, ChoreographyError> {
        self.bus.publish(event)
    }

    /// Nothing registered yet.
    pub fn is_empty(&self) -> bool {
        self.bus.subscription_count() == 0 && self.dispatcher.registered_command_types().is_empty()
    }
}
