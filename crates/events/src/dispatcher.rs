//! Command dispatch (one command → exactly one handler).
//!
//! ```text
//! Command
//!   ↓
//! 1. Enter one cascade level (depth guard)
//!   ↓
//! 2. Route to the single handler registered for the command type
//!   ↓
//! 3. Handler decides events (pure; rejection appends nothing)
//!   ↓
//! 4. Append the batch atomically, stamped with the command's causation
//!   ↓
//! 5. Fan out each committed event (may dispatch further commands, depth-first)
//! ```

use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};

use crate::bus::EventBus;
use crate::cascade::{CascadeGuard, DEFAULT_CASCADE_DEPTH_LIMIT};
use crate::command::Command;
use crate::envelope::EventEnvelope;
use crate::error::{ChoreographyError, ConfigurationError};
use crate::handler::CommandHandler;

/// Anything that accepts commands for dispatch.
///
/// Adapters and process managers receive one of these at construction.
pub trait CommandSink: Send + Sync {
    fn dispatch(&self, command: Command) -> Result<Vec<EventEnvelope>, ChoreographyError>;
}

impl<S> CommandSink for Arc<S>
where
    S: CommandSink + ?Sized,
{
    fn dispatch(&self, command: Command) -> Result<Vec<EventEnvelope>, ChoreographyError> {
        (**self).dispatch(command)
    }
}

pub struct CommandDispatcher {
    bus: Arc<EventBus>,
    handlers: RwLock<HashMap<String, Arc<dyn CommandHandler>>>,
    depth_limit: usize,
}

impl core::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("command_types", &self.registered_command_types())
            .field("depth_limit", &self.depth_limit)
            .finish_non_exhaustive()
    }
}

impl CommandDispatcher {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self::with_depth_limit(bus, DEFAULT_CASCADE_DEPTH_LIMIT)
    }

    pub fn with_depth_limit(bus: Arc<EventBus>, depth_limit: usize) -> Self {
        Self {
            bus,
            handlers: RwLock::new(HashMap::new()),
            depth_limit,
        }
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn depth_limit(&self) -> usize {
        self.depth_limit
    }

    /// Register the handler for `command_type`; a second registration fails.
    pub fn register(&self, command_type: &str, handler: Arc<dyn CommandHandler>) -> Result<(), ChoreographyError> {
        let mut handlers = self
            .handlers
            .write()
            .map_err(|_| ChoreographyError::LockPoisoned("command handlers"))?;
        if handlers.contains_key(command_type) {
            return Err(ConfigurationError::DuplicateCommandHandler(command_type.to_string()).into());
        }
        tracing::debug!(command_type, "command handler registered");
        handlers.insert(command_type.to_string(), handler);
        Ok(())
    }

    pub fn is_registered(&self, command_type: &str) -> bool {
        self.handlers
            .read()
            .map(|h| h.contains_key(command_type))
            .unwrap_or(false)
    }

    /// Registered command types, sorted.
    pub fn registered_command_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .handlers
            .read()
            .map(|h| h.keys().cloned().collect())
            .unwrap_or_default();
        types.sort();
        types
    }

    fn handler_for(&self, command_type: &str) -> Result<Arc<dyn CommandHandler>, ChoreographyError> {
        let handlers = self
            .handlers
            .read()
            .map_err(|_| ChoreographyError::LockPoisoned("command handlers"))?;
        handlers
            .get(command_type)
            .cloned()
            .ok_or_else(|| ConfigurationError::UnregisteredCommand(command_type.to_string()).into())
    }
}

impl CommandSink for CommandDispatcher {
    fn dispatch(&self, command: Command) -> Result<Vec<EventEnvelope>, ChoreographyError> {
        let guard = CascadeGuard::enter(self.depth_limit).inspect_err(|_| {
            tracing::error!(
                command_type = command.command_type(),
                limit = self.depth_limit,
                "cascade depth limit exceeded"
            );
        })?;
        let handler = self.handler_for(command.command_type())?;

        tracing::debug!(
            command_type = command.command_type(),
            depth = guard.depth(),
            caused_by = ?command.causation().map(|c| c.event_id()),
            "dispatching"
        );

        let events = handler.handle(&command).inspect_err(|e| {
            if let ChoreographyError::HandlerFailure { source, .. } = e {
                tracing::warn!(command_type = command.command_type(), %source, "command rejected");
            }
        })?;
        if events.is_empty() {
            return Ok(vec![]);
        }

        self.bus.publish_all(events, command.causation())
    }
}

/// Non-owning dispatcher handle.
///
/// Subscribers live in the bus the dispatcher owns, so a subscriber holding an
/// `Arc<CommandDispatcher>` would form a reference cycle.
#[derive(Debug, Clone)]
pub struct DispatcherHandle(Weak<CommandDispatcher>);

impl DispatcherHandle {
    pub fn new(dispatcher: &Arc<CommandDispatcher>) -> Self {
        Self(Arc::downgrade(dispatcher))
    }
}

impl CommandSink for DispatcherHandle {
    fn dispatch(&self, command: Command) -> Result<Vec<EventEnvelope>, ChoreographyError> {
        let dispatcher = self
            .0
            .upgrade()
            .ok_or(ConfigurationError::DispatcherUnavailable)?;
        dispatcher.dispatch(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::UncommittedEvent;
    use crate::in_memory_store::InMemoryEventStore;
    use crate::store::EventStore;
    use ecommerce_core::DomainError;

    fn dispatcher() -> Arc<CommandDispatcher> {
        let bus = Arc::new(EventBus::new(Arc::new(InMemoryEventStore::new())));
        bus.declare("Pinged").unwrap();
        Arc::new(CommandDispatcher::new(bus))
    }

    fn ping_handler() -> Arc<dyn CommandHandler> {
        Arc::new(|c: &Command| -> Result<Vec<UncommittedEvent>, ChoreographyError> {
            Ok(vec![UncommittedEvent::new("Ping$1", "Pinged", c.params().clone())])
        })
    }

    #[test]
    fn unregistered_command_is_a_configuration_error() {
        let err = dispatcher().dispatch(Command::new("Nope")).unwrap_err();
        assert!(matches!(
            err,
            ChoreographyError::Configuration(ConfigurationError::UnregisteredCommand(ref t)) if t == "Nope"
        ));
    }

    #[test]
    fn exactly_one_handler_per_command_type() {
        let d = dispatcher();
        d.register("Ping", ping_handler()).unwrap();
        let err = d.register("Ping", ping_handler()).unwrap_err();
        assert!(matches!(
            err,
            ChoreographyError::Configuration(ConfigurationError::DuplicateCommandHandler(_))
        ));
    }

    #[test]
    fn dispatch_appends_and_returns_committed_events() {
        let d = dispatcher();
        d.register("Ping", ping_handler()).unwrap();

        let committed = d.dispatch(Command::new("Ping").param("n", 1)).unwrap();

        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].event_type(), "Pinged");
        assert_eq!(d.bus().store().read_all().unwrap(), committed);
    }

    #[test]
    fn rejection_appends_nothing() {
        let d = dispatcher();
        d.register(
            "Ping",
            Arc::new(|c: &Command| -> Result<Vec<UncommittedEvent>, ChoreographyError> {
                Err(ChoreographyError::handler_failure(
                    c.command_type(),
                    DomainError::invariant("not now"),
                ))
            }),
        )
        .unwrap();

        assert!(d.dispatch(Command::new("Ping")).unwrap_err().is_handler_failure());
        assert!(d.bus().store().read_all().unwrap().is_empty());
    }

    #[test]
    fn handle_fails_once_the_dispatcher_is_gone() {
        let d = dispatcher();
        let handle = DispatcherHandle::new(&d);
        drop(d);
        let err = handle.dispatch(Command::new("Ping")).unwrap_err();
        assert!(matches!(
            err,
            ChoreographyError::Configuration(ConfigurationError::DispatcherUnavailable)
        ));
    }
}
