//! Event-driven choreography mechanics (no business rules).
//!
//! - `EventEnvelope` / `Command`: the messages exchanged between contexts
//! - `EventStore`: the append-only log the bus is built on
//! - `EventBus`: subscription registry with synchronous, ordered fan-out
//! - `CommandDispatcher`: routes one command to exactly one handler
//! - `ProcessManager`: the saga contract (runners live with the sagas)
//! - `Cqrs`: the registry object the composition root owns and hands out

pub mod bus;
pub mod cascade;
pub mod command;
pub mod context;
pub mod cqrs;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod event;
pub mod handler;
pub mod in_memory_store;
pub mod saga;
pub mod store;

pub use bus::EventBus;
pub use cascade::{CascadeGuard, DEFAULT_CASCADE_DEPTH_LIMIT};
pub use command::{Causation, Command, DomainCommand};
pub use context::BoundedContext;
pub use cqrs::Cqrs;
pub use dispatcher::{CommandDispatcher, CommandSink, DispatcherHandle};
pub use envelope::{EventEnvelope, JsonMap, Metadata};
pub use error::{ChoreographyError, ConfigurationError};
pub use event::{DomainEvent, UncommittedEvent};
pub use handler::{AggregateHandler, CommandHandler, EventHandler, stream_name};
pub use in_memory_store::InMemoryEventStore;
pub use saga::{ProcessManager, ProcessState, Reaction};
pub use store::{EventStore, EventStoreError};
