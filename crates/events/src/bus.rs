//! Subscription registry with synchronous fan-out.
//!
//! The bus is built on top of the event log: publishing appends first, then
//! invokes subscribers on the publisher's stack.
//!
//! ## Delivery
//!
//! - Handlers of one event type run in registration order, each one's full
//!   cascade completing before the next handler starts.
//! - Handlers subscribed to all events run after the type-specific ones.
//! - A failing handler aborts the remaining handlers of that event and the
//!   error goes straight back to the publisher (no isolation, no retry).
//! - Nothing is implied about ordering across different event types.
//!
//! ## Registry
//!
//! Registering the same handler twice makes it run twice. Deduplication is the
//! composition root's job. The handler list is snapshotted at each publish, so
//! subscriptions added during a fan-out only see later events.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::command::Causation;
use crate::envelope::EventEnvelope;
use crate::error::{ChoreographyError, ConfigurationError};
use crate::event::UncommittedEvent;
use crate::handler::EventHandler;
use crate::store::{EventStore, EventStoreError};

#[derive(Default)]
struct Registry {
    by_type: HashMap<String, Vec<Arc<dyn EventHandler>>>,
    all: Vec<Arc<dyn EventHandler>>,
    known: HashSet<String>,
}

pub struct EventBus {
    store: Arc<dyn EventStore>,
    registry: RwLock<Registry>,
}

impl core::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscription_count())
            .finish_non_exhaustive()
    }
}

impl EventBus {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            store,
            registry: RwLock::new(Registry::default()),
        }
    }

    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    /// Declare an event type some context emits (makes it publishable).
    pub fn declare(&self, event_type: &str) -> Result<(), ChoreographyError> {
        let mut reg = self.write()?;
        reg.known.insert(event_type.to_string());
        Ok(())
    }

    /// Add `handler` to the end of `event_type`'s handler list.
    pub fn register(&self, event_type: &str, handler: Arc<dyn EventHandler>) -> Result<(), ChoreographyError> {
        let mut reg = self.write()?;
        tracing::debug!(event_type, handler = handler.name(), "subscribed");
        reg.known.insert(event_type.to_string());
        reg.by_type.entry(event_type.to_string()).or_default().push(handler);
        Ok(())
    }

    /// Subscribe `handler` to every event type.
    pub fn register_all(&self, handler: Arc<dyn EventHandler>) -> Result<(), ChoreographyError> {
        let mut reg = self.write()?;
        tracing::debug!(handler = handler.name(), "subscribed to all events");
        reg.all.push(handler);
        Ok(())
    }

    pub fn is_known(&self, event_type: &str) -> Result<bool, ChoreographyError> {
        Ok(self.read()?.known.contains(event_type))
    }

    /// Total number of subscriptions (type-specific plus subscribe-to-all).
    pub fn subscription_count(&self) -> usize {
        self.registry
            .read()
            .map(|r| r.by_type.values().map(Vec::len).sum::<usize>() + r.all.len())
            .unwrap_or(0)
    }

    /// Snapshot of the handlers an event of `event_type` would be delivered to.
    pub fn handlers_for(&self, event_type: &str) -> Result<Vec<Arc<dyn EventHandler>>, ChoreographyError> {
        let reg = self.read()?;
        let mut handlers = reg.by_type.get(event_type).cloned().unwrap_or_default();
        handlers.extend(reg.all.iter().cloned());
        Ok(handlers)
    }

    /// Append one root event and fan it out.
    pub fn publish(&self, event: UncommittedEvent) -> Result<EventEnvelope, ChoreographyError> {
        let mut committed = self.publish_all(vec![event], None)?;
        committed.pop().ok_or_else(|| {
            EventStoreError::InvalidAppend("log returned no event for a single append".to_string()).into()
        })
    }

    /// Append a batch atomically, then fan out each event in append order.
    ///
    /// Unknown event types are rejected before anything is appended.
    ///
    /// If the fan-out of one event fails, the error is returned at once and
    /// the later events of the batch stay in the log undelivered. They reach
    /// subscribers only through [`EventBus::fan_out`] redelivery.
    pub fn publish_all(
        &self,
        events: Vec<UncommittedEvent>,
        causation: Option<&Causation>,
    ) -> Result<Vec<EventEnvelope>, ChoreographyError> {
        let unknown = {
            let reg = self.read()?;
            events
                .iter()
                .find(|e| !reg.known.contains(&e.event_type))
                .map(|e| e.event_type.clone())
        };
        if let Some(unknown) = unknown {
            return Err(ConfigurationError::UnknownEventType(unknown).into());
        }

        let committed = self.store.append(events, causation)?;
        for envelope in &committed {
            self.fan_out(envelope)?;
        }
        Ok(committed)
    }

    /// Deliver an already-appended event to its subscribers.
    ///
    /// Also the entry point for redelivery of events read back from the log.
    pub fn fan_out(&self, event: &EventEnvelope) -> Result<(), ChoreographyError> {
        let handlers = self.handlers_for(event.event_type())?;
        tracing::debug!(
            event_type = event.event_type(),
            sequence_number = event.sequence_number(),
            correlation_id = %event.metadata().correlation_id(),
            handlers = handlers.len(),
            "publishing"
        );
        for handler in handlers {
            handler.handle(event)?;
        }
        Ok(())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Registry>, ChoreographyError> {
        self.registry
            .read()
            .map_err(|_| ChoreographyError::LockPoisoned("subscription registry"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Registry>, ChoreographyError> {
        self.registry
            .write()
            .map_err(|_| ChoreographyError::LockPoisoned("subscription registry"))
    }
}
