//! Test doubles shared by the adapter and process manager tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use serde_json::Value as JsonValue;

use ecommerce_core::{DomainError, EventId};
use ecommerce_events::{ChoreographyError, Command, CommandSink, EventEnvelope, Metadata};

/// A root event as the log would deliver it.
pub(crate) fn event(event_type: &str, data: JsonValue) -> EventEnvelope {
    let id = EventId::new();
    EventEnvelope::new(
        id,
        1,
        "Test$1",
        event_type,
        data.as_object().cloned().unwrap_or_default(),
        Metadata::new(id, None, Utc::now()),
    )
}

/// Records every dispatched command; optionally rejects the first few.
#[derive(Default)]
pub(crate) struct RecordingSink {
    commands: Mutex<Vec<Command>>,
    failures_left: AtomicUsize,
}

impl RecordingSink {
    pub(crate) fn failing_first(n: usize) -> Self {
        Self {
            commands: Mutex::default(),
            failures_left: AtomicUsize::new(n),
        }
    }

    pub(crate) fn commands(&self) -> Vec<Command> {
        self.commands.lock().unwrap().clone()
    }

    pub(crate) fn command_types(&self) -> Vec<String> {
        self.commands()
            .iter()
            .map(|c| c.command_type().to_string())
            .collect()
    }
}

impl CommandSink for RecordingSink {
    fn dispatch(&self, command: Command) -> Result<Vec<EventEnvelope>, ChoreographyError> {
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ChoreographyError::handler_failure(
                command.command_type(),
                DomainError::invariant("rejected by test sink"),
            ));
        }
        self.commands.lock().unwrap().push(command);
        Ok(vec![])
    }
}
