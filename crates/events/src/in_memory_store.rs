use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;

use ecommerce_core::{EventId, ExpectedVersion};

use crate::command::Causation;
use crate::envelope::{EventEnvelope, Metadata};
use crate::event::UncommittedEvent;
use crate::store::{EventStore, EventStoreError};

#[derive(Debug, Default)]
struct Log {
    events: Vec<EventEnvelope>,
    /// stream name -> positions in `events`
    streams: HashMap<String, Vec<usize>>,
}

impl Log {
    fn stream_version(&self, stream: &str) -> u64 {
        self.streams.get(stream).map(|s| s.len() as u64).unwrap_or(0)
    }

    fn filtered(&self, pred: impl Fn(&EventEnvelope) -> bool) -> Vec<EventEnvelope> {
        self.events.iter().filter(|e| pred(e)).cloned().collect()
    }
}

/// In-memory append-only event log.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    log: RwLock<Log>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.log.read().map(|l| l.events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventStore for InMemoryEventStore {
    fn append(
        &self,
        events: Vec<UncommittedEvent>,
        causation: Option<&Causation>,
    ) -> Result<Vec<EventEnvelope>, EventStoreError> {
        if events.is_empty() {
            return Ok(vec![]);
        }

        let mut log = self.log.write().map_err(|_| EventStoreError::Poisoned)?;

        // Validate the whole batch before touching the log (atomic append).
        for e in &events {
            if e.stream.is_empty() {
                return Err(EventStoreError::InvalidAppend(format!(
                    "{} has an empty stream name",
                    e.event_type
                )));
            }
            let actual = log.stream_version(&e.stream);
            if !e.expected_version.matches(actual) {
                let expected = match e.expected_version {
                    ExpectedVersion::Exact(v) => v,
                    ExpectedVersion::Any => actual,
                };
                return Err(EventStoreError::Concurrency {
                    stream: e.stream.clone(),
                    expected,
                    actual,
                });
            }
        }

        let mut committed = Vec::with_capacity(events.len());
        for e in events {
            let event_id = EventId::new();
            let metadata = match causation {
                Some(c) => Metadata::new(c.correlation_id(), Some(c.event_id()), Utc::now()),
                None => Metadata::new(event_id, None, Utc::now()),
            };
            let position = log.events.len();
            let envelope = EventEnvelope::new(
                event_id,
                position as u64 + 1,
                e.stream.clone(),
                e.event_type,
                e.data,
                metadata,
            );
            log.streams.entry(e.stream).or_default().push(position);
            log.events.push(envelope.clone());
            committed.push(envelope);
        }

        Ok(committed)
    }

    fn read_all(&self) -> Result<Vec<EventEnvelope>, EventStoreError> {
        let log = self.log.read().map_err(|_| EventStoreError::Poisoned)?;
        Ok(log.events.clone())
    }

    fn read_stream(&self, stream: &str) -> Result<Vec<EventEnvelope>, EventStoreError> {
        let log = self.log.read().map_err(|_| EventStoreError::Poisoned)?;
        Ok(log
            .streams
            .get(stream)
            .map(|positions| positions.iter().map(|&i| log.events[i].clone()).collect())
            .unwrap_or_default())
    }

    fn read_by_correlation(&self, correlation_id: EventId) -> Result<Vec<EventEnvelope>, EventStoreError> {
        let log = self.log.read().map_err(|_| EventStoreError::Poisoned)?;
        Ok(log.filtered(|e| e.metadata().correlation_id() == correlation_id))
    }

    fn read_by_causation(&self, causation_id: EventId) -> Result<Vec<EventEnvelope>, EventStoreError> {
        let log = self.log.read().map_err(|_| EventStoreError::Poisoned)?;
        Ok(log.filtered(|e| e.metadata().causation_id() == Some(causation_id)))
    }

    fn read_by_type(&self, event_type: &str) -> Result<Vec<EventEnvelope>, EventStoreError> {
        let log = self.log.read().map_err(|_| EventStoreError::Poisoned)?;
        Ok(log.filtered(|e| e.event_type() == event_type))
    }
}
