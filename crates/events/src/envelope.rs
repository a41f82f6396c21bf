use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use ecommerce_core::EventId;

use crate::command::Causation;
use crate::error::ChoreographyError;
use crate::event::{DomainEvent, join_tagged};

/// Field → value mapping carried by events (`data`) and commands (`params`).
pub type JsonMap = serde_json::Map<String, JsonValue>;

/// Traceability metadata stamped on every event at append time.
///
/// A root event (one not caused by another event) correlates to itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    correlation_id: EventId,
    causation_id: Option<EventId>,
    timestamp: DateTime<Utc>,
}

impl Metadata {
    pub fn new(
        correlation_id: EventId,
        causation_id: Option<EventId>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            correlation_id,
            causation_id,
            timestamp,
        }
    }

    pub fn correlation_id(&self) -> EventId {
        self.correlation_id
    }

    pub fn causation_id(&self) -> Option<EventId> {
        self.causation_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// A committed event, as read from the log and delivered to subscribers.
///
/// Notes:
/// - **Immutable**: envelopes are created once by the log and never mutated.
/// - `sequence_number` is the global append position (starts at 1).
/// - `stream` names the aggregate instance that emitted the event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    event_id: EventId,
    sequence_number: u64,
    stream: String,
    event_type: String,
    data: JsonMap,
    metadata: Metadata,
}

impl EventEnvelope {
    pub fn new(
        event_id: EventId,
        sequence_number: u64,
        stream: impl Into<String>,
        event_type: impl Into<String>,
        data: JsonMap,
        metadata: Metadata,
    ) -> Self {
        Self {
            event_id,
            sequence_number,
            stream: stream.into(),
            event_type: event_type.into(),
            data,
            metadata,
        }
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn stream(&self) -> &str {
        &self.stream
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn data(&self) -> &JsonMap {
        &self.data
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Causal link for commands derived from this event.
    pub fn causation(&self) -> Causation {
        Causation::new(self.event_id, self.metadata.correlation_id)
    }

    pub fn field(&self, name: &str) -> Option<&JsonValue> {
        self.data.get(name)
    }

    /// Extract a required field; absence (or `null`) is a contract violation.
    pub fn require(&self, name: &str) -> Result<&JsonValue, ChoreographyError> {
        match self.data.get(name) {
            Some(JsonValue::Null) | None => Err(ChoreographyError::contract_violation(
                &self.event_type,
                name,
                "field is missing",
            )),
            Some(value) => Ok(value),
        }
    }

    /// Extract a required string field.
    pub fn require_str(&self, name: &str) -> Result<&str, ChoreographyError> {
        self.require(name)?.as_str().ok_or_else(|| {
            ChoreographyError::contract_violation(&self.event_type, name, "expected a string")
        })
    }

    /// Decode into the typed event enum of the context that owns it.
    pub fn decode<E: DomainEvent>(&self) -> Result<E, ChoreographyError> {
        let tagged = join_tagged("event_type", &self.event_type, "data", &self.data);
        serde_json::from_value(tagged)
            .map_err(|e| ChoreographyError::decode(format!("event {}", self.event_type), e))
    }
}
