//! Append-only event log boundary.
//!
//! The bus is built on top of this trait. The log is the only shared mutable
//! resource of the choreography; everything else is derived from it.

use std::sync::Arc;

use thiserror::Error;

use ecommerce_core::EventId;

use crate::command::Causation;
use crate::envelope::EventEnvelope;
use crate::event::UncommittedEvent;

/// Event log operation error.
///
/// These are **infrastructure errors** (storage, concurrency) as opposed to
/// domain errors (validation, invariants).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventStoreError {
    #[error("optimistic concurrency check failed on {stream}: expected {expected}, found {actual}")]
    Concurrency {
        stream: String,
        expected: u64,
        actual: u64,
    },

    #[error("invalid append: {0}")]
    InvalidAppend(String),

    #[error("event log lock poisoned")]
    Poisoned,
}

/// Append-only, globally ordered event log.
///
/// ## Append Semantics
///
/// `append()`:
/// - checks every event's `expected_version` against its stream *before* the batch
/// - assigns event ids and global sequence numbers (last + 1, no gaps)
/// - stamps metadata: events caused by another event inherit its correlation id
///   and point at it as causation; root events correlate to themselves
/// - persists the batch atomically (all or nothing)
///
/// ## Read Semantics
///
/// All reads return events in append order.
pub trait EventStore: Send + Sync {
    fn append(
        &self,
        events: Vec<UncommittedEvent>,
        causation: Option<&Causation>,
    ) -> Result<Vec<EventEnvelope>, EventStoreError>;

    fn read_all(&self) -> Result<Vec<EventEnvelope>, EventStoreError>;

    /// Events of one aggregate instance.
    fn read_stream(&self, stream: &str) -> Result<Vec<EventEnvelope>, EventStoreError>;

    /// Every event that belongs to the workflow started by `correlation_id`.
    fn read_by_correlation(&self, correlation_id: EventId) -> Result<Vec<EventEnvelope>, EventStoreError>;

    /// Events directly caused by `causation_id`.
    fn read_by_causation(&self, causation_id: EventId) -> Result<Vec<EventEnvelope>, EventStoreError>;

    fn read_by_type(&self, event_type: &str) -> Result<Vec<EventEnvelope>, EventStoreError>;
}

impl<S> EventStore for Arc<S>
where
    S: EventStore + ?Sized,
{
    fn append(
        &self,
        events: Vec<UncommittedEvent>,
        causation: Option<&Causation>,
    ) -> Result<Vec<EventEnvelope>, EventStoreError> {
        (**self).append(events, causation)
    }

    fn read_all(&self) -> Result<Vec<EventEnvelope>, EventStoreError> {
        (**self).read_all()
    }

    fn read_stream(&self, stream: &str) -> Result<Vec<EventEnvelope>, EventStoreError> {
        (**self).read_stream(stream)
    }

    fn read_by_correlation(&self, correlation_id: EventId) -> Result<Vec<EventEnvelope>, EventStoreError> {
        (**self).read_by_correlation(correlation_id)
    }

    fn read_by_causation(&self, causation_id: EventId) -> Result<Vec<EventEnvelope>, EventStoreError> {
        (**self).read_by_causation(causation_id)
    }

    fn read_by_type(&self, event_type: &str) -> Result<Vec<EventEnvelope>, EventStoreError> {
        (**self).read_by_type(event_type)
    }
}
