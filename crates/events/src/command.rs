use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value as JsonValue;

use ecommerce_core::{DomainError, EventId};

use crate::envelope::{EventEnvelope, JsonMap};
use crate::error::ChoreographyError;
use crate::event::{join_tagged, split_tagged};

/// Link from a command to the event that caused it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Causation {
    event_id: EventId,
    correlation_id: EventId,
}

impl Causation {
    pub fn new(event_id: EventId, correlation_id: EventId) -> Self {
        Self {
            event_id,
            correlation_id,
        }
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    pub fn correlation_id(&self) -> EventId {
        self.correlation_id
    }
}

/// A request to perform an action, routed to exactly one handler.
///
/// Commands represent **intent** and are transient (never persisted). The
/// events a handler decides in response are what gets appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    command_type: String,
    params: JsonMap,
    causation: Option<Causation>,
}

impl Command {
    pub fn new(command_type: impl Into<String>) -> Self {
        Self {
            command_type: command_type.into(),
            params: JsonMap::new(),
            causation: None,
        }
    }

    pub fn with_params(command_type: impl Into<String>, params: JsonMap) -> Self {
        Self {
            command_type: command_type.into(),
            params,
            causation: None,
        }
    }

    /// Builder-style parameter setter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Mark this command as caused by `event` (inherits its correlation).
    pub fn caused_by(mut self, event: &EventEnvelope) -> Self {
        self.causation = Some(event.causation());
        self
    }

    pub fn command_type(&self) -> &str {
        &self.command_type
    }

    pub fn params(&self) -> &JsonMap {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&JsonValue> {
        self.params.get(name)
    }

    pub fn causation(&self) -> Option<&Causation> {
        self.causation.as_ref()
    }

    /// Build from a typed command of some bounded context.
    pub fn from_typed<C: DomainCommand>(command: &C) -> Result<Self, ChoreographyError> {
        let value = serde_json::to_value(command)
            .map_err(|e| ChoreographyError::decode("command", e))?;
        let (command_type, params) = split_tagged(value, "command_type", "params")?;
        Ok(Self::with_params(command_type, params))
    }

    /// Decode into a typed command.
    ///
    /// Params that do not fit the handler's schema are rejected as a
    /// validation failure of the receiving handler.
    pub fn decode<C: DomainCommand>(&self) -> Result<C, ChoreographyError> {
        let tagged = join_tagged("command_type", &self.command_type, "params", &self.params);
        serde_json::from_value(tagged).map_err(|e| {
            ChoreographyError::handler_failure(
                &self.command_type,
                DomainError::validation(format!("invalid params: {e}")),
            )
        })
    }
}

/// A typed command owned by one bounded context.
///
/// Implementors are serde enums tagged as
/// `#[serde(tag = "command_type", content = "params")]`.
pub trait DomainCommand: Serialize + DeserializeOwned + Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Every command type this enum accepts (registered with the dispatcher).
    const COMMAND_TYPES: &'static [&'static str];

    /// Id of the aggregate instance this command targets.
    fn target_id(&self) -> &str;
}
