//! Choreography error taxonomy.
//!
//! Propagation is fail-fast everywhere: a failure anywhere in a cascade is
//! returned to the original publisher/dispatcher, never swallowed.

use thiserror::Error;

use ecommerce_core::DomainError;

use crate::store::EventStoreError;

/// Wiring problems. Fatal, surfaced at startup or on first use.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("missing required collaborator: {0}")]
    MissingCollaborator(&'static str),

    #[error("no handler registered for command type '{0}'")]
    UnregisteredCommand(String),

    #[error("unknown event type '{0}' (not declared by any context nor subscribed to)")]
    UnknownEventType(String),

    #[error("a handler is already registered for command type '{0}'")]
    DuplicateCommandHandler(String),

    #[error("command dispatcher is no longer available")]
    DispatcherUnavailable,

    #[error("invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum ChoreographyError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// An adapter or saga could not extract a required field from event data.
    ///
    /// This is a broken contract between two contexts (a bug), not a business
    /// rejection, and must not be retried.
    #[error("contract violation: {event_type} is missing usable field '{field}': {reason}")]
    ContractViolation {
        event_type: String,
        field: String,
        reason: String,
    },

    /// A command handler rejected the command on business grounds.
    #[error("command {command_type} rejected: {source}")]
    HandlerFailure {
        command_type: String,
        #[source]
        source: DomainError,
    },

    #[error("cascade depth limit of {limit} exceeded (runaway publish/dispatch cycle?)")]
    CascadeDepthExceeded { limit: usize },

    #[error(transparent)]
    Store(#[from] EventStoreError),

    /// A stored event does not match the typed schema of the context that owns it.
    #[error("cannot decode {what}: {reason}")]
    Decode { what: String, reason: String },

    #[error("lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

impl ChoreographyError {
    pub fn contract_violation(
        event_type: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ContractViolation {
            event_type: event_type.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn handler_failure(command_type: impl Into<String>, source: DomainError) -> Self {
        Self::HandlerFailure {
            command_type: command_type.into(),
            source,
        }
    }

    pub fn decode(what: impl Into<String>, reason: impl core::fmt::Display) -> Self {
        Self::Decode {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::ContractViolation { .. })
    }

    pub fn is_handler_failure(&self) -> bool {
        matches!(self, Self::HandlerFailure { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_are_distinguishable() {
        let contract = ChoreographyError::contract_violation("OrderPaid", "order_id", "missing");
        let business = ChoreographyError::handler_failure(
            "SubmitOrder",
            DomainError::invariant("order is empty"),
        );
        let config: ChoreographyError =
            ConfigurationError::UnregisteredCommand("Nope".to_string()).into();

        assert!(contract.is_contract_violation() && !contract.is_handler_failure());
        assert!(business.is_handler_failure() && !business.is_contract_violation());
        assert!(config.is_configuration());
    }

    #[test]
    fn messages_name_the_offending_field() {
        let err = ChoreographyError::contract_violation("ItemAddedToBasket", "product_id", "missing");
        let msg = err.to_string();
        assert!(msg.contains("ItemAddedToBasket"));
        assert!(msg.contains("product_id"));
    }
}
