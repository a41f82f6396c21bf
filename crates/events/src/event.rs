use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value as JsonValue;

use ecommerce_core::ExpectedVersion;

use crate::envelope::JsonMap;
use crate::error::ChoreographyError;

/// A typed domain event owned by one bounded context.
///
/// Implementors are serde enums, adjacently tagged as
/// `#[serde(tag = "event_type", content = "data")]`, so that every variant maps
/// onto the generic `{event_type, data}` shape carried by the log.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - designed to be **append-only**
pub trait DomainEvent: Serialize + DeserializeOwned + Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Every event type this enum can produce (declared to the bus at wiring time).
    const EVENT_TYPES: &'static [&'static str];

    /// Stable event name/type identifier (e.g. "OrderSubmitted").
    fn event_type(&self) -> &'static str;
}

/// An event decided by a command handler but not yet appended to the log.
///
/// The log assigns id, sequence number and metadata on append.
#[derive(Debug, Clone, PartialEq)]
pub struct UncommittedEvent {
    pub stream: String,
    pub event_type: String,
    pub data: JsonMap,
    /// Checked against the stream version as it was *before* the batch.
    pub expected_version: ExpectedVersion,
}

impl UncommittedEvent {
    pub fn new(stream: impl Into<String>, event_type: impl Into<String>, data: JsonMap) -> Self {
        Self {
            stream: stream.into(),
            event_type: event_type.into(),
            data,
            expected_version: ExpectedVersion::Any,
        }
    }

    pub fn with_expected_version(mut self, expected_version: ExpectedVersion) -> Self {
        self.expected_version = expected_version;
        self
    }

    /// Build from a typed domain event.
    pub fn from_typed<E: DomainEvent>(
        stream: impl Into<String>,
        event: &E,
        expected_version: ExpectedVersion,
    ) -> Result<Self, ChoreographyError> {
        let value = serde_json::to_value(event)
            .map_err(|e| ChoreographyError::decode(format!("event {}", event.event_type()), e))?;
        let (event_type, data) = split_tagged(value, "event_type", "data")?;
        Ok(Self {
            stream: stream.into(),
            event_type,
            data,
            expected_version,
        })
    }
}

/// Split an adjacently tagged serde value into `(tag, content)`.
pub(crate) fn split_tagged(
    value: JsonValue,
    tag: &str,
    content: &str,
) -> Result<(String, JsonMap), ChoreographyError> {
    let JsonValue::Object(mut obj) = value else {
        return Err(ChoreographyError::decode("tagged message", "expected a JSON object"));
    };
    let name = match obj.remove(tag) {
        Some(JsonValue::String(s)) => s,
        _ => return Err(ChoreographyError::decode("tagged message", format!("missing '{tag}'"))),
    };
    let body = match obj.remove(content) {
        Some(JsonValue::Object(map)) => map,
        None | Some(JsonValue::Null) => JsonMap::new(),
        Some(other) => {
            return Err(ChoreographyError::decode(
                format!("message {name}"),
                format!("'{content}' must be an object, got {other}"),
            ));
        }
    };
    Ok((name, body))
}

/// Inverse of [`split_tagged`].
pub(crate) fn join_tagged(tag: &str, name: &str, content: &str, body: &JsonMap) -> JsonValue {
    let mut obj = JsonMap::new();
    obj.insert(tag.to_string(), JsonValue::String(name.to_string()));
    obj.insert(content.to_string(), JsonValue::Object(body.clone()));
    JsonValue::Object(obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "event_type", content = "data")]
    enum BasketEvent {
        ItemAddedToBasket { order_id: String, product_id: String },
    }

    impl DomainEvent for BasketEvent {
        const EVENT_TYPES: &'static [&'static str] = &["ItemAddedToBasket"];

        fn event_type(&self) -> &'static str {
            "ItemAddedToBasket"
        }
    }

    #[test]
    fn typed_events_flatten_into_type_and_data() {
        let ev = BasketEvent::ItemAddedToBasket {
            order_id: "O1".to_string(),
            product_id: "P1".to_string(),
        };
        let uncommitted =
            UncommittedEvent::from_typed("Ordering::Order$O1", &ev, ExpectedVersion::Exact(2)).unwrap();

        assert_eq!(uncommitted.event_type, "ItemAddedToBasket");
        assert_eq!(uncommitted.data.get("order_id"), Some(&json!("O1")));
        assert_eq!(uncommitted.data.get("product_id"), Some(&json!("P1")));
        assert_eq!(uncommitted.expected_version, ExpectedVersion::Exact(2));
    }

    #[test]
    fn split_rejects_non_object_content() {
        let err = split_tagged(json!({ "event_type": "X", "data": 3 }), "event_type", "data").unwrap_err();
        assert!(matches!(err, ChoreographyError::Decode { .. }));
    }
}
