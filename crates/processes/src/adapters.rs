//! Adapter handlers: stateless event → command translation across contexts.
//!
//! Each adapter copies named fields from one event's data into the params of
//! exactly one command and dispatches it. Adapters do no business validation;
//! a missing or unusable field is a contract violation between the two
//! contexts involved.

use std::sync::Arc;

use serde_json::{Number, Value as JsonValue};

use ecommerce_events::{ChoreographyError, Command, CommandSink, Cqrs, EventEnvelope, EventHandler};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Copy the value as is.
    Copy,
    /// JSON number or decimal string → JSON number.
    Numeric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub from: &'static str,
    pub to: &'static str,
    pub transform: Transform,
}

impl FieldMapping {
    pub const fn copy(name: &'static str) -> Self {
        Self::renamed(name, name)
    }

    pub const fn renamed(from: &'static str, to: &'static str) -> Self {
        Self {
            from,
            to,
            transform: Transform::Copy,
        }
    }

    pub const fn numeric(from: &'static str, to: &'static str) -> Self {
        Self {
            from,
            to,
            transform: Transform::Numeric,
        }
    }
}

/// Static description of one adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterSpec {
    pub name: &'static str,
    /// Every source type gets its own subscription of the same adapter.
    pub source_event_types: &'static [&'static str],
    pub command_type: &'static str,
    pub fields: &'static [FieldMapping],
}

const ORDER_ID: FieldMapping = FieldMapping::copy("order_id");
const PRODUCT_ID: FieldMapping = FieldMapping::copy("product_id");

/// Every cross-context translation of the shop, in registration order.
pub const ADAPTERS: &[AdapterSpec] = &[
    AdapterSpec {
        name: "AddPriceItemOnItemAddedToBasket",
        source_event_types: &["ItemAddedToBasket"],
        command_type: "AddPriceItem",
        fields: &[ORDER_ID, PRODUCT_ID],
    },
    AdapterSpec {
        name: "RemovePriceItemOnItemRemovedFromBasket",
        source_event_types: &["ItemRemovedFromBasket"],
        command_type: "RemovePriceItem",
        fields: &[ORDER_ID, PRODUCT_ID],
    },
    AdapterSpec {
        name: "CalculateTotalValueOnOrderSubmitted",
        source_event_types: &["OrderSubmitted"],
        command_type: "CalculateTotalValue",
        fields: &[ORDER_ID],
    },
    AdapterSpec {
        name: "SubmitReservationOnOrderSubmitted",
        source_event_types: &["OrderSubmitted"],
        command_type: "SubmitReservation",
        fields: &[ORDER_ID, FieldMapping::renamed("order_lines", "reservation_items")],
    },
    AdapterSpec {
        name: "CompleteReservationOnOrderPaid",
        source_event_types: &["OrderPaid"],
        command_type: "CompleteReservation",
        fields: &[ORDER_ID],
    },
    AdapterSpec {
        name: "CancelReservationOnOrderCancelledOrExpired",
        source_event_types: &["OrderCancelled", "OrderExpired"],
        command_type: "CancelReservation",
        fields: &[ORDER_ID],
    },
    AdapterSpec {
        name: "SetPaymentAmountOnOrderTotalValueCalculated",
        source_event_types: &["OrderTotalValueCalculated"],
        command_type: "SetPaymentAmount",
        fields: &[ORDER_ID, FieldMapping::numeric("discounted_amount", "amount")],
    },
    AdapterSpec {
        name: "AddItemToShipmentPickingListOnItemAddedToBasket",
        source_event_types: &["ItemAddedToBasket"],
        command_type: "AddItemToShipmentPickingList",
        fields: &[ORDER_ID, PRODUCT_ID],
    },
    AdapterSpec {
        name: "RemoveItemFromShipmentPickingListOnItemRemovedFromBasket",
        source_event_types: &["ItemRemovedFromBasket"],
        command_type: "RemoveItemFromShipmentPickingList",
        fields: &[ORDER_ID, PRODUCT_ID],
    },
];

pub struct Adapter {
    spec: AdapterSpec,
    sink: Arc<dyn CommandSink>,
}

impl Adapter {
    pub fn new(spec: AdapterSpec, sink: Arc<dyn CommandSink>) -> Self {
        Self { spec, sink }
    }

    pub fn spec(&self) -> &AdapterSpec {
        &self.spec
    }

    /// Build the command for `event` (pure).
    pub fn translate(&self, event: &EventEnvelope) -> Result<Command, ChoreographyError> {
        let mut command = Command::new(self.spec.command_type);
        for mapping in self.spec.fields {
            let value = event.require(mapping.from)?;
            let value = match mapping.transform {
                Transform::Copy => value.clone(),
                Transform::Numeric => numeric(event.event_type(), mapping.from, value)?,
            };
            command = command.param(mapping.to, value);
        }
        Ok(command)
    }
}

impl EventHandler for Adapter {
    fn name(&self) -> &str {
        self.spec.name
    }

    fn handle(&self, event: &EventEnvelope) -> Result<(), ChoreographyError> {
        let command = self.translate(event).inspect_err(|e| {
            tracing::error!(
                adapter = self.spec.name,
                event_type = event.event_type(),
                error = %e,
                "cannot translate event"
            );
        })?;
        self.sink.dispatch(command.caused_by(event))?;
        Ok(())
    }
}

/// Coerce a JSON number or a decimal string into a JSON number.
pub fn numeric(event_type: &str, field: &str, value: &JsonValue) -> Result<JsonValue, ChoreographyError> {
    let invalid = |reason: &str| ChoreographyError::contract_violation(event_type, field, reason);
    match value {
        JsonValue::Number(_) => Ok(value.clone()),
        JsonValue::String(s) => {
            let decimal = !s.is_empty()
                && s.bytes().all(|b| b.is_ascii_digit() || b == b'.' || b == b'-')
                && s.bytes().any(|b| b.is_ascii_digit());
            s.parse::<f64>()
                .ok()
                .filter(|n| decimal && n.is_finite())
                .and_then(Number::from_f64)
                .map(JsonValue::Number)
                .ok_or_else(|| invalid("expected a decimal number"))
        }
        _ => Err(invalid("expected a number or a decimal string")),
    }
}

/// Subscribe every adapter in [`ADAPTERS`].
pub fn register_adapters(cqrs: &Cqrs) -> Result<(), ChoreographyError> {
    let sink = cqrs.command_sink();
    for spec in ADAPTERS {
        let adapter = Arc::new(Adapter::new(*spec, sink.clone()));
        cqrs.subscribe(adapter, spec.source_event_types)?;
    }
    tracing::debug!(adapters = ADAPTERS.len(), "adapters registered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingSink, event};
    use serde_json::json;

    fn spec(name: &str) -> AdapterSpec {
        *ADAPTERS.iter().find(|s| s.name == name).unwrap()
    }

    fn run(name: &str, source: EventEnvelope) -> (Result<(), ChoreographyError>, Vec<Command>) {
        let sink = Arc::new(RecordingSink::default());
        let adapter = Adapter::new(spec(name), sink.clone());
        let result = adapter.handle(&source);
        (result, sink.commands())
    }

    #[test]
    fn item_added_becomes_exactly_add_price_item() {
        let source = event(
            "ItemAddedToBasket",
            json!({ "order_id": "O1", "product_id": "P1", "quantity": 1 }),
        );
        let (result, commands) = run("AddPriceItemOnItemAddedToBasket", source.clone());

        result.unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].command_type(), "AddPriceItem");
        assert_eq!(
            commands[0].params(),
            json!({ "order_id": "O1", "product_id": "P1" }).as_object().unwrap()
        );
        assert_eq!(
            commands[0].causation().map(|c| c.event_id()),
            Some(source.event_id())
        );
    }

    #[test]
    fn discounted_amount_string_becomes_a_number() {
        let source = event(
            "OrderTotalValueCalculated",
            json!({ "order_id": "O1", "amount": "22.21", "discounted_amount": "19.99" }),
        );
        let (result, commands) = run("SetPaymentAmountOnOrderTotalValueCalculated", source);

        result.unwrap();
        assert_eq!(commands[0].command_type(), "SetPaymentAmount");
        assert_eq!(commands[0].get("amount"), Some(&json!(19.99)));
        assert_eq!(commands[0].get("order_id"), Some(&json!("O1")));
    }

    #[test]
    fn order_lines_become_reservation_items() {
        let source = event(
            "OrderSubmitted",
            json!({ "order_id": "O1", "order_lines": { "P1": 2 }, "order_number": "ORD-1" }),
        );
        let (result, commands) = run("SubmitReservationOnOrderSubmitted", source);

        result.unwrap();
        assert_eq!(commands[0].get("reservation_items"), Some(&json!({ "P1": 2 })));
        assert!(commands[0].get("order_number").is_none());
    }

    #[test]
    fn missing_field_is_a_contract_violation_and_nothing_is_dispatched() {
        let (result, commands) = run(
            "AddPriceItemOnItemAddedToBasket",
            event("ItemAddedToBasket", json!({ "order_id": "O1" })),
        );

        let err = result.unwrap_err();
        assert!(err.is_contract_violation());
        assert!(commands.is_empty());
    }

    #[test]
    fn non_numeric_amount_is_a_contract_violation() {
        for bad in [json!("abc"), json!("NaN"), json!(""), json!(true), json!({ "v": 1 })] {
            let err = numeric("OrderTotalValueCalculated", "discounted_amount", &bad).unwrap_err();
            assert!(err.is_contract_violation(), "{bad} accepted");
        }
        assert_eq!(numeric("E", "f", &json!(5)).unwrap(), json!(5));
        assert_eq!(numeric("E", "f", &json!("7")).unwrap(), json!(7.0));
    }

    #[test]
    fn downstream_rejection_propagates() {
        let sink = Arc::new(RecordingSink::failing_first(1));
        let adapter = Adapter::new(spec("CompleteReservationOnOrderPaid"), sink);
        let err = adapter
            .handle(&event("OrderPaid", json!({ "order_id": "O1" })))
            .unwrap_err();
        assert!(err.is_handler_failure());
    }

    #[test]
    fn multi_source_adapter_is_subscribed_to_each_source() {
        let cqrs = Cqrs::in_memory();
        register_adapters(&cqrs).unwrap();

        let names = |t: &str| -> Vec<String> {
            cqrs.bus()
                .handlers_for(t)
                .unwrap()
                .iter()
                .map(|h| h.name().to_string())
                .collect()
        };
        assert_eq!(names("OrderCancelled"), vec!["CancelReservationOnOrderCancelledOrExpired"]);
        assert_eq!(names("OrderExpired"), vec!["CancelReservationOnOrderCancelledOrExpired"]);
        assert_eq!(
            names("ItemAddedToBasket"),
            vec![
                "AddPriceItemOnItemAddedToBasket",
                "AddItemToShipmentPickingListOnItemAddedToBasket"
            ]
        );
    }
}
