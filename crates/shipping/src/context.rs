use std::sync::Arc;

use ecommerce_events::{
    AggregateHandler, BoundedContext, ChoreographyError, Cqrs, DomainCommand, DomainEvent,
};

use crate::shipment::{SHIPMENT_CATEGORY, Shipment, ShipmentCommand, ShipmentEvent};

/// Wires the shipping command handlers into a registry.
#[derive(Debug, Default)]
pub struct ShippingContext;

impl BoundedContext for ShippingContext {
    fn name(&self) -> &'static str {
        "shipping"
    }

    fn configure(&self, cqrs: &Cqrs) -> Result<(), ChoreographyError> {
        cqrs.declare_events(ShipmentEvent::EVENT_TYPES)?;
        let handler = AggregateHandler::new(cqrs.event_store(), SHIPMENT_CATEGORY, Shipment::new);
        cqrs.register_commands(ShipmentCommand::COMMAND_TYPES, Arc::new(handler))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecommerce_events::Command;
    use serde_json::json;

    #[test]
    fn address_travels_as_a_nested_object() {
        let cqrs = Cqrs::in_memory();
        ShippingContext.configure(&cqrs).unwrap();
        let address = json!({
            "street": "1 Main St",
            "city": "Springfield",
            "postal_code": "12345",
            "country": "US"
        });

        let added = cqrs
            .run(
                Command::new("AddShippingAddressToShipment")
                    .param("order_id", "O1")
                    .param("postal_address", address.clone()),
            )
            .unwrap();

        assert_eq!(added[0].event_type(), "ShippingAddressAddedToShipment");
        assert_eq!(added[0].field("postal_address"), Some(&address));
    }
}
