use std::sync::Arc;

use ecommerce_events::{
    AggregateHandler, BoundedContext, ChoreographyError, Cqrs, DomainCommand, DomainEvent,
};

use crate::reservation::{RESERVATION_CATEGORY, Reservation, ReservationCommand, ReservationEvent};

/// Wires the inventory command handlers into a registry.
#[derive(Debug, Default)]
pub struct InventoryContext;

impl BoundedContext for InventoryContext {
    fn name(&self) -> &'static str {
        "inventory"
    }

    fn configure(&self, cqrs: &Cqrs) -> Result<(), ChoreographyError> {
        cqrs.declare_events(ReservationEvent::EVENT_TYPES)?;
        let handler = AggregateHandler::new(cqrs.event_store(), RESERVATION_CATEGORY, Reservation::new);
        cqrs.register_commands(ReservationCommand::COMMAND_TYPES, Arc::new(handler))
    }
}
