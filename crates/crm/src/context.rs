use std::sync::Arc;

use ecommerce_events::{
    AggregateHandler, BoundedContext, ChoreographyError, Cqrs, DomainCommand, DomainEvent,
};

use crate::customer::{CUSTOMER_CATEGORY, Customer, CustomerCommand, CustomerEvent};

/// Wires the CRM command handlers into a registry.
#[derive(Debug, Default)]
pub struct CrmContext;

impl BoundedContext for CrmContext {
    fn name(&self) -> &'static str {
        "crm"
    }

    fn configure(&self, cqrs: &Cqrs) -> Result<(), ChoreographyError> {
        cqrs.declare_events(CustomerEvent::EVENT_TYPES)?;
        let handler = AggregateHandler::new(cqrs.event_store(), CUSTOMER_CATEGORY, Customer::new);
        cqrs.register_commands(CustomerCommand::COMMAND_TYPES, Arc::new(handler))
    }
}
