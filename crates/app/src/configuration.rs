//! Composition root.
//!
//! Wiring order is fixed:
//! 1. bounded contexts (their command handlers and event types)
//! 2. adapters
//! 3. process managers
//! 4. the event linker, subscribed to every event
//!
//! Missing collaborators are reported before anything is registered.

use std::sync::Arc;

use ecommerce_crm::CrmContext;
use ecommerce_events::{
    BoundedContext, ChoreographyError, ConfigurationError, Cqrs, EventEnvelope, EventHandler, InMemoryEventStore,
};
use ecommerce_inventory::InventoryContext;
use ecommerce_ordering::{NumberGenerator, OrderingContext};
use ecommerce_payments::{PaymentGateway, PaymentsContext};
use ecommerce_pricing::PricingContext;
use ecommerce_processes::{ProcessManagers, register_adapters, register_process_managers};
use ecommerce_shipping::ShippingContext;

use crate::collaborators::{ApprovingGateway, SequentialNumberGenerator};
use crate::config::RuntimeConfig;

pub struct Configuration {
    number_generator: Option<Arc<dyn NumberGenerator>>,
    payment_gateway: Option<Arc<dyn PaymentGateway>>,
}

impl Configuration {
    pub fn new(
        number_generator: Option<Arc<dyn NumberGenerator>>,
        payment_gateway: Option<Arc<dyn PaymentGateway>>,
    ) -> Self {
        Self {
            number_generator,
            payment_gateway,
        }
    }

    /// Wire everything into `cqrs`. Consumes the configuration so it runs once.
    pub fn call(self, cqrs: &Cqrs) -> Result<ProcessManagers, ChoreographyError> {
        let number_generator = self
            .number_generator
            .ok_or(ConfigurationError::MissingCollaborator("number generator"))?;
        let payment_gateway = self
            .payment_gateway
            .ok_or(ConfigurationError::MissingCollaborator("payment gateway"))?;

        let contexts: Vec<Box<dyn BoundedContext>> = vec![
            Box::new(ShippingContext),
            Box::new(OrderingContext::new(number_generator)),
            Box::new(PricingContext),
            Box::new(PaymentsContext::new(payment_gateway)),
            Box::new(CrmContext),
            Box::new(InventoryContext),
        ];
        for context in &contexts {
            context.configure(cqrs)?;
            tracing::debug!(context = context.name(), "bounded context configured");
        }

        register_adapters(cqrs)?;
        let processes = register_process_managers(cqrs)?;
        cqrs.subscribe_to_all_events(Arc::new(EventLinker))?;

        tracing::info!(
            subscriptions = cqrs.bus().subscription_count(),
            command_types = cqrs.dispatcher().registered_command_types().len(),
            "choreography configured"
        );
        Ok(processes)
    }
}

/// Single entry point: wire the shop into `cqrs`.
pub fn configure(
    cqrs: &Cqrs,
    number_generator: Option<Arc<dyn NumberGenerator>>,
    payment_gateway: Option<Arc<dyn PaymentGateway>>,
) -> Result<ProcessManagers, ChoreographyError> {
    Configuration::new(number_generator, payment_gateway).call(cqrs)
}

/// Traces how every event links to its correlation and causation chain.
///
/// The log itself indexes events by type, correlation and causation; this
/// subscriber only makes the links visible.
pub struct EventLinker;

impl EventHandler for EventLinker {
    fn name(&self) -> &str {
        "EventLinker"
    }

    fn handle(&self, event: &EventEnvelope) -> Result<(), ChoreographyError> {
        let metadata = event.metadata();
        tracing::debug!(
            event_id = %event.event_id(),
            event_type = event.event_type(),
            stream = event.stream(),
            correlation_id = %metadata.correlation_id(),
            causation_id = ?metadata.causation_id().map(|id| id.to_string()),
            "event linked"
        );
        Ok(())
    }
}

/// A fully wired in-memory shop with the default collaborators.
#[derive(Debug)]
pub struct Shop {
    pub cqrs: Cqrs,
    pub processes: ProcessManagers,
}

impl Shop {
    pub fn in_memory(config: &RuntimeConfig) -> Result<Self, ChoreographyError> {
        let cqrs = Cqrs::with_depth_limit(Arc::new(InMemoryEventStore::new()), config.cascade_depth_limit);
        let processes = configure(
            &cqrs,
            Some(Arc::new(SequentialNumberGenerator::new(config.order_number_prefix.clone()))),
            Some(Arc::new(ApprovingGateway::default())),
        )?;
        Ok(Self { cqrs, processes })
    }
}
