//! Cross-context choreography of the shop.
//!
//! - `adapters`: stateless one event → one command translations
//! - `runner` / `state_store`: the process manager runtime
//! - `release_payment`, `order_confirmation`, `shipment`: the sagas

pub mod adapters;
pub mod order_confirmation;
pub mod release_payment;
pub mod runner;
pub mod shipment;
pub mod state_store;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use ecommerce_events::{ChoreographyError, Cqrs, ProcessManager};

pub use adapters::{ADAPTERS, Adapter, AdapterSpec, FieldMapping, Transform, register_adapters};
pub use order_confirmation::{OrderConfirmationMilestone, OrderConfirmationProcess};
pub use release_payment::{ReleasePaymentMilestone, ReleasePaymentProcess};
pub use runner::ProcessRunner;
pub use shipment::{ShipmentMilestone, ShipmentProcess};
pub use state_store::ProcessStateStore;

/// Handles to the registered saga runners, kept for inspection and replay.
#[derive(Debug)]
pub struct ProcessManagers {
    pub release_payment: Arc<ProcessRunner<ReleasePaymentProcess>>,
    pub order_confirmation: Arc<ProcessRunner<OrderConfirmationProcess>>,
    pub shipment: Arc<ProcessRunner<ShipmentProcess>>,
}

fn subscribe<P: ProcessManager>(cqrs: &Cqrs, process: P) -> Result<Arc<ProcessRunner<P>>, ChoreographyError> {
    let event_types = process.event_types();
    let runner = Arc::new(ProcessRunner::new(process, cqrs.command_sink()));
    cqrs.subscribe(runner.clone(), event_types)?;
    Ok(runner)
}

/// Subscribe every saga to its milestone event types.
pub fn register_process_managers(cqrs: &Cqrs) -> Result<ProcessManagers, ChoreographyError> {
    let managers = ProcessManagers {
        release_payment: subscribe(cqrs, ReleasePaymentProcess)?,
        order_confirmation: subscribe(cqrs, OrderConfirmationProcess)?,
        shipment: subscribe(cqrs, ShipmentProcess)?,
    };
    tracing::debug!("process managers registered");
    Ok(managers)
}
