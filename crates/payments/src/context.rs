use std::sync::Arc;

use ecommerce_events::{
    AggregateHandler, BoundedContext, ChoreographyError, Cqrs, DomainCommand, DomainEvent,
};

use crate::gateway::PaymentGateway;
use crate::payment::{PAYMENT_CATEGORY, Payment, PaymentCommand, PaymentEvent};

/// Wires the payments command handlers into a registry.
pub struct PaymentsContext {
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentsContext {
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { gateway }
    }
}

impl BoundedContext for PaymentsContext {
    fn name(&self) -> &'static str {
        "payments"
    }

    fn configure(&self, cqrs: &Cqrs) -> Result<(), ChoreographyError> {
        cqrs.declare_events(PaymentEvent::EVENT_TYPES)?;

        let gateway = self.gateway.clone();
        let handler = AggregateHandler::new(cqrs.event_store(), PAYMENT_CATEGORY, move |id: &str| {
            Payment::new(id, gateway.clone())
        });
        cqrs.register_commands(PaymentCommand::COMMAND_TYPES, Arc::new(handler))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::PaymentDeclined;
    use ecommerce_events::Command;
    use serde_json::json;

    struct Approve;

    impl PaymentGateway for Approve {
        fn authorize(&self, _order_id: &str, _amount: f64) -> Result<String, PaymentDeclined> {
            Ok("tx-1".to_string())
        }
    }

    #[test]
    fn numeric_amount_flows_into_the_authorization() {
        let cqrs = Cqrs::in_memory();
        PaymentsContext::new(Arc::new(Approve)).configure(&cqrs).unwrap();

        cqrs.run(
            Command::new("SetPaymentAmount")
                .param("order_id", "O1")
                .param("amount", 19.99),
        )
        .unwrap();
        let authorized = cqrs
            .run(Command::new("AuthorizePayment").param("order_id", "O1"))
            .unwrap();

        assert_eq!(authorized[0].event_type(), "PaymentAuthorized");
        assert_eq!(authorized[0].field("amount"), Some(&json!(19.99)));
        assert_eq!(authorized[0].field("transaction_id"), Some(&json!("tx-1")));
    }

    #[test]
    fn string_amount_does_not_fit_the_command_schema() {
        let cqrs = Cqrs::in_memory();
        PaymentsContext::new(Arc::new(Approve)).configure(&cqrs).unwrap();

        let err = cqrs
            .run(
                Command::new("SetPaymentAmount")
                    .param("order_id", "O1")
                    .param("amount", "19.99"),
            )
            .unwrap_err();
        assert!(err.is_handler_failure());
    }
}
