//! Order confirmation process.
//!
//! Confirms an order on the first sign that its payment is secured, whether
//! that is the authorization or the capture. The second signal is a no-op.

use ecommerce_events::{Command, ProcessManager, ProcessState, Reaction};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum OrderConfirmationMilestone {
    PaymentAuthorized,
    PaymentCaptured,
}

pub const CONFIRM: &str = "confirm_order";

#[derive(Debug, Default, Clone, Copy)]
pub struct OrderConfirmationProcess;

impl ProcessManager for OrderConfirmationProcess {
    type Milestone = OrderConfirmationMilestone;

    fn name(&self) -> &'static str {
        "OrderConfirmationProcess"
    }

    fn event_types(&self) -> &'static [&'static str] {
        &["PaymentAuthorized", "PaymentCaptured"]
    }

    fn milestone(&self, event_type: &str) -> Option<OrderConfirmationMilestone> {
        match event_type {
            "PaymentAuthorized" => Some(OrderConfirmationMilestone::PaymentAuthorized),
            "PaymentCaptured" => Some(OrderConfirmationMilestone::PaymentCaptured),
            _ => None,
        }
    }

    fn react(&self, _state: &ProcessState<OrderConfirmationMilestone>, order_id: &str) -> Vec<Reaction> {
        // Any observed milestone is enough.
        let command = Command::new("ConfirmOrder").param("order_id", order_id);
        vec![Reaction::new(CONFIRM, command).completing().confirmed_by(&["OrderPaid"])]
    }
}
