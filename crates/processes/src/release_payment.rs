//! Release payment process.
//!
//! Guarantees the payment hold of an order is settled exactly once:
//! - paid and authorized → `ReleasePayment`
//! - expired before being paid → `CancelPayment`
//!
//! Whichever path completes first closes the instance, so the other can
//! never fire. A `PaymentReleased` observed first closes it silently.

use ecommerce_events::{Command, ProcessManager, ProcessState, Reaction};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReleasePaymentMilestone {
    OrderSubmitted,
    PaymentAuthorized,
    OrderPaid,
    OrderExpired,
    PaymentReleased,
}

pub const RELEASE: &str = "release_payment";
pub const CANCEL: &str = "cancel_payment";

#[derive(Debug, Default, Clone, Copy)]
pub struct ReleasePaymentProcess;

impl ProcessManager for ReleasePaymentProcess {
    type Milestone = ReleasePaymentMilestone;

    fn name(&self) -> &'static str {
        "ReleasePaymentProcess"
    }

    fn event_types(&self) -> &'static [&'static str] {
        &[
            "OrderSubmitted",
            "PaymentAuthorized",
            "OrderPaid",
            "OrderExpired",
            "PaymentReleased",
        ]
    }

    fn milestone(&self, event_type: &str) -> Option<ReleasePaymentMilestone> {
        use ReleasePaymentMilestone::*;
        match event_type {
            "OrderSubmitted" => Some(OrderSubmitted),
            "PaymentAuthorized" => Some(PaymentAuthorized),
            "OrderPaid" => Some(OrderPaid),
            "OrderExpired" => Some(OrderExpired),
            "PaymentReleased" => Some(PaymentReleased),
            _ => None,
        }
    }

    fn react(&self, state: &ProcessState<ReleasePaymentMilestone>, order_id: &str) -> Vec<Reaction> {
        use ReleasePaymentMilestone::*;
        if state.has_all(&[OrderPaid, PaymentAuthorized]) {
            let command = Command::new("ReleasePayment").param("order_id", order_id);
            return vec![
                Reaction::new(RELEASE, command)
                    .completing()
                    .confirmed_by(&["PaymentReleased"]),
            ];
        }
        if state.has(OrderExpired) && !state.has(OrderPaid) {
            let command = Command::new("CancelPayment").param("order_id", order_id);
            return vec![
                Reaction::new(CANCEL, command)
                    .completing()
                    .confirmed_by(&["PaymentCancelled"]),
            ];
        }
        vec![]
    }

    fn is_closed(&self, state: &ProcessState<ReleasePaymentMilestone>) -> bool {
        state.has(ReleasePaymentMilestone::PaymentReleased)
    }
}
