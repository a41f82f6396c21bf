//! Default implementations of the external collaborators.

use std::sync::atomic::{AtomicU64, Ordering};

use ecommerce_ordering::NumberGenerator;
use ecommerce_payments::{PaymentDeclined, PaymentGateway};

/// `{prefix}-{n}` with `n` counting up from 1.
#[derive(Debug)]
pub struct SequentialNumberGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialNumberGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl NumberGenerator for SequentialNumberGenerator {
    fn next_order_number(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        format!("{}-{n:06}", self.prefix)
    }
}

/// Approves every positive amount and hands out sequential transaction ids.
#[derive(Debug, Default)]
pub struct ApprovingGateway {
    issued: AtomicU64,
}

impl PaymentGateway for ApprovingGateway {
    fn authorize(&self, order_id: &str, amount: f64) -> Result<String, PaymentDeclined> {
        if amount <= 0.0 {
            return Err(PaymentDeclined(format!("nothing to authorize for order {order_id}")));
        }
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(order_id, amount, "payment authorized");
        Ok(format!("TX-{n}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_numbers_are_unique_and_prefixed() {
        let numbers = SequentialNumberGenerator::new("ORD");
        assert_eq!(numbers.next_order_number(), "ORD-000001");
        assert_eq!(numbers.next_order_number(), "ORD-000002");
    }

    #[test]
    fn gateway_declines_zero_amounts() {
        let gateway = ApprovingGateway::default();
        assert_eq!(gateway.authorize("O1", 12.5).unwrap(), "TX-1");
        assert!(gateway.authorize("O2", 0.0).is_err());
    }
}
