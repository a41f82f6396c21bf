use thiserror::Error;

/// The gateway declined an authorization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("payment declined: {0}")]
pub struct PaymentDeclined(pub String);

/// External payment provider.
pub trait PaymentGateway: Send + Sync {
    /// Place a hold of `amount` for `order_id`; returns the transaction id.
    fn authorize(&self, order_id: &str, amount: f64) -> Result<String, PaymentDeclined>;
}
