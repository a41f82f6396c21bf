use std::sync::Arc;

use serde::{Deserialize, Serialize};

use ecommerce_core::{Aggregate, DomainError, DomainResult};
use ecommerce_events::{DomainCommand, DomainEvent};

use crate::gateway::PaymentGateway;

/// Stream category of payment streams (one payment per order).
pub const PAYMENT_CATEGORY: &str = "Payments::Payment";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Authorized,
    Captured,
    Released,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command_type", content = "params")]
pub enum PaymentCommand {
    SetPaymentAmount { order_id: String, amount: f64 },
    AuthorizePayment { order_id: String },
    CapturePayment { order_id: String },
    ReleasePayment { order_id: String },
    CancelPayment { order_id: String },
}

impl DomainCommand for PaymentCommand {
    const COMMAND_TYPES: &'static [&'static str] = &[
        "SetPaymentAmount",
        "AuthorizePayment",
        "CapturePayment",
        "ReleasePayment",
        "CancelPayment",
    ];

    fn target_id(&self) -> &str {
        match self {
            PaymentCommand::SetPaymentAmount { order_id, .. }
            | PaymentCommand::AuthorizePayment { order_id }
            | PaymentCommand::CapturePayment { order_id }
            | PaymentCommand::ReleasePayment { order_id }
            | PaymentCommand::CancelPayment { order_id } => order_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", content = "data")]
pub enum PaymentEvent {
    PaymentAmountSet {
        order_id: String,
        amount: f64,
    },
    PaymentAuthorized {
        order_id: String,
        transaction_id: String,
        amount: f64,
    },
    PaymentCaptured {
        order_id: String,
        transaction_id: String,
        amount: f64,
    },
    PaymentReleased {
        order_id: String,
        transaction_id: String,
    },
    PaymentCancelled {
        order_id: String,
        /// `None` when nothing had been authorized yet.
        transaction_id: Option<String>,
    },
}

impl DomainEvent for PaymentEvent {
    const EVENT_TYPES: &'static [&'static str] = &[
        "PaymentAmountSet",
        "PaymentAuthorized",
        "PaymentCaptured",
        "PaymentReleased",
        "PaymentCancelled",
    ];

    fn event_type(&self) -> &'static str {
        match self {
            PaymentEvent::PaymentAmountSet { .. } => "PaymentAmountSet",
            PaymentEvent::PaymentAuthorized { .. } => "PaymentAuthorized",
            PaymentEvent::PaymentCaptured { .. } => "PaymentCaptured",
            PaymentEvent::PaymentReleased { .. } => "PaymentReleased",
            PaymentEvent::PaymentCancelled { .. } => "PaymentCancelled",
        }
    }
}

/// Aggregate root: Payment.
pub struct Payment {
    order_id: String,
    status: PaymentStatus,
    amount: Option<f64>,
    transaction_id: Option<String>,
    gateway: Arc<dyn PaymentGateway>,
}

impl Payment {
    pub fn new(order_id: &str, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            order_id: order_id.to_string(),
            status: PaymentStatus::Pending,
            amount: None,
            transaction_id: None,
            gateway,
        }
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn amount(&self) -> Option<f64> {
        self.amount
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }
}

impl Aggregate for Payment {
    type Command = PaymentCommand;
    type Event = PaymentEvent;

    fn apply(&mut self, event: &PaymentEvent) {
        match event {
            PaymentEvent::PaymentAmountSet { amount, .. } => self.amount = Some(*amount),
            PaymentEvent::PaymentAuthorized { transaction_id, .. } => {
                self.transaction_id = Some(transaction_id.clone());
                self.status = PaymentStatus::Authorized;
            }
            PaymentEvent::PaymentCaptured { .. } => self.status = PaymentStatus::Captured,
            PaymentEvent::PaymentReleased { .. } => self.status = PaymentStatus::Released,
            PaymentEvent::PaymentCancelled { .. } => self.status = PaymentStatus::Cancelled,
        }
    }

    fn handle(&self, command: &PaymentCommand) -> DomainResult<Vec<PaymentEvent>> {
        match command {
            PaymentCommand::SetPaymentAmount { amount, .. } => self.handle_set_amount(*amount),
            PaymentCommand::AuthorizePayment { .. } => self.handle_authorize(),
            PaymentCommand::CapturePayment { .. } => self.handle_capture(),
            PaymentCommand::ReleasePayment { .. } => self.handle_release(),
            PaymentCommand::CancelPayment { .. } => self.handle_cancel(),
        }
    }
}

impl Payment {
    fn transaction(&self) -> DomainResult<String> {
        self.transaction_id
            .clone()
            .ok_or_else(|| DomainError::invariant(format!("payment {} has no transaction", self.order_id)))
    }

    fn handle_set_amount(&self, amount: f64) -> DomainResult<Vec<PaymentEvent>> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(DomainError::validation(format!("invalid payment amount {amount}")));
        }
        if self.status != PaymentStatus::Pending {
            return Err(DomainError::invariant(format!(
                "amount of payment {} cannot change once {:?}",
                self.order_id, self.status
            )));
        }
        Ok(vec![PaymentEvent::PaymentAmountSet {
            order_id: self.order_id.clone(),
            amount,
        }])
    }

    fn handle_authorize(&self) -> DomainResult<Vec<PaymentEvent>> {
        if self.status != PaymentStatus::Pending {
            return Err(DomainError::conflict(format!(
                "payment {} is already {:?}",
                self.order_id, self.status
            )));
        }
        let Some(amount) = self.amount else {
            return Err(DomainError::invariant(format!(
                "payment {} has no amount to authorize",
                self.order_id
            )));
        };
        let transaction_id = self
            .gateway
            .authorize(&self.order_id, amount)
            .map_err(|declined| {
                tracing::warn!(order_id = %self.order_id, amount, %declined, "payment declined");
                DomainError::rejected(declined.to_string())
            })?;
        Ok(vec![PaymentEvent::PaymentAuthorized {
            order_id: self.order_id.clone(),
            transaction_id,
            amount,
        }])
    }

    fn handle_capture(&self) -> DomainResult<Vec<PaymentEvent>> {
        match self.status {
            PaymentStatus::Authorized => Ok(vec![PaymentEvent::PaymentCaptured {
                order_id: self.order_id.clone(),
                transaction_id: self.transaction()?,
                amount: self.amount.unwrap_or_default(),
            }]),
            PaymentStatus::Captured => Ok(vec![]),
            status => Err(DomainError::invariant(format!(
                "payment {} cannot be captured while {status:?}",
                self.order_id
            ))),
        }
    }

    fn handle_release(&self) -> DomainResult<Vec<PaymentEvent>> {
        match self.status {
            PaymentStatus::Authorized | PaymentStatus::Captured => Ok(vec![PaymentEvent::PaymentReleased {
                order_id: self.order_id.clone(),
                transaction_id: self.transaction()?,
            }]),
            PaymentStatus::Released => Ok(vec![]),
            status => Err(DomainError::invariant(format!(
                "payment {} has nothing to release while {status:?}",
                self.order_id
            ))),
        }
    }

    /// A pending payment is closed without a gateway transaction.
    fn handle_cancel(&self) -> DomainResult<Vec<PaymentEvent>> {
        match self.status {
            PaymentStatus::Pending | PaymentStatus::Authorized => Ok(vec![PaymentEvent::PaymentCancelled {
                order_id: self.order_id.clone(),
                transaction_id: self.transaction_id.clone(),
            }]),
            PaymentStatus::Cancelled => Ok(vec![]),
            status => Err(DomainError::invariant(format!(
                "payment {} cannot be cancelled while {status:?}",
                self.order_id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::PaymentDeclined;

    struct Approve;

    impl PaymentGateway for Approve {
        fn authorize(&self, order_id: &str, _amount: f64) -> Result<String, PaymentDeclined> {
            Ok(format!("tx-{order_id}"))
        }
    }

    struct Decline;

    impl PaymentGateway for Decline {
        fn authorize(&self, _order_id: &str, _amount: f64) -> Result<String, PaymentDeclined> {
            Err(PaymentDeclined("insufficient funds".to_string()))
        }
    }

    fn cmd(f: fn(String) -> PaymentCommand) -> PaymentCommand {
        f("O1".to_string())
    }

    fn execute(p: &mut Payment, command: &PaymentCommand) -> DomainResult<Vec<PaymentEvent>> {
        let events = p.handle(command)?;
        for e in &events {
            p.apply(e);
        }
        Ok(events)
    }

    fn authorized(gateway: Arc<dyn PaymentGateway>) -> Payment {
        let mut p = Payment::new("O1", gateway);
        execute(
            &mut p,
            &PaymentCommand::SetPaymentAmount {
                order_id: "O1".to_string(),
                amount: 19.99,
            },
        )
        .unwrap();
        execute(&mut p, &cmd(|order_id| PaymentCommand::AuthorizePayment { order_id })).unwrap();
        p
    }

    #[test]
    fn authorization_records_the_gateway_transaction() {
        let p = authorized(Arc::new(Approve));
        assert_eq!(p.status(), PaymentStatus::Authorized);
        assert_eq!(p.transaction_id(), Some("tx-O1"));
    }

    #[test]
    fn authorization_needs_an_amount() {
        let p = Payment::new("O1", Arc::new(Approve));
        let err = p
            .handle(&cmd(|order_id| PaymentCommand::AuthorizePayment { order_id }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn gateway_decline_is_a_rejection() {
        let mut p = Payment::new("O1", Arc::new(Decline));
        execute(
            &mut p,
            &PaymentCommand::SetPaymentAmount {
                order_id: "O1".to_string(),
                amount: 5.0,
            },
        )
        .unwrap();
        let err = p
            .handle(&cmd(|order_id| PaymentCommand::AuthorizePayment { order_id }))
            .unwrap_err();
        assert_eq!(err, DomainError::rejected("payment declined: insufficient funds"));
    }

    #[test]
    fn release_happens_once() {
        let mut p = authorized(Arc::new(Approve));
        let release = cmd(|order_id| PaymentCommand::ReleasePayment { order_id });

        assert_eq!(execute(&mut p, &release).unwrap().len(), 1);
        assert!(execute(&mut p, &release).unwrap().is_empty());
        assert!(
            p.handle(&cmd(|order_id| PaymentCommand::CancelPayment { order_id }))
                .is_err()
        );
    }

    #[test]
    fn cancelling_before_authorization_closes_the_payment() {
        let mut p = Payment::new("O1", Arc::new(Approve));
        let cancel = cmd(|order_id| PaymentCommand::CancelPayment { order_id });

        let events = execute(&mut p, &cancel).unwrap();
        assert_eq!(
            events,
            vec![PaymentEvent::PaymentCancelled {
                order_id: "O1".to_string(),
                transaction_id: None,
            }]
        );
        assert_eq!(p.status(), PaymentStatus::Cancelled);
        assert!(execute(&mut p, &cancel).unwrap().is_empty());
        assert!(
            p.handle(&cmd(|order_id| PaymentCommand::AuthorizePayment { order_id }))
                .is_err()
        );
    }

    #[test]
    fn cancelling_an_authorization_keeps_its_transaction() {
        let mut p = authorized(Arc::new(Approve));
        let events = execute(&mut p, &cmd(|order_id| PaymentCommand::CancelPayment { order_id })).unwrap();
        assert!(matches!(
            &events[0],
            PaymentEvent::PaymentCancelled { transaction_id: Some(tx), .. } if tx == "tx-O1"
        ));
    }

    #[test]
    fn negative_amount_is_invalid() {
        let p = Payment::new("O1", Arc::new(Approve));
        let err = p
            .handle(&PaymentCommand::SetPaymentAmount {
                order_id: "O1".to_string(),
                amount: -1.0,
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
