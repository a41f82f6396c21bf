use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ecommerce_core::{Aggregate, DomainError, DomainResult};
use ecommerce_events::{DomainCommand, DomainEvent};

/// Stream category of reservation streams (one reservation per order).
pub const RESERVATION_CATEGORY: &str = "Inventory::Reservation";

/// Reservation status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    None,
    Submitted,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command_type", content = "params")]
pub enum ReservationCommand {
    SubmitReservation {
        order_id: String,
        /// product id → quantity
        reservation_items: BTreeMap<String, u32>,
    },
    CompleteReservation { order_id: String },
    CancelReservation { order_id: String },
}

impl DomainCommand for ReservationCommand {
    const COMMAND_TYPES: &'static [&'static str] =
        &["SubmitReservation", "CompleteReservation", "CancelReservation"];

    fn target_id(&self) -> &str {
        match self {
            ReservationCommand::SubmitReservation { order_id, .. }
            | ReservationCommand::CompleteReservation { order_id }
            | ReservationCommand::CancelReservation { order_id } => order_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", content = "data")]
pub enum ReservationEvent {
    ReservationSubmitted {
        order_id: String,
        reservation_items: BTreeMap<String, u32>,
    },
    ReservationCompleted { order_id: String },
    ReservationCancelled { order_id: String },
}

impl DomainEvent for ReservationEvent {
    const EVENT_TYPES: &'static [&'static str] =
        &["ReservationSubmitted", "ReservationCompleted", "ReservationCancelled"];

    fn event_type(&self) -> &'static str {
        match self {
            ReservationEvent::ReservationSubmitted { .. } => "ReservationSubmitted",
            ReservationEvent::ReservationCompleted { .. } => "ReservationCompleted",
            ReservationEvent::ReservationCancelled { .. } => "ReservationCancelled",
        }
    }
}

/// Aggregate root: Reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    order_id: String,
    status: ReservationStatus,
    items: BTreeMap<String, u32>,
}

impl Reservation {
    pub fn new(order_id: &str) -> Self {
        Self {
            order_id: order_id.to_string(),
            status: ReservationStatus::None,
            items: BTreeMap::new(),
        }
    }

    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    /// Total units held while the reservation is open.
    pub fn reserved_units(&self) -> u32 {
        match self.status {
            ReservationStatus::Submitted => self.items.values().sum(),
            _ => 0,
        }
    }
}

impl Aggregate for Reservation {
    type Command = ReservationCommand;
    type Event = ReservationEvent;

    fn apply(&mut self, event: &ReservationEvent) {
        match event {
            ReservationEvent::ReservationSubmitted {
                reservation_items, ..
            } => {
                self.items = reservation_items.clone();
                self.status = ReservationStatus::Submitted;
            }
            ReservationEvent::ReservationCompleted { .. } => self.status = ReservationStatus::Completed,
            ReservationEvent::ReservationCancelled { .. } => self.status = ReservationStatus::Cancelled,
        }
    }

    fn handle(&self, command: &ReservationCommand) -> DomainResult<Vec<ReservationEvent>> {
        match command {
            ReservationCommand::SubmitReservation {
                reservation_items, ..
            } => self.handle_submit(reservation_items),
            ReservationCommand::CompleteReservation { .. } => self.handle_complete(),
            ReservationCommand::CancelReservation { .. } => self.handle_cancel(),
        }
    }
}

impl Reservation {
    fn handle_submit(&self, items: &BTreeMap<String, u32>) -> DomainResult<Vec<ReservationEvent>> {
        if self.status != ReservationStatus::None {
            return Err(DomainError::conflict(format!(
                "reservation for order {} already exists",
                self.order_id
            )));
        }
        if items.is_empty() || items.values().any(|q| *q == 0) {
            return Err(DomainError::validation("reservation needs at least one item with a positive quantity"));
        }
        Ok(vec![ReservationEvent::ReservationSubmitted {
            order_id: self.order_id.clone(),
            reservation_items: items.clone(),
        }])
    }

    fn handle_complete(&self) -> DomainResult<Vec<ReservationEvent>> {
        match self.status {
            ReservationStatus::Submitted => Ok(vec![ReservationEvent::ReservationCompleted {
                order_id: self.order_id.clone(),
            }]),
            ReservationStatus::Completed => Ok(vec![]),
            ReservationStatus::None => Err(DomainError::not_found(format!(
                "no reservation for order {}",
                self.order_id
            ))),
            ReservationStatus::Cancelled => Err(DomainError::invariant(format!(
                "reservation for order {} was cancelled",
                self.order_id
            ))),
        }
    }

    /// Cancelling an order that never reserved anything is fine.
    fn handle_cancel(&self) -> DomainResult<Vec<ReservationEvent>> {
        match self.status {
            ReservationStatus::Submitted => Ok(vec![ReservationEvent::ReservationCancelled {
                order_id: self.order_id.clone(),
            }]),
            ReservationStatus::None | ReservationStatus::Cancelled => Ok(vec![]),
            ReservationStatus::Completed => Err(DomainError::invariant(format!(
                "reservation for order {} is already completed",
                self.order_id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn submit(items: &[(&str, u32)]) -> ReservationCommand {
        ReservationCommand::SubmitReservation {
            order_id: "O1".to_string(),
            reservation_items: items.iter().map(|(p, q)| (p.to_string(), *q)).collect(),
        }
    }

    fn complete() -> ReservationCommand {
        ReservationCommand::CompleteReservation {
            order_id: "O1".to_string(),
        }
    }

    fn cancel() -> ReservationCommand {
        ReservationCommand::CancelReservation {
            order_id: "O1".to_string(),
        }
    }

    #[test]
    fn submitted_reservation_holds_units() {
        let mut r = Reservation::new("O1");
        for e in r.handle(&submit(&[("P1", 2), ("P2", 3)])).unwrap() {
            r.apply(&e);
        }
        assert_eq!(r.reserved_units(), 5);
        assert!(r.handle(&submit(&[("P1", 1)])).is_err());
    }

    #[test]
    fn cancelling_without_a_reservation_is_a_no_op() {
        assert!(Reservation::new("O1").handle(&cancel()).unwrap().is_empty());
    }

    #[test]
    fn completing_without_a_reservation_is_not_found() {
        let err = Reservation::new("O1").handle(&complete()).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    proptest! {
        #[test]
        fn completion_and_cancellation_are_mutually_exclusive(ops in prop::collection::vec(any::<bool>(), 1..12)) {
            let mut r = Reservation::new("O1");
            for e in r.handle(&submit(&[("P1", 1)])).unwrap() {
                r.apply(&e);
            }

            let mut ended = Vec::new();
            for complete_it in ops {
                let cmd = if complete_it { complete() } else { cancel() };
                if let Ok(events) = r.handle(&cmd) {
                    for e in &events {
                        r.apply(e);
                        ended.push(e.event_type());
                    }
                }
            }

            prop_assert_eq!(ended.len(), 1);
            prop_assert_eq!(r.reserved_units(), 0);
        }
    }
}
