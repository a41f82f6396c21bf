//! Shipment process.
//!
//! Joins the ordering and shipping contexts for one order:
//! - order submitted and an address known → `SubmitShipment`
//! - order paid and shipment submitted → `AuthorizeShipment` (closes)
//!
//! Events from the two contexts may arrive in any relative order.

use ecommerce_events::{Command, ProcessManager, ProcessState, Reaction};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ShipmentMilestone {
    ShippingAddressAddedToShipment,
    ShipmentSubmitted,
    OrderSubmitted,
    OrderPaid,
}

pub const SUBMIT: &str = "submit_shipment";
pub const AUTHORIZE: &str = "authorize_shipment";

#[derive(Debug, Default, Clone, Copy)]
pub struct ShipmentProcess;

impl ProcessManager for ShipmentProcess {
    type Milestone = ShipmentMilestone;

    fn name(&self) -> &'static str {
        "ShipmentProcess"
    }

    fn event_types(&self) -> &'static [&'static str] {
        &[
            "ShippingAddressAddedToShipment",
            "ShipmentSubmitted",
            "OrderSubmitted",
            "OrderPaid",
        ]
    }

    fn milestone(&self, event_type: &str) -> Option<ShipmentMilestone> {
        use ShipmentMilestone::*;
        match event_type {
            "ShippingAddressAddedToShipment" => Some(ShippingAddressAddedToShipment),
            "ShipmentSubmitted" => Some(ShipmentSubmitted),
            "OrderSubmitted" => Some(OrderSubmitted),
            "OrderPaid" => Some(OrderPaid),
            _ => None,
        }
    }

    fn react(&self, state: &ProcessState<ShipmentMilestone>, order_id: &str) -> Vec<Reaction> {
        use ShipmentMilestone::*;
        let mut reactions = Vec::new();
        if state.has_all(&[OrderSubmitted, ShippingAddressAddedToShipment]) && !state.has(ShipmentSubmitted) {
            let command = Command::new("SubmitShipment").param("order_id", order_id);
            reactions.push(Reaction::new(SUBMIT, command).confirmed_by(&["ShipmentSubmitted"]));
        }
        if state.has_all(&[OrderPaid, ShipmentSubmitted]) {
            let command = Command::new("AuthorizeShipment").param("order_id", order_id);
            reactions.push(
                Reaction::new(AUTHORIZE, command)
                    .completing()
                    .confirmed_by(&["ShipmentAuthorized"]),
            );
        }
        reactions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ProcessRunner;
    use crate::testing::{RecordingSink, event};
    use ecommerce_events::EventHandler;
    use proptest::prelude::*;
    use serde_json::json;
    use std::sync::Arc;

    fn deliver(sequence: &[&str]) -> Vec<String> {
        let sink = Arc::new(RecordingSink::default());
        let runner = ProcessRunner::new(ShipmentProcess, sink.clone());
        for event_type in sequence {
            runner
                .handle(&event(event_type, json!({ "order_id": "O1" })))
                .unwrap();
        }
        sink.command_types()
    }

    #[test]
    fn submits_once_order_and_address_are_known() {
        assert_eq!(
            deliver(&["ShippingAddressAddedToShipment", "OrderSubmitted"]),
            vec!["SubmitShipment"]
        );
        assert_eq!(
            deliver(&["OrderSubmitted", "ShippingAddressAddedToShipment"]),
            vec!["SubmitShipment"]
        );
    }

    #[test]
    fn authorizes_after_payment_and_submission_in_either_order() {
        assert_eq!(
            deliver(&["OrderPaid", "ShipmentSubmitted"]),
            vec!["AuthorizeShipment"]
        );
        assert_eq!(
            deliver(&["ShipmentSubmitted", "OrderPaid"]),
            vec!["AuthorizeShipment"]
        );
    }

    #[test]
    fn failed_submission_is_retried_after_replay_as_well_as_live() {
        let history = vec![
            event("OrderSubmitted", json!({ "order_id": "O1" })),
            event("ShippingAddressAddedToShipment", json!({ "order_id": "O1" })),
        ];
        let live_sink = Arc::new(RecordingSink::failing_first(1));
        let live = ProcessRunner::new(ShipmentProcess, live_sink.clone());
        live.handle(&history[0]).unwrap();
        assert!(live.handle(&history[1]).is_err());

        let replay_sink = Arc::new(RecordingSink::default());
        let replayed = ProcessRunner::new(ShipmentProcess, replay_sink.clone());
        replayed.replay(&history).unwrap();

        assert_eq!(replayed.state("O1"), live.state("O1"));
        live.handle(&history[1]).unwrap();
        replayed.handle(&history[1]).unwrap();
        assert_eq!(live_sink.command_types(), vec!["SubmitShipment"]);
        assert_eq!(replay_sink.command_types(), vec!["SubmitShipment"]);
    }

    #[test]
    fn replay_of_a_completed_shipment_stays_silent() {
        let history: Vec<_> = [
            "OrderSubmitted",
            "ShippingAddressAddedToShipment",
            "ShipmentSubmitted",
            "OrderPaid",
            "ShipmentAuthorized",
        ]
        .into_iter()
        .map(|t| event(t, json!({ "order_id": "O1" })))
        .collect();
        let sink = Arc::new(RecordingSink::default());
        let runner = ProcessRunner::new(ShipmentProcess, sink.clone());

        runner.replay(&history).unwrap();
        for e in &history {
            runner.handle(e).unwrap();
        }

        assert!(runner.state("O1").unwrap().is_completed());
        assert!(sink.commands().is_empty());
    }

    #[test]
    fn payment_alone_authorizes_nothing() {
        assert_eq!(
            deliver(&["OrderSubmitted", "OrderPaid", "ShippingAddressAddedToShipment"]),
            vec!["SubmitShipment"]
        );
    }

    #[test]
    fn a_shipment_submitted_elsewhere_is_not_submitted_again() {
        assert_eq!(
            deliver(&["ShipmentSubmitted", "OrderSubmitted", "ShippingAddressAddedToShipment"]),
            Vec::<String>::new()
        );
    }

    proptest! {
        #[test]
        fn authorizes_exactly_once_whatever_the_arrival_order(
            seq in Just(vec!["OrderPaid", "ShipmentSubmitted"]).prop_shuffle(),
            redeliveries in prop::collection::vec(0usize..2, 0..4),
        ) {
            let mut seq = seq;
            for src in redeliveries {
                let e = seq[src];
                seq.push(e);
            }
            prop_assert_eq!(deliver(&seq), vec!["AuthorizeShipment".to_string()]);
        }
    }
}
