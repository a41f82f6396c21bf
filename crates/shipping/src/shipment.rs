use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ecommerce_core::{Aggregate, DomainError, DomainResult, ValueObject};
use ecommerce_events::{DomainCommand, DomainEvent};

/// Stream category of shipment streams (one shipment per order).
pub const SHIPMENT_CATEGORY: &str = "Shipping::Shipment";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalAddress {
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl ValueObject for PostalAddress {}

impl PostalAddress {
    fn validate(&self) -> DomainResult<()> {
        let fields = [
            ("street", &self.street),
            ("city", &self.city),
            ("postal_code", &self.postal_code),
            ("country", &self.country),
        ];
        match fields.iter().find(|(_, v)| v.trim().is_empty()) {
            Some((name, _)) => Err(DomainError::validation(format!("{name} cannot be empty"))),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShipmentStatus {
    Open,
    Submitted,
    Authorized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command_type", content = "params")]
pub enum ShipmentCommand {
    AddItemToShipmentPickingList { order_id: String, product_id: String },
    RemoveItemFromShipmentPickingList { order_id: String, product_id: String },
    AddShippingAddressToShipment { order_id: String, postal_address: PostalAddress },
    SubmitShipment { order_id: String },
    /// Release the shipment for dispatch.
    AuthorizeShipment { order_id: String },
}

impl DomainCommand for ShipmentCommand {
    const COMMAND_TYPES: &'static [&'static str] = &[
        "AddItemToShipmentPickingList",
        "RemoveItemFromShipmentPickingList",
        "AddShippingAddressToShipment",
        "SubmitShipment",
        "AuthorizeShipment",
    ];

    fn target_id(&self) -> &str {
        match self {
            ShipmentCommand::AddItemToShipmentPickingList { order_id, .. }
            | ShipmentCommand::RemoveItemFromShipmentPickingList { order_id, .. }
            | ShipmentCommand::AddShippingAddressToShipment { order_id, .. }
            | ShipmentCommand::SubmitShipment { order_id }
            | ShipmentCommand::AuthorizeShipment { order_id } => order_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", content = "data")]
pub enum ShipmentEvent {
    ItemAddedToShipmentPickingList {
        order_id: String,
        product_id: String,
    },
    ItemRemovedFromShipmentPickingList {
        order_id: String,
        product_id: String,
    },
    ShippingAddressAddedToShipment {
        order_id: String,
        postal_address: PostalAddress,
    },
    ShipmentSubmitted {
        order_id: String,
        /// product id → quantity
        picking_list: BTreeMap<String, u32>,
        postal_address: PostalAddress,
    },
    ShipmentAuthorized {
        order_id: String,
    },
}

impl DomainEvent for ShipmentEvent {
    const EVENT_TYPES: &'static [&'static str] = &[
        "ItemAddedToShipmentPickingList",
        "ItemRemovedFromShipmentPickingList",
        "ShippingAddressAddedToShipment",
        "ShipmentSubmitted",
        "ShipmentAuthorized",
    ];

    fn event_type(&self) -> &'static str {
        match self {
            ShipmentEvent::ItemAddedToShipmentPickingList { .. } => "ItemAddedToShipmentPickingList",
            ShipmentEvent::ItemRemovedFromShipmentPickingList { .. } => "ItemRemovedFromShipmentPickingList",
            ShipmentEvent::ShippingAddressAddedToShipment { .. } => "ShippingAddressAddedToShipment",
            ShipmentEvent::ShipmentSubmitted { .. } => "ShipmentSubmitted",
            ShipmentEvent::ShipmentAuthorized { .. } => "ShipmentAuthorized",
        }
    }
}

/// Aggregate root: Shipment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shipment {
    order_id: String,
    status: ShipmentStatus,
    picking_list: BTreeMap<String, u32>,
    address: Option<PostalAddress>,
}

impl Shipment {
    pub fn new(order_id: &str) -> Self {
        Self {
            order_id: order_id.to_string(),
            status: ShipmentStatus::Open,
            picking_list: BTreeMap::new(),
            address: None,
        }
    }

    pub fn status(&self) -> ShipmentStatus {
        self.status
    }

    pub fn picking_list(&self) -> &BTreeMap<String, u32> {
        &self.picking_list
    }

    pub fn address(&self) -> Option<&PostalAddress> {
        self.address.as_ref()
    }
}

impl Aggregate for Shipment {
    type Command = ShipmentCommand;
    type Event = ShipmentEvent;

    fn apply(&mut self, event: &ShipmentEvent) {
        match event {
            ShipmentEvent::ItemAddedToShipmentPickingList { product_id, .. } => {
                *self.picking_list.entry(product_id.clone()).or_default() += 1;
            }
            ShipmentEvent::ItemRemovedFromShipmentPickingList { product_id, .. } => {
                if let Some(q) = self.picking_list.get_mut(product_id) {
                    *q -= 1;
                    if *q == 0 {
                        self.picking_list.remove(product_id);
                    }
                }
            }
            ShipmentEvent::ShippingAddressAddedToShipment { postal_address, .. } => {
                self.address = Some(postal_address.clone());
            }
            ShipmentEvent::ShipmentSubmitted { .. } => self.status = ShipmentStatus::Submitted,
            ShipmentEvent::ShipmentAuthorized { .. } => self.status = ShipmentStatus::Authorized,
        }
    }

    fn handle(&self, command: &ShipmentCommand) -> DomainResult<Vec<ShipmentEvent>> {
        match command {
            ShipmentCommand::AddItemToShipmentPickingList { product_id, .. } => {
                self.ensure_open()?;
                Ok(vec![ShipmentEvent::ItemAddedToShipmentPickingList {
                    order_id: self.order_id.clone(),
                    product_id: product_id.clone(),
                }])
            }
            ShipmentCommand::RemoveItemFromShipmentPickingList { product_id, .. } => {
                self.handle_remove_item(product_id)
            }
            ShipmentCommand::AddShippingAddressToShipment { postal_address, .. } => {
                self.ensure_open()?;
                postal_address.validate()?;
                Ok(vec![ShipmentEvent::ShippingAddressAddedToShipment {
                    order_id: self.order_id.clone(),
                    postal_address: postal_address.clone(),
                }])
            }
            ShipmentCommand::SubmitShipment { .. } => self.handle_submit(),
            ShipmentCommand::AuthorizeShipment { .. } => self.handle_authorize(),
        }
    }
}

impl Shipment {
    fn ensure_open(&self) -> DomainResult<()> {
        if self.status != ShipmentStatus::Open {
            return Err(DomainError::invariant(format!(
                "shipment {} is {:?} and can no longer be changed",
                self.order_id, self.status
            )));
        }
        Ok(())
    }

    fn handle_remove_item(&self, product_id: &str) -> DomainResult<Vec<ShipmentEvent>> {
        self.ensure_open()?;
        if !self.picking_list.contains_key(product_id) {
            return Err(DomainError::not_found(format!(
                "product {product_id} is not on the picking list of {}",
                self.order_id
            )));
        }
        Ok(vec![ShipmentEvent::ItemRemovedFromShipmentPickingList {
            order_id: self.order_id.clone(),
            product_id: product_id.to_string(),
        }])
    }

    fn handle_submit(&self) -> DomainResult<Vec<ShipmentEvent>> {
        self.ensure_open()?;
        let Some(address) = &self.address else {
            return Err(DomainError::invariant(format!(
                "shipment {} has no postal address",
                self.order_id
            )));
        };
        if self.picking_list.is_empty() {
            return Err(DomainError::validation(format!(
                "picking list of shipment {} is empty",
                self.order_id
            )));
        }
        Ok(vec![ShipmentEvent::ShipmentSubmitted {
            order_id: self.order_id.clone(),
            picking_list: self.picking_list.clone(),
            postal_address: address.clone(),
        }])
    }

    fn handle_authorize(&self) -> DomainResult<Vec<ShipmentEvent>> {
        match self.status {
            ShipmentStatus::Submitted => Ok(vec![ShipmentEvent::ShipmentAuthorized {
                order_id: self.order_id.clone(),
            }]),
            ShipmentStatus::Authorized => Ok(vec![]),
            ShipmentStatus::Open => Err(DomainError::invariant(format!(
                "shipment {} must be submitted before it is authorized",
                self.order_id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> PostalAddress {
        PostalAddress {
            street: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            postal_code: "12345".to_string(),
            country: "US".to_string(),
        }
    }

    fn execute(s: &mut Shipment, command: ShipmentCommand) -> DomainResult<Vec<ShipmentEvent>> {
        let events = s.handle(&command)?;
        for e in &events {
            s.apply(e);
        }
        Ok(events)
    }

    fn add_item(s: &mut Shipment, product_id: &str) {
        execute(
            s,
            ShipmentCommand::AddItemToShipmentPickingList {
                order_id: "O1".to_string(),
                product_id: product_id.to_string(),
            },
        )
        .unwrap();
    }

    fn submit() -> ShipmentCommand {
        ShipmentCommand::SubmitShipment {
            order_id: "O1".to_string(),
        }
    }

    #[test]
    fn submission_requires_an_address() {
        let mut s = Shipment::new("O1");
        add_item(&mut s, "P1");

        assert!(matches!(
            s.handle(&submit()),
            Err(DomainError::InvariantViolation(_))
        ));

        execute(
            &mut s,
            ShipmentCommand::AddShippingAddressToShipment {
                order_id: "O1".to_string(),
                postal_address: address(),
            },
        )
        .unwrap();
        let events = execute(&mut s, submit()).unwrap();
        assert!(matches!(
            &events[0],
            ShipmentEvent::ShipmentSubmitted { picking_list, .. } if picking_list.get("P1") == Some(&1)
        ));
    }

    #[test]
    fn authorization_requires_submission_and_happens_once() {
        let mut s = Shipment::new("O1");
        let authorize = || ShipmentCommand::AuthorizeShipment {
            order_id: "O1".to_string(),
        };
        assert!(s.handle(&authorize()).is_err());

        add_item(&mut s, "P1");
        execute(
            &mut s,
            ShipmentCommand::AddShippingAddressToShipment {
                order_id: "O1".to_string(),
                postal_address: address(),
            },
        )
        .unwrap();
        execute(&mut s, submit()).unwrap();

        assert_eq!(execute(&mut s, authorize()).unwrap().len(), 1);
        assert!(execute(&mut s, authorize()).unwrap().is_empty());
        assert_eq!(s.status(), ShipmentStatus::Authorized);
    }

    #[test]
    fn blank_address_fields_are_rejected() {
        let mut blank = address();
        blank.city = "  ".to_string();
        let err = Shipment::new("O1")
            .handle(&ShipmentCommand::AddShippingAddressToShipment {
                order_id: "O1".to_string(),
                postal_address: blank,
            })
            .unwrap_err();
        assert_eq!(err, DomainError::validation("city cannot be empty"));
    }
}
