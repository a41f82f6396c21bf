//! Shipping bounded context (event-sourced).
//!
//! A shipment collects a picking list and a postal address while the order is
//! being assembled, is submitted once the order is, and is authorized for
//! dispatch once the order is paid.

pub mod context;
pub mod shipment;

pub use context::ShippingContext;
pub use shipment::{
    PostalAddress, SHIPMENT_CATEGORY, Shipment, ShipmentCommand, ShipmentEvent, ShipmentStatus,
};
