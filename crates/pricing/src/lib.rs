//! Pricing bounded context (event-sourced).
//!
//! Two aggregates:
//! - `ProductPrice` (one stream per product): the current list price
//! - `PriceList` (one stream per order): priced items, discount and the
//!   calculated total
//!
//! Order-level commands read the product price from its own stream and hand
//! it to the price list as an internal command.

pub mod context;
pub mod price_list;
pub mod product_price;

pub use context::{PricingContext, PricingHandler};
pub use price_list::{PRICE_LIST_CATEGORY, PriceList, PriceListCommand};
pub use product_price::{PRODUCT_PRICE_CATEGORY, ProductPrice};

use serde::{Deserialize, Serialize};

use ecommerce_core::Money;
use ecommerce_events::{DomainCommand, DomainEvent};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command_type", content = "params")]
pub enum PricingCommand {
    SetPrice { product_id: String, price: Money },
    AddPriceItem { order_id: String, product_id: String },
    RemovePriceItem { order_id: String, product_id: String },
    SetPercentageDiscount { order_id: String, percentage: u8 },
    CalculateTotalValue { order_id: String },
}

impl DomainCommand for PricingCommand {
    const COMMAND_TYPES: &'static [&'static str] = &[
        "SetPrice",
        "AddPriceItem",
        "RemovePriceItem",
        "SetPercentageDiscount",
        "CalculateTotalValue",
    ];

    fn target_id(&self) -> &str {
        match self {
            PricingCommand::SetPrice { product_id, .. } => product_id,
            PricingCommand::AddPriceItem { order_id, .. }
            | PricingCommand::RemovePriceItem { order_id, .. }
            | PricingCommand::SetPercentageDiscount { order_id, .. }
            | PricingCommand::CalculateTotalValue { order_id } => order_id,
        }
    }
}

/// Amounts are carried as decimal strings (e.g. `"19.99"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", content = "data")]
pub enum PricingEvent {
    PriceSet {
        product_id: String,
        price: Money,
    },
    PriceItemAdded {
        order_id: String,
        product_id: String,
        unit_price: Money,
    },
    PriceItemRemoved {
        order_id: String,
        product_id: String,
        unit_price: Money,
    },
    PercentageDiscountSet {
        order_id: String,
        percentage: u8,
    },
    OrderTotalValueCalculated {
        order_id: String,
        amount: Money,
        discounted_amount: Money,
    },
}

impl DomainEvent for PricingEvent {
    const EVENT_TYPES: &'static [&'static str] = &[
        "PriceSet",
        "PriceItemAdded",
        "PriceItemRemoved",
        "PercentageDiscountSet",
        "OrderTotalValueCalculated",
    ];

    fn event_type(&self) -> &'static str {
        match self {
            PricingEvent::PriceSet { .. } => "PriceSet",
            PricingEvent::PriceItemAdded { .. } => "PriceItemAdded",
            PricingEvent::PriceItemRemoved { .. } => "PriceItemRemoved",
            PricingEvent::PercentageDiscountSet { .. } => "PercentageDiscountSet",
            PricingEvent::OrderTotalValueCalculated { .. } => "OrderTotalValueCalculated",
        }
    }
}
