use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use ecommerce_core::{Aggregate, DomainError, DomainResult};
use ecommerce_events::{DomainCommand, DomainEvent};

use crate::number_generator::NumberGenerator;

/// Stream category of order streams (`Ordering::Order$<order_id>`).
pub const ORDER_CATEGORY: &str = "Ordering::Order";

/// Order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Draft,
    Submitted,
    Paid,
    Expired,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command_type", content = "params")]
pub enum OrderCommand {
    AddItemToBasket { order_id: String, product_id: String },
    RemoveItemFromBasket { order_id: String, product_id: String },
    SubmitOrder { order_id: String, customer_id: String },
    /// Payment for the order has been secured.
    ConfirmOrder { order_id: String },
    /// Raised by an external scheduler once the payment window closed.
    ExpireOrder { order_id: String },
    CancelOrder { order_id: String },
}

impl DomainCommand for OrderCommand {
    const COMMAND_TYPES: &'static [&'static str] = &[
        "AddItemToBasket",
        "RemoveItemFromBasket",
        "SubmitOrder",
        "ConfirmOrder",
        "ExpireOrder",
        "CancelOrder",
    ];

    fn target_id(&self) -> &str {
        match self {
            OrderCommand::AddItemToBasket { order_id, .. }
            | OrderCommand::RemoveItemFromBasket { order_id, .. }
            | OrderCommand::SubmitOrder { order_id, .. }
            | OrderCommand::ConfirmOrder { order_id }
            | OrderCommand::ExpireOrder { order_id }
            | OrderCommand::CancelOrder { order_id } => order_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", content = "data")]
pub enum OrderEvent {
    ItemAddedToBasket {
        order_id: String,
        product_id: String,
        /// Quantity of this product in the basket after the change.
        quantity: u32,
    },
    ItemRemovedFromBasket {
        order_id: String,
        product_id: String,
        quantity: u32,
    },
    OrderSubmitted {
        order_id: String,
        order_number: String,
        customer_id: String,
        /// product id → quantity
        order_lines: BTreeMap<String, u32>,
    },
    OrderPaid { order_id: String },
    OrderExpired { order_id: String },
    OrderCancelled { order_id: String },
}

impl DomainEvent for OrderEvent {
    const EVENT_TYPES: &'static [&'static str] = &[
        "ItemAddedToBasket",
        "ItemRemovedFromBasket",
        "OrderSubmitted",
        "OrderPaid",
        "OrderExpired",
        "OrderCancelled",
    ];

    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::ItemAddedToBasket { .. } => "ItemAddedToBasket",
            OrderEvent::ItemRemovedFromBasket { .. } => "ItemRemovedFromBasket",
            OrderEvent::OrderSubmitted { .. } => "OrderSubmitted",
            OrderEvent::OrderPaid { .. } => "OrderPaid",
            OrderEvent::OrderExpired { .. } => "OrderExpired",
            OrderEvent::OrderCancelled { .. } => "OrderCancelled",
        }
    }
}

/// Aggregate root: Order (basket until submitted).
pub struct Order {
    id: String,
    status: OrderStatus,
    lines: BTreeMap<String, u32>,
    order_number: Option<String>,
    numbers: Arc<dyn NumberGenerator>,
}

impl Order {
    /// Create an empty aggregate instance for rehydration.
    pub fn new(id: &str, numbers: Arc<dyn NumberGenerator>) -> Self {
        Self {
            id: id.to_string(),
            status: OrderStatus::Draft,
            lines: BTreeMap::new(),
            order_number: None,
            numbers,
        }
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn lines(&self) -> &BTreeMap<String, u32> {
        &self.lines
    }

    pub fn order_number(&self) -> Option<&str> {
        self.order_number.as_deref()
    }

    pub fn is_modifiable(&self) -> bool {
        matches!(self.status, OrderStatus::Draft)
    }
}

impl Aggregate for Order {
    type Command = OrderCommand;
    type Event = OrderEvent;

    fn apply(&mut self, event: &OrderEvent) {
        match event {
            OrderEvent::ItemAddedToBasket {
                product_id,
                quantity,
                ..
            }
            | OrderEvent::ItemRemovedFromBasket {
                product_id,
                quantity,
                ..
            } => {
                if *quantity == 0 {
                    self.lines.remove(product_id);
                } else {
                    self.lines.insert(product_id.clone(), *quantity);
                }
            }
            OrderEvent::OrderSubmitted { order_number, .. } => {
                self.order_number = Some(order_number.clone());
                self.status = OrderStatus::Submitted;
            }
            OrderEvent::OrderPaid { .. } => self.status = OrderStatus::Paid,
            OrderEvent::OrderExpired { .. } => self.status = OrderStatus::Expired,
            OrderEvent::OrderCancelled { .. } => self.status = OrderStatus::Cancelled,
        }
    }

    fn handle(&self, command: &OrderCommand) -> DomainResult<Vec<OrderEvent>> {
        match command {
            OrderCommand::AddItemToBasket { product_id, .. } => self.handle_add_item(product_id),
            OrderCommand::RemoveItemFromBasket { product_id, .. } => self.handle_remove_item(product_id),
            OrderCommand::SubmitOrder { customer_id, .. } => self.handle_submit(customer_id),
            OrderCommand::ConfirmOrder { .. } => self.handle_confirm(),
            OrderCommand::ExpireOrder { .. } => self.handle_expire(),
            OrderCommand::CancelOrder { .. } => self.handle_cancel(),
        }
    }
}

impl Order {
    fn ensure_modifiable(&self) -> DomainResult<()> {
        if !self.is_modifiable() {
            return Err(DomainError::invariant(format!(
                "order {} is {:?} and can no longer be modified",
                self.id, self.status
            )));
        }
        Ok(())
    }

    fn handle_add_item(&self, product_id: &str) -> DomainResult<Vec<OrderEvent>> {
        self.ensure_modifiable()?;
        if product_id.trim().is_empty() {
            return Err(DomainError::validation("product_id cannot be empty"));
        }
        let quantity = self.lines.get(product_id).copied().unwrap_or(0) + 1;
        Ok(vec![OrderEvent::ItemAddedToBasket {
            order_id: self.id.clone(),
            product_id: product_id.to_string(),
            quantity,
        }])
    }

    fn handle_remove_item(&self, product_id: &str) -> DomainResult<Vec<OrderEvent>> {
        self.ensure_modifiable()?;
        let Some(current) = self.lines.get(product_id) else {
            return Err(DomainError::not_found(format!(
                "product {product_id} is not in the basket of order {}",
                self.id
            )));
        };
        Ok(vec![OrderEvent::ItemRemovedFromBasket {
            order_id: self.id.clone(),
            product_id: product_id.to_string(),
            quantity: current - 1,
        }])
    }

    fn handle_submit(&self, customer_id: &str) -> DomainResult<Vec<OrderEvent>> {
        self.ensure_modifiable()?;
        if self.lines.is_empty() {
            return Err(DomainError::validation("cannot submit an empty basket"));
        }
        if customer_id.trim().is_empty() {
            return Err(DomainError::validation("customer_id cannot be empty"));
        }
        Ok(vec![OrderEvent::OrderSubmitted {
            order_id: self.id.clone(),
            order_number: self.numbers.next_order_number(),
            customer_id: customer_id.to_string(),
            order_lines: self.lines.clone(),
        }])
    }

    fn handle_confirm(&self) -> DomainResult<Vec<OrderEvent>> {
        match self.status {
            OrderStatus::Submitted => Ok(vec![OrderEvent::OrderPaid {
                order_id: self.id.clone(),
            }]),
            OrderStatus::Paid => Ok(vec![]),
            status => Err(DomainError::invariant(format!(
                "order {} cannot be paid while {status:?}",
                self.id
            ))),
        }
    }

    fn handle_expire(&self) -> DomainResult<Vec<OrderEvent>> {
        match self.status {
            OrderStatus::Submitted => Ok(vec![OrderEvent::OrderExpired {
                order_id: self.id.clone(),
            }]),
            OrderStatus::Expired => Ok(vec![]),
            status => Err(DomainError::invariant(format!(
                "order {} cannot expire while {status:?}",
                self.id
            ))),
        }
    }

    fn handle_cancel(&self) -> DomainResult<Vec<OrderEvent>> {
        match self.status {
            OrderStatus::Draft | OrderStatus::Submitted => Ok(vec![OrderEvent::OrderCancelled {
                order_id: self.id.clone(),
            }]),
            OrderStatus::Cancelled => Ok(vec![]),
            status => Err(DomainError::invariant(format!(
                "order {} cannot be cancelled while {status:?}",
                self.id
            ))),
        }
    }
}
