use std::sync::Arc;

use ecommerce_core::{DomainError, Money};
use ecommerce_events::{
    AggregateHandler, BoundedContext, ChoreographyError, Command, CommandHandler, Cqrs, DomainCommand,
    DomainEvent, EventStore, UncommittedEvent,
};

use crate::price_list::{PRICE_LIST_CATEGORY, PriceList, PriceListCommand};
use crate::product_price::{PRODUCT_PRICE_CATEGORY, ProductPrice};
use crate::{PricingCommand, PricingEvent};

type Factory<A> = fn(&str) -> A;

/// Single command handler for every pricing command.
pub struct PricingHandler {
    products: AggregateHandler<ProductPrice, Factory<ProductPrice>>,
    price_lists: AggregateHandler<PriceList, Factory<PriceList>>,
}

impl PricingHandler {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            products: AggregateHandler::new(
                store.clone(),
                PRODUCT_PRICE_CATEGORY,
                ProductPrice::new as Factory<ProductPrice>,
            ),
            price_lists: AggregateHandler::new(
                store,
                PRICE_LIST_CATEGORY,
                PriceList::new as Factory<PriceList>,
            ),
        }
    }

    fn unit_price(&self, command_type: &str, product_id: &str) -> Result<Money, ChoreographyError> {
        let (product, _) = self.products.load(product_id)?;
        product.price().ok_or_else(|| {
            ChoreographyError::handler_failure(
                command_type,
                DomainError::not_found(format!("no price set for product {product_id}")),
            )
        })
    }
}

impl CommandHandler for PricingHandler {
    fn handle(&self, command: &Command) -> Result<Vec<UncommittedEvent>, ChoreographyError> {
        let command_type = command.command_type();
        match command.decode::<PricingCommand>()? {
            PricingCommand::SetPrice { product_id, price } => {
                self.products.execute(&product_id, command_type, &price)
            }
            PricingCommand::AddPriceItem {
                order_id,
                product_id,
            } => {
                let unit_price = self.unit_price(command_type, &product_id)?;
                self.price_lists.execute(
                    &order_id,
                    command_type,
                    &PriceListCommand::AddItem {
                        product_id,
                        unit_price,
                    },
                )
            }
            PricingCommand::RemovePriceItem {
                order_id,
                product_id,
            } => self.price_lists.execute(
                &order_id,
                command_type,
                &PriceListCommand::RemoveItem { product_id },
            ),
            PricingCommand::SetPercentageDiscount {
                order_id,
                percentage,
            } => self.price_lists.execute(
                &order_id,
                command_type,
                &PriceListCommand::SetDiscount { percentage },
            ),
            PricingCommand::CalculateTotalValue { order_id } => {
                self.price_lists
                    .execute(&order_id, command_type, &PriceListCommand::CalculateTotal)
            }
        }
    }
}

/// Wires the pricing command handlers into a registry.
#[derive(Debug, Default)]
pub struct PricingContext;

impl BoundedContext for PricingContext {
    fn name(&self) -> &'static str {
        "pricing"
    }

    fn configure(&self, cqrs: &Cqrs) -> Result<(), ChoreographyError> {
        cqrs.declare_events(PricingEvent::EVENT_TYPES)?;
        let handler = PricingHandler::new(cqrs.event_store());
        cqrs.register_commands(PricingCommand::COMMAND_TYPES, Arc::new(handler))
    }
}
