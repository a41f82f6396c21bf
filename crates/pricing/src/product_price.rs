use ecommerce_core::{Aggregate, DomainResult, Money};

use crate::PricingEvent;

/// Stream category of product price streams.
pub const PRODUCT_PRICE_CATEGORY: &str = "Pricing::Product";

/// Aggregate root: the list price of one product.
///
/// Its only command is the new price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductPrice {
    product_id: String,
    price: Option<Money>,
}

impl ProductPrice {
    pub fn new(product_id: &str) -> Self {
        Self {
            product_id: product_id.to_string(),
            price: None,
        }
    }

    pub fn price(&self) -> Option<Money> {
        self.price
    }
}

impl Aggregate for ProductPrice {
    type Command = Money;
    type Event = PricingEvent;

    fn apply(&mut self, event: &PricingEvent) {
        if let PricingEvent::PriceSet { price, .. } = event {
            self.price = Some(*price);
        }
    }

    fn handle(&self, price: &Money) -> DomainResult<Vec<PricingEvent>> {
        if self.price == Some(*price) {
            return Ok(vec![]);
        }
        Ok(vec![PricingEvent::PriceSet {
            product_id: self.product_id.clone(),
            price: *price,
        }])
    }
}
