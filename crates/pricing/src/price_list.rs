use ecommerce_core::{Aggregate, DomainError, DomainResult, Money};

use crate::PricingEvent;

/// Stream category of per-order price lists.
pub const PRICE_LIST_CATEGORY: &str = "Pricing::PriceList";

/// Internal commands of the price list (already enriched with unit prices).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceListCommand {
    AddItem { product_id: String, unit_price: Money },
    RemoveItem { product_id: String },
    SetDiscount { percentage: u8 },
    CalculateTotal,
}

/// Aggregate root: PriceList (one per order).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceList {
    order_id: String,
    /// (product id, unit price at the time the item was added)
    items: Vec<(String, Money)>,
    discount: u8,
}

impl PriceList {
    pub fn new(order_id: &str) -> Self {
        Self {
            order_id: order_id.to_string(),
            items: Vec::new(),
            discount: 0,
        }
    }

    pub fn total(&self) -> DomainResult<Money> {
        self.items.iter().try_fold(Money::ZERO, |acc, (_, price)| {
            acc.checked_add(*price)
                .ok_or_else(|| DomainError::invariant("order total overflows"))
        })
    }

    pub fn discount(&self) -> u8 {
        self.discount
    }
}

impl Aggregate for PriceList {
    type Command = PriceListCommand;
    type Event = PricingEvent;

    fn apply(&mut self, event: &PricingEvent) {
        match event {
            PricingEvent::PriceItemAdded {
                product_id,
                unit_price,
                ..
            } => self.items.push((product_id.clone(), *unit_price)),
            PricingEvent::PriceItemRemoved { product_id, .. } => {
                if let Some(pos) = self.items.iter().rposition(|(p, _)| p == product_id) {
                    self.items.remove(pos);
                }
            }
            PricingEvent::PercentageDiscountSet { percentage, .. } => self.discount = *percentage,
            PricingEvent::PriceSet { .. } | PricingEvent::OrderTotalValueCalculated { .. } => {}
        }
    }

    fn handle(&self, command: &PriceListCommand) -> DomainResult<Vec<PricingEvent>> {
        match command {
            PriceListCommand::AddItem {
                product_id,
                unit_price,
            } => Ok(vec![PricingEvent::PriceItemAdded {
                order_id: self.order_id.clone(),
                product_id: product_id.clone(),
                unit_price: *unit_price,
            }]),
            PriceListCommand::RemoveItem { product_id } => self.handle_remove(product_id),
            PriceListCommand::SetDiscount { percentage } => self.handle_discount(*percentage),
            PriceListCommand::CalculateTotal => self.handle_calculate(),
        }
    }
}

impl PriceList {
    fn handle_remove(&self, product_id: &str) -> DomainResult<Vec<PricingEvent>> {
        let Some((_, unit_price)) = self.items.iter().rev().find(|(p, _)| p == product_id) else {
            return Err(DomainError::not_found(format!(
                "product {product_id} is not priced for order {}",
                self.order_id
            )));
        };
        Ok(vec![PricingEvent::PriceItemRemoved {
            order_id: self.order_id.clone(),
            product_id: product_id.to_string(),
            unit_price: *unit_price,
        }])
    }

    fn handle_discount(&self, percentage: u8) -> DomainResult<Vec<PricingEvent>> {
        if percentage > 100 {
            return Err(DomainError::validation(format!(
                "discount must be between 0 and 100, got {percentage}"
            )));
        }
        Ok(vec![PricingEvent::PercentageDiscountSet {
            order_id: self.order_id.clone(),
            percentage,
        }])
    }

    fn handle_calculate(&self) -> DomainResult<Vec<PricingEvent>> {
        let amount = self.total()?;
        Ok(vec![PricingEvent::OrderTotalValueCalculated {
            order_id: self.order_id.clone(),
            amount,
            discounted_amount: amount.discounted_by(self.discount)?,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn execute(list: &mut PriceList, command: PriceListCommand) -> DomainResult<Vec<PricingEvent>> {
        let events = list.handle(&command)?;
        for e in &events {
            list.apply(e);
        }
        Ok(events)
    }

    fn add(product_id: &str, cents: u64) -> PriceListCommand {
        PriceListCommand::AddItem {
            product_id: product_id.to_string(),
            unit_price: Money::from_cents(cents),
        }
    }

    #[test]
    fn total_applies_the_discount() {
        let mut list = PriceList::new("O1");
        execute(&mut list, add("P1", 1500)).unwrap();
        execute(&mut list, add("P2", 721)).unwrap();
        execute(&mut list, PriceListCommand::SetDiscount { percentage: 10 }).unwrap();

        let events = execute(&mut list, PriceListCommand::CalculateTotal).unwrap();

        assert_eq!(
            events,
            vec![PricingEvent::OrderTotalValueCalculated {
                order_id: "O1".to_string(),
                amount: Money::from_cents(2221),
                discounted_amount: Money::from_cents(1999),
            }]
        );
    }

    #[test]
    fn discount_on_a_huge_total_is_computed_without_overflow() {
        let mut list = PriceList::new("O1");
        execute(&mut list, add("P1", 10_000_000_000_000_000_000)).unwrap();
        execute(&mut list, PriceListCommand::SetDiscount { percentage: 2 }).unwrap();

        let events = execute(&mut list, PriceListCommand::CalculateTotal).unwrap();

        assert!(matches!(
            &events[0],
            PricingEvent::OrderTotalValueCalculated { discounted_amount, .. }
                if *discounted_amount == Money::from_cents(9_800_000_000_000_000_000)
        ));
    }

    #[test]
    fn overflowing_total_is_an_invariant_violation() {
        let mut list = PriceList::new("O1");
        execute(&mut list, add("P1", u64::MAX)).unwrap();
        execute(&mut list, add("P2", 1)).unwrap();

        let err = list.handle(&PriceListCommand::CalculateTotal).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn removing_keeps_the_price_the_item_was_added_at() {
        let mut list = PriceList::new("O1");
        execute(&mut list, add("P1", 500)).unwrap();
        execute(&mut list, add("P1", 700)).unwrap();

        let events = execute(
            &mut list,
            PriceListCommand::RemoveItem {
                product_id: "P1".to_string(),
            },
        )
        .unwrap();

        assert!(matches!(
            &events[0],
            PricingEvent::PriceItemRemoved { unit_price, .. } if *unit_price == Money::from_cents(700)
        ));
        assert_eq!(list.total().unwrap(), Money::from_cents(500));
    }

    #[test]
    fn removing_an_unpriced_product_is_not_found() {
        let err = PriceList::new("O1")
            .handle(&PriceListCommand::RemoveItem {
                product_id: "P1".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
