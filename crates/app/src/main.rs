use anyhow::Context;

use ecommerce_app::{RuntimeConfig, Shop};
use ecommerce_core::Money;
use ecommerce_crm::CustomerCommand;
use ecommerce_events::EventStore;
use ecommerce_ordering::OrderCommand;
use ecommerce_payments::PaymentCommand;
use ecommerce_pricing::PricingCommand;
use ecommerce_shipping::{PostalAddress, ShipmentCommand};

fn main() -> anyhow::Result<()> {
    ecommerce_observability::init();

    let config = RuntimeConfig::from_env().context("invalid runtime configuration")?;
    let shop = Shop::in_memory(&config).context("failed to wire the shop")?;
    let cqrs = &shop.cqrs;

    let order_id = "order-1".to_string();
    cqrs.run_typed(&CustomerCommand::RegisterCustomer {
        customer_id: "customer-1".to_string(),
        name: "Ada".to_string(),
    })?;
    cqrs.run_typed(&PricingCommand::SetPrice {
        product_id: "product-1".to_string(),
        price: "19.99".parse::<Money>()?,
    })?;
    cqrs.run_typed(&ShipmentCommand::AddShippingAddressToShipment {
        order_id: order_id.clone(),
        postal_address: PostalAddress {
            street: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            postal_code: "12345".to_string(),
            country: "US".to_string(),
        },
    })?;
    for _ in 0..2 {
        cqrs.run_typed(&OrderCommand::AddItemToBasket {
            order_id: order_id.clone(),
            product_id: "product-1".to_string(),
        })?;
    }
    cqrs.run_typed(&OrderCommand::SubmitOrder {
        order_id: order_id.clone(),
        customer_id: "customer-1".to_string(),
    })
    .context("order submission failed")?;
    cqrs.run_typed(&PaymentCommand::AuthorizePayment {
        order_id: order_id.clone(),
    })
    .context("payment authorization failed")?;

    let log = cqrs.event_store().read_all()?;
    for event in &log {
        tracing::info!(
            sequence_number = event.sequence_number(),
            event_type = event.event_type(),
            stream = event.stream(),
            "recorded"
        );
    }
    tracing::info!(events = log.len(), order_id = %order_id, "order workflow completed");
    Ok(())
}
