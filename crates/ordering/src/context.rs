use std::sync::Arc;

use ecommerce_events::{
    AggregateHandler, BoundedContext, ChoreographyError, Cqrs, DomainCommand, DomainEvent,
};

use crate::number_generator::NumberGenerator;
use crate::order::{ORDER_CATEGORY, Order, OrderCommand, OrderEvent};

/// Wires the ordering command handlers into a registry.
pub struct OrderingContext {
    numbers: Arc<dyn NumberGenerator>,
}

impl OrderingContext {
    pub fn new(numbers: Arc<dyn NumberGenerator>) -> Self {
        Self { numbers }
    }
}

impl BoundedContext for OrderingContext {
    fn name(&self) -> &'static str {
        "ordering"
    }

    fn configure(&self, cqrs: &Cqrs) -> Result<(), ChoreographyError> {
        cqrs.declare_events(OrderEvent::EVENT_TYPES)?;

        let numbers = self.numbers.clone();
        let handler = AggregateHandler::new(cqrs.event_store(), ORDER_CATEGORY, move |id: &str| {
            Order::new(id, numbers.clone())
        });
        cqrs.register_commands(OrderCommand::COMMAND_TYPES, Arc::new(handler))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecommerce_events::{Command, EventStore, stream_name};

    struct Counter(std::sync::atomic::AtomicU32);

    impl NumberGenerator for Counter {
        fn next_order_number(&self) -> String {
            let n = self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
            format!("ORD-{n}")
        }
    }

    fn wired() -> Cqrs {
        let cqrs = Cqrs::in_memory();
        OrderingContext::new(Arc::new(Counter(Default::default())))
            .configure(&cqrs)
            .unwrap();
        cqrs
    }

    #[test]
    fn commands_append_to_the_order_stream() {
        let cqrs = wired();
        cqrs.run(
            Command::new("AddItemToBasket")
                .param("order_id", "O1")
                .param("product_id", "P1"),
        )
        .unwrap();
        let submitted = cqrs
            .run(
                Command::new("SubmitOrder")
                    .param("order_id", "O1")
                    .param("customer_id", "C1"),
            )
            .unwrap();

        assert_eq!(submitted[0].event_type(), "OrderSubmitted");
        assert_eq!(submitted[0].require_str("order_number").unwrap(), "ORD-1");

        let stream = cqrs
            .event_store()
            .read_stream(&stream_name(ORDER_CATEGORY, "O1"))
            .unwrap();
        assert_eq!(stream.len(), 2);
    }

    #[test]
    fn registers_every_order_command_and_declares_every_event() {
        let cqrs = wired();
        for t in OrderCommand::COMMAND_TYPES {
            assert!(cqrs.dispatcher().is_registered(t), "{t} not registered");
        }
        for t in OrderEvent::EVENT_TYPES {
            assert!(cqrs.bus().is_known(t).unwrap(), "{t} not declared");
        }
    }
}
