//! Ordering bounded context (event-sourced).
//!
//! Owns the shopping basket and the order lifecycle. Business rules are kept
//! to what the choreography relies on: a submitted order cannot be modified,
//! and an order is paid, expired or cancelled at most once.

pub mod context;
pub mod number_generator;
pub mod order;

pub use context::OrderingContext;
pub use number_generator::NumberGenerator;
pub use order::{ORDER_CATEGORY, Order, OrderCommand, OrderEvent, OrderStatus};
