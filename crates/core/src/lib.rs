//! `ecommerce-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by every bounded
//! context (no infrastructure concerns, no knowledge of the event log).

pub mod aggregate;
pub mod error;
pub mod id;
pub mod value_object;

pub use aggregate::{Aggregate, ExpectedVersion};
pub use error::{DomainError, DomainResult};
pub use id::EventId;
pub use value_object::{Money, ValueObject};
