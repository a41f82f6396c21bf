//! Composition root of the shop: wires the bounded contexts, adapters and
//! process managers into one registry.

pub mod collaborators;
pub mod config;
pub mod configuration;


pub use collaborators::{ApprovingGateway, SequentialNumberGenerator};
pub use config::RuntimeConfig;
pub use configuration::{Configuration, EventLinker, Shop, configure};
