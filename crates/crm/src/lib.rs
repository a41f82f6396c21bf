//! CRM bounded context (event-sourced).

pub mod context;
pub mod customer;

pub use context::CrmContext;
pub use customer::{CUSTOMER_CATEGORY, Customer, CustomerCommand, CustomerEvent};
