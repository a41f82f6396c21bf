//! Payments bounded context (event-sourced).
//!
//! The only context that talks to the payment gateway. A payment moves
//! through amount set → authorized → captured, and its hold is either
//! released or cancelled exactly once.

pub mod context;
pub mod gateway;
pub mod payment;

pub use context::PaymentsContext;
pub use gateway::{PaymentDeclined, PaymentGateway};
pub use payment::{PAYMENT_CATEGORY, Payment, PaymentCommand, PaymentEvent, PaymentStatus};
