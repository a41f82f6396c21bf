//! Inventory bounded context (event-sourced).
//!
//! Holds stock reservations for submitted orders. A reservation ends either
//! completed (order paid) or cancelled (order cancelled or expired).

pub mod context;
pub mod reservation;

pub use context::InventoryContext;
pub use reservation::{
    RESERVATION_CATEGORY, Reservation, ReservationCommand, ReservationEvent, ReservationStatus,
};
