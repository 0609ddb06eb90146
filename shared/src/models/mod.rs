//! Domain models for the print shop back office

mod production;
mod purchase_order;
mod stock;

pub use production::*;
pub use purchase_order::*;
pub use stock::*;
