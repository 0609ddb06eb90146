//! HTTP handlers

mod health;
mod production;
mod purchase_order;
mod stock;

pub use health::*;
pub use production::*;
pub use purchase_order::*;
pub use stock::*;
