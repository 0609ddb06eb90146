//! Shared types and stock logic for the print shop back office
//!
//! This crate contains the models and the pure stock arithmetic shared
//! between the backend and the admin UI (via WASM).

pub mod consumption;
pub mod ledger;
pub mod models;
pub mod receiving;
pub mod types;
pub mod validation;

pub use consumption::*;
pub use ledger::*;
pub use models::*;
pub use receiving::*;
pub use types::*;
pub use validation::*;
