//! Database models for the print shop back office
//!
//! Re-exports models from the shared crate and adds the row types sqlx
//! decodes into

mod rows;

pub use rows::*;
pub use shared::models::*;
