//! API routes

pub mod crop;
pub mod disease;
pub mod health;
pub mod pest;
pub mod recommendations;
pub mod rice;
pub mod status;
