//! API endpoint handlers.

pub mod health;
pub mod samplers;
pub mod session;
