//! CLI command implementations.

pub mod common;
pub mod embed;
pub mod samplers;
pub mod simulate;
pub mod theory;
pub mod version;
