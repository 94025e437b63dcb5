//! CLI command implementations

pub mod analyze;
pub mod cell;
pub mod config;
