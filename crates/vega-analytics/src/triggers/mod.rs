//! Statistical alert triggers.
//!
//! A stateless rule layer: two snapshots plus a [`StatisticalAlertConfig`]
//! in, a list of [`StatisticalTrigger`]s out. Delivery (notifications,
//! sounds, logs) is the caller's concern.

pub mod config;
pub mod evaluator;
pub mod types;

pub use config::StatisticalAlertConfig;
pub use evaluator::evaluate_triggers;
pub use types::{StatisticalTrigger, TriggerSeverity, TriggerType};
