// src/health/mod.rs
mod checker;
mod status;

pub use checker::HealthMonitor;
pub use status::{is_healthy_status, ProbeOutcome};
