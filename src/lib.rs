// src/lib.rs
pub mod cli;
pub mod config;
pub mod health;
pub mod load_balancer;
pub mod proxy;
pub mod server;
pub mod telemetry;

pub use crate::config::Config;
pub use crate::load_balancer::LoadBalancer;
