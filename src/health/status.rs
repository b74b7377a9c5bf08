// src/health/status.rs
use hyper::StatusCode;

/// Result of a single health probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The backend answered with a 2xx status.
    Healthy(StatusCode),
    /// The backend answered, but not with a 2xx status.
    Unhealthy(StatusCode),
    /// Connection failure, protocol error or timeout.
    Unreachable(String),
}

impl ProbeOutcome {
    pub fn from_status(status: StatusCode) -> Self {
        if is_healthy_status(status) {
            ProbeOutcome::Healthy(status)
        } else {
            ProbeOutcome::Unhealthy(status)
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, ProbeOutcome::Healthy(_))
    }
}

/// Only `[200, 300)` counts as healthy; redirects do not.
pub fn is_healthy_status(status: StatusCode) -> bool {
    (200..300).contains(&status.as_u16())
}
