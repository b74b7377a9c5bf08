// src/proxy/backend.rs
use crate::health::ProbeOutcome;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("invalid backend URL {url:?}: {source}")]
    Parse {
        url: String,
        source: url::ParseError,
    },

    #[error("unsupported scheme {scheme:?} in backend URL {url:?}")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("backend URL {0:?} has no host")]
    MissingHost(String),
}

/// Parse and sanity-check a backend base URL.
pub fn parse_backend_url(raw: &str) -> Result<Url, BackendError> {
    let url = Url::parse(raw).map_err(|source| BackendError::Parse {
        url: raw.to_string(),
        source,
    })?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(BackendError::UnsupportedScheme {
                url: raw.to_string(),
                scheme: other.to_string(),
            })
        }
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(BackendError::MissingHost(raw.to_string()));
    }

    Ok(url)
}

/// One upstream server.
///
/// The address never changes after construction. The health flag is the only
/// mutable state and is shared between the selection path, the forwarding
/// path and the health monitor without any lock.
#[derive(Debug)]
pub struct Backend {
    pub id: String,
    pub url: Url,
    healthy: AtomicBool,
}

impl Backend {
    /// New backends start out healthy until a probe says otherwise.
    pub fn new(url: Url) -> Self {
        let id = format!(
            "{}:{}",
            url.host_str().unwrap_or("unknown"),
            url.port_or_known_default().unwrap_or(80)
        );

        Self {
            id,
            url,
            healthy: AtomicBool::new(true),
        }
    }

    pub fn parse(raw: &str) -> Result<Self, BackendError> {
        parse_backend_url(raw).map(Self::new)
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }

    /// Stores the new flag and returns the previous one.
    pub fn set_healthy(&self, healthy: bool) -> bool {
        self.healthy.swap(healthy, Ordering::AcqRel)
    }

    /// `<base-url><path>` without doubling the slash between them.
    pub fn health_url(&self, path: &str) -> String {
        let base = self.url.as_str().trim_end_matches('/');
        if path.is_empty() {
            format!("{}/", base)
        } else {
            format!("{}{}", base, path)
        }
    }

    /// Single GET against the health endpoint. Never fails: the outcome is
    /// written to the health flag and returned for the caller's information.
    pub async fn check(&self, client: &reqwest::Client, path: &str) -> ProbeOutcome {
        let url = self.health_url(path);

        let outcome = match client.get(&url).send().await {
            Ok(response) => ProbeOutcome::from_status(response.status()),
            Err(e) => ProbeOutcome::Unreachable(e.to_string()),
        };

        match &outcome {
            ProbeOutcome::Healthy(_) => {}
            ProbeOutcome::Unhealthy(status) => {
                warn!(backend = %self.url, %status, "Backend health check failed");
            }
            ProbeOutcome::Unreachable(error) => {
                warn!(backend = %self.url, %error, "Backend health check failed");
            }
        }

        let healthy = outcome.is_healthy();
        let was_healthy = self.set_healthy(healthy);
        if was_healthy != healthy {
            info!(
                backend = %self.id,
                healthy,
                "Backend health changed"
            );
        }

        outcome
    }
}
