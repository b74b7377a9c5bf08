// src/health/checker.rs
use crate::config::HealthCheckConfig;
use crate::proxy::BackendPool;
use reqwest::{redirect, Client};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};

/// Periodically probes every backend in the pool.
///
/// Each tick fires one independent task per backend and moves on. Probes are
/// never awaited by the loop, so a slow backend can still be in flight when
/// the next tick dispatches another probe for it.
pub struct HealthMonitor {
    config: HealthCheckConfig,
    pool: Arc<BackendPool>,
    client: Client,
    running: AtomicBool,
}

impl HealthMonitor {
    pub fn new(config: HealthCheckConfig, pool: Arc<BackendPool>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout())
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            config,
            pool,
            client,
            running: AtomicBool::new(false),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Spawn the tick loop. Only the first call starts it; the loop then runs
    /// for the rest of the process lifetime.
    pub fn start(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self.running.swap(true, Ordering::AcqRel) {
            warn!("Health monitor already running, ignoring start");
            return None;
        }

        info!(
            interval = ?self.config.interval(),
            timeout = ?self.config.timeout(),
            path = %self.config.path,
            backends = self.pool.len(),
            "Starting health monitor"
        );

        let monitor = self.clone();
        Some(tokio::spawn(async move { monitor.run().await }))
    }

    async fn run(self: Arc<Self>) {
        let period = self.config.interval();
        // First probe one full interval after start.
        let mut ticker = interval_at(Instant::now() + period, period);

        loop {
            ticker.tick().await;
            let dispatched = self.dispatch_probes();
            debug!(dispatched, "Health check tick");
        }
    }

    /// Fire one probe task per backend without waiting for any of them.
    pub fn dispatch_probes(&self) -> usize {
        let mut dispatched = 0;

        for backend in self.pool.backends() {
            let backend = backend.clone();
            let client = self.client.clone();
            let path = self.config.path.clone();

            tokio::spawn(async move {
                backend.check(&client, &path).await;
            });
            dispatched += 1;
        }

        dispatched
    }
}
