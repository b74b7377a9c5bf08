// src/load_balancer/mod.rs
mod round_robin;

pub use round_robin::RoundRobin;

use crate::config::{Config, ConfigError, HealthCheckConfig};
use crate::health::HealthMonitor;
use crate::proxy::{BackendPool, HyperTransport, Proxy, Transport};
use hyper::{Body, Request, Response};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build health check client: {0}")]
    HealthClient(#[from] reqwest::Error),
}

/// The service: one backend pool, its health monitor and the request path
/// in front of them. Built once at startup.
pub struct LoadBalancer {
    pool: Arc<BackendPool>,
    monitor: Arc<HealthMonitor>,
    proxy: Proxy,
}

impl LoadBalancer {
    pub fn new(config: &Config) -> Result<Self, BuildError> {
        let pool = Arc::new(BackendPool::from_urls(config.backends()?));
        let transport = Arc::new(HyperTransport::new(config.proxy_timeout()));

        Self::with_transport(pool, config.health_check(), transport, &config.liveness_path)
    }

    /// Like [`LoadBalancer::new`] with a caller-supplied forwarding transport.
    pub fn with_transport(
        pool: Arc<BackendPool>,
        health_check: HealthCheckConfig,
        transport: Arc<dyn Transport>,
        liveness_path: &str,
    ) -> Result<Self, BuildError> {
        let monitor = Arc::new(HealthMonitor::new(health_check, pool.clone())?);
        let proxy = Proxy::new(pool.clone(), transport, liveness_path);

        Ok(Self {
            pool,
            monitor,
            proxy,
        })
    }

    /// Starts background health checking. Subsequent calls are no-ops.
    pub fn start(&self) -> Option<JoinHandle<()>> {
        self.monitor.start()
    }

    pub async fn handle(&self, req: Request<Body>, client_addr: Option<SocketAddr>) -> Response<Body> {
        self.proxy.handle(req, client_addr).await
    }

    pub fn pool(&self) -> &Arc<BackendPool> {
        &self.pool
    }

    pub fn monitor(&self) -> &Arc<HealthMonitor> {
        &self.monitor
    }
}
