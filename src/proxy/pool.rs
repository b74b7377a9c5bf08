//
// src/proxy/pool.rs
//

use super::backend::{Backend, BackendError};
use crate::load_balancer::RoundRobin;
use std::sync::Arc;
use url::Url;

/// The fixed, ordered set of backends plus the rotation cursor.
///
/// The list is built once and never mutated, so readers need no lock.
#[derive(Debug)]
pub struct BackendPool {
    backends: Vec<Arc<Backend>>,
    strategy: RoundRobin,
}

impl BackendPool {
    pub fn new(backends: Vec<Backend>) -> Self {
        Self {
            backends: backends.into_iter().map(Arc::new).collect(),
            strategy: RoundRobin::new(),
        }
    }

    pub fn from_urls(urls: Vec<Url>) -> Self {
        Self::new(urls.into_iter().map(Backend::new).collect())
    }

    /// Builds the pool from raw strings, failing on the first malformed one.
    pub fn parse<S: AsRef<str>>(urls: &[S]) -> Result<Self, BackendError> {
        let backends = urls
            .iter()
            .map(|u| Backend::parse(u.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(backends))
    }

    /// Next healthy backend in rotation, or `None` if nothing can take traffic.
    pub fn select_next(&self) -> Option<Arc<Backend>> {
        self.strategy.select(&self.backends).cloned()
    }

    pub fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    pub fn get_backend(&self, id: &str) -> Option<Arc<Backend>> {
        self.backends.iter().find(|b| b.id == id).cloned()
    }

    pub fn healthy_count(&self) -> usize {
        self.backends.iter().filter(|b| b.is_healthy()).count()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn strategy(&self) -> &RoundRobin {
        &self.strategy
    }
}
