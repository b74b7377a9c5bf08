// ────────────────────────────────
// src/proxy/transport.rs
// The outbound leg: send one request to a backend, get one response back.
// ────────────────────────────────
use async_trait::async_trait;
use hyper::client::HttpConnector;
use hyper::{Body, Client, Request, Response};
use hyper_tls::HttpsConnector;
use std::time::Duration;

/// Failure before a complete response head came back from the backend.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error(transparent)]
    Http(#[from] hyper::Error),

    #[error("no response within {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Any HTTP status, including 4xx/5xx, is a successful send.
    async fn send(&self, req: Request<Body>) -> Result<Response<Body>, TransportError>;
}

/// hyper client speaking plain HTTP or HTTPS to the backends.
pub struct HyperTransport {
    client: Client<HttpsConnector<HttpConnector>, Body>,
    timeout: Duration,
}

impl HyperTransport {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder().build::<_, Body>(HttpsConnector::new());
        Self { client, timeout }
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn send(&self, req: Request<Body>) -> Result<Response<Body>, TransportError> {
        match tokio::time::timeout(self.timeout, self.client.request(req)).await {
            Ok(result) => result.map_err(TransportError::from),
            Err(_) => Err(TransportError::Timeout(self.timeout)),
        }
    }
}
