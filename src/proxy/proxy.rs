// ────────────────────────────────
// src/proxy/proxy.rs
// Request path: liveness, backend selection, forwarding, error translation.
// ────────────────────────────────

use super::backend::Backend;
use super::pool::BackendPool;
use super::transport::{Transport, TransportError};
use hyper::header::{HeaderMap, HeaderValue, CONNECTION, HOST};
use hyper::{Body, Request, Response, StatusCode, Uri, Version};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info};
use url::Url;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Headers that describe a single hop and must not be passed through.
const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

pub struct Proxy {
    pool: Arc<BackendPool>,
    transport: Arc<dyn Transport>,
    liveness_path: String,
}

impl Proxy {
    pub fn new(
        pool: Arc<BackendPool>,
        transport: Arc<dyn Transport>,
        liveness_path: impl Into<String>,
    ) -> Self {
        Self {
            pool,
            transport,
            liveness_path: liveness_path.into(),
        }
    }

    /// Always produces a response; failures become 502/503.
    pub async fn handle(&self, req: Request<Body>, client_addr: Option<SocketAddr>) -> Response<Body> {
        if req.uri().path() == self.liveness_path {
            debug!(headers = ?req.headers(), "Liveness probe received");
            return Response::new(Body::from("OK"));
        }

        let backend = match self.pool.select_next() {
            Some(backend) => backend,
            None => {
                debug!(path = %req.uri().path(), "No healthy backend available");
                return ProxyError::NoHealthyBackends.into();
            }
        };

        match self.forward(req, &backend, client_addr).await {
            Ok(response) => response,
            Err(err) => err.into(),
        }
    }

    /// Sends `req` to `backend` exactly once. A transport failure takes the
    /// backend out of rotation until the next successful probe.
    pub async fn forward(
        &self,
        req: Request<Body>,
        backend: &Backend,
        client_addr: Option<SocketAddr>,
    ) -> Result<Response<Body>, ProxyError> {
        info!(backend = %backend.url, path = %req.uri().path(), "Forwarding request");

        let outbound = rewrite_request(req, &backend.url, client_addr).map_err(|e| {
            error!(backend = %backend.url, error = %e, "Failed to build upstream request");
            ProxyError::InvalidRequest(e)
        })?;

        match self.transport.send(outbound).await {
            Ok(mut response) => {
                strip_hop_by_hop(response.headers_mut());
                Ok(response)
            }
            Err(err) => {
                backend.set_healthy(false);
                error!(backend = %backend.url, error = %err, "Proxy error");
                Err(ProxyError::Upstream {
                    backend: backend.id.clone(),
                    source: err,
                })
            }
        }
    }
}

/// Point `req` at `base`: scheme, authority and Host from the backend, path
/// joined onto the backend's base path, query kept.
pub fn rewrite_request(
    req: Request<Body>,
    base: &Url,
    client_addr: Option<SocketAddr>,
) -> Result<Request<Body>, hyper::http::Error> {
    let (mut parts, body) = req.into_parts();

    let authority = match base.port() {
        Some(port) => format!("{}:{}", base.host_str().unwrap_or_default(), port),
        None => base.host_str().unwrap_or_default().to_string(),
    };

    let path = join_paths(base.path(), parts.uri.path());
    let query = match (base.query(), parts.uri.query()) {
        (Some(a), Some(b)) if !a.is_empty() => Some(format!("{}&{}", a, b)),
        (Some(a), None) => Some(a.to_string()),
        (_, Some(b)) => Some(b.to_string()),
        (None, None) => None,
    };
    let path_and_query = match query {
        Some(q) if !q.is_empty() => format!("{}?{}", path, q),
        _ => path,
    };

    parts.uri = Uri::builder()
        .scheme(base.scheme())
        .authority(authority.as_str())
        .path_and_query(path_and_query.as_str())
        .build()?;
    parts.version = Version::HTTP_11;

    strip_hop_by_hop(&mut parts.headers);
    parts.headers.insert(HOST, HeaderValue::from_str(&authority)?);

    if let Some(addr) = client_addr {
        let ip = addr.ip().to_string();
        let forwarded = match parts
            .headers
            .get(X_FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
        {
            Some(prior) => format!("{}, {}", prior, ip),
            None => ip,
        };
        parts
            .headers
            .insert(X_FORWARDED_FOR, HeaderValue::from_str(&forwarded)?);
    }

    Ok(Request::from_parts(parts, body))
}

/// Joins two paths with exactly one slash between them.
fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

/// Removes the standard hop-by-hop headers and anything named in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<String> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    for name in &listed {
        headers.remove(name.as_str());
    }
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }
}

// Custom error type for proxy operations
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("No healthy backends available")]
    NoHealthyBackends,

    #[error("Backend {backend} failed: {source}")]
    Upstream {
        backend: String,
        source: TransportError,
    },

    #[error("Could not build upstream request: {0}")]
    InvalidRequest(hyper::http::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::NoHealthyBackends => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::Upstream { .. } | ProxyError::InvalidRequest(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

// The client only ever sees a generic message, never the underlying error.
impl From<ProxyError> for Response<Body> {
    fn from(err: ProxyError) -> Self {
        let message = match err {
            ProxyError::NoHealthyBackends => "no healthy backends",
            ProxyError::Upstream { .. } | ProxyError::InvalidRequest(_) => "backend error",
        };

        let mut response = Response::new(Body::from(message));
        *response.status_mut() = err.status();
        response
    }
}
