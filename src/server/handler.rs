// src/server/handler.rs
use hyper::header::HeaderValue;
use hyper::{Body, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::Service;
use tracing::Instrument;
use uuid::Uuid;

use crate::load_balancer::LoadBalancer;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Per-connection hyper service in front of the [`LoadBalancer`].
#[derive(Clone)]
pub struct RequestHandler {
    balancer: Arc<LoadBalancer>,
    peer: Option<SocketAddr>,
}

impl RequestHandler {
    pub fn new(balancer: Arc<LoadBalancer>) -> Self {
        Self { balancer, peer: None }
    }

    /// Copy of this handler bound to one client connection.
    pub fn for_peer(&self, peer: SocketAddr) -> Self {
        Self {
            balancer: self.balancer.clone(),
            peer: Some(peer),
        }
    }
}

impl Service<Request<Body>> for RequestHandler {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = futures::future::BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let balancer = self.balancer.clone();
        let peer = self.peer;

        let existing = req
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let request_id = match existing {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4().to_string();
                if let Ok(value) = HeaderValue::from_str(&id) {
                    req.headers_mut().insert(X_REQUEST_ID, value);
                }
                id
            }
        };

        let span = tracing::info_span!(
            "request",
            id = %request_id,
            method = %req.method(),
            path = %req.uri().path(),
        );

        Box::pin(
            async move { Ok(balancer.handle(req, peer).await) }.instrument(span),
        )
    }
}
