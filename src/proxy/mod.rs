//
// src/proxy/mod.rs
//
mod backend;
mod pool;
#[allow(clippy::module_inception)]
mod proxy;
mod transport;

pub use backend::{parse_backend_url, Backend, BackendError};
pub use pool::BackendPool;
pub use proxy::{rewrite_request, strip_hop_by_hop, Proxy, ProxyError};
pub use transport::{HyperTransport, Transport, TransportError};
