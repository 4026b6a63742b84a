//! Upstream Module
//!
//! Outbound fetch pipeline: transport seam, retry policy and the resilient
//! fetcher that combines them.

mod fetcher;
mod retry;
mod transport;

pub use fetcher::ResilientFetcher;
pub use retry::RetryPolicy;
pub use transport::{
    ReqwestTransport, Transport, TransportError, TransportErrorKind, UpstreamRequest,
    UpstreamResponse,
};
