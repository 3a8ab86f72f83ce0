//! Source-hosting API integration: transport seam, quota governance, and
//! the paginating client.

pub mod client;
pub mod error;
pub mod rate;
pub mod transport;
pub mod types;

pub use client::{GitHubClient, Paginator, next_url};
pub use error::GitHubError;
pub use rate::{QuotaSnapshot, RateGovernor};
pub use transport::{HttpResponse, ReqwestTransport, Transport, TransportError};
