//! Tower layers for the gateway middleware stack
//!
//! ## Available Layers
//!
//! - [`DefaultHeadersLayer`] - Forces `Accept` and `User-Agent` on every request
//! - [`BasicAuthLayer`] - Injects `Authorization: Basic <token>` from a credential
//! - [`DiagnosticsLayer`] - Reports transport failures to a diagnostics sink

mod basic_auth;
mod default_headers;
mod diagnostics;

pub use basic_auth::{BasicAuthLayer, BasicAuthService};
pub use default_headers::{DefaultHeadersLayer, DefaultHeadersService};
pub use diagnostics::{DiagnosticsLayer, DiagnosticsService};
