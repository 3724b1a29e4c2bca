#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Request gateway for the Heroku platform API
//!
//! Every outbound call to the platform goes through a single [`RequestGateway`],
//! which provides:
//! - Default headers (`Accept: application/json`, `User-Agent`) on every request
//! - `Authorization: Basic <token>` when a [`Credential`] is attached
//! - A fixed per-request timeout (5 seconds by default)
//! - Normalization of transport failures and non-2xx responses into [`GatewayError`]
//! - An injectable [`Diagnostics`] hook that observes transport failures
//! - Automatic TLS via rustls (HTTPS only by default)
//! - Transparent response decompression (gzip, brotli, deflate)
//!
//! # Header precedence
//!
//! The gateway's fixed headers (`Accept`, `User-Agent`, `Authorization`) always
//! win over a caller-supplied value with the same name. All other caller headers
//! are sent as given.
//!
//! # Example
//!
//! ```ignore
//! use heroku_http::{Credential, RequestGateway};
//!
//! let gateway = RequestGateway::builder()
//!     .credential(Credential::from_api_key("abc123")?)
//!     .build()?;
//!
//! let user: serde_json::Value = gateway.get("/user").send().await?.json().await?;
//!
//! let created = gateway
//!     .post("/apps")
//!     .query(&[("name", "app1")])?
//!     .send()
//!     .await?;
//! ```

mod builder;
mod config;
mod credential;
mod diagnostics;
mod error;
mod gateway;
mod layers;
mod request;
mod response;
mod tls;

pub use builder::GatewayBuilder;
pub use config::{
    API_ENDPOINT_ENV, API_KEY_ENV, ConfigError, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_USER_AGENT, GatewayConfig, TlsRootConfig, TransportSecurity, parse_base_url,
};
pub use credential::{Credential, CredentialError, SecretString};
pub use diagnostics::{CompletedRequest, Diagnostics, TracingDiagnostics, TransportFailure};
pub use error::{
    ERROR_BODY_PREVIEW_LIMIT, ErrorKind, GatewayError, InvalidUriKind, body_preview,
};
pub use gateway::RequestGateway;
pub use layers::{
    BasicAuthLayer, BasicAuthService, DefaultHeadersLayer, DefaultHeadersService,
    DiagnosticsLayer, DiagnosticsService,
};
pub use request::RequestBuilder;
pub use response::{
    GatewayResponse, LimitedBody, OVERSIZED_BODY_PLACEHOLDER, ResponseBody, parse_retry_after,
};
