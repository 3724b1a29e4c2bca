//! One module per platform resource, each an `impl HerokuApi` block.
//!
//! # Errors
//!
//! Every wrapper fails with [`ApiError`](crate::ApiError): `NotFound`,
//! `Unauthorized` or `RequestFailed` when the platform answers non-2xx,
//! `InvalidArgument` when a required name is empty, and `Gateway` for
//! transport failures and timeouts.

#![allow(clippy::missing_errors_doc)]

mod addons;
mod apps;
mod attachments;
mod collaborators;
mod config_vars;
mod domains;
mod features;
mod keys;
pub(crate) mod login;
mod logs;
mod processes;
mod releases;
mod ssl_endpoints;
mod stacks;
mod users;

pub use apps::{AppCreate, AppUpdate};
pub use login::LoginResponse;
pub use logs::LogOptions;
pub use processes::{ProcessSelector, RunOptions};
