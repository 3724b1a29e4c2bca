#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Typed wrappers for the Heroku platform API
//!
//! [`HerokuApi`] maps each platform resource (apps, add-ons, config vars,
//! processes, releases and so on) onto a method that builds the path, sends
//! it through a [`heroku_http::RequestGateway`] and decodes the JSON answer.
//! Non-2xx answers are classified into [`ApiError`].
//!
//! ```ignore
//! use heroku_api::{Auth, HerokuApi};
//! use heroku_http::RequestGateway;
//!
//! let api = HerokuApi::with_auth(RequestGateway::new()?, Auth::api_key("abc123")).await?;
//! match api.get_app("app1").await {
//!     Err(e) if e.is_not_found() => println!("no such app"),
//!     other => println!("{:#}", other?),
//! }
//! ```

mod auth;
mod client;
mod error;
mod resources;

pub use auth::Auth;
pub use client::HerokuApi;
pub use error::ApiError;
pub use resources::{AppCreate, AppUpdate, LogOptions, LoginResponse, ProcessSelector, RunOptions};
