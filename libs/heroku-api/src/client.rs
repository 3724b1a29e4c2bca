use heroku_http::{GatewayBuilder, RequestBuilder, RequestGateway};
use serde::de::DeserializeOwned;
use std::borrow::Cow;

use crate::auth::Auth;
use crate::error::ApiError;

/// Client for the platform API resources
///
/// Every wrapper builds its path from the gateway's base endpoint and
/// completes through the [`RequestGateway`]; nothing here talks to the
/// network directly. Cloning is cheap and shares the gateway's transport.
///
/// # Example
///
/// ```ignore
/// let api = HerokuApi::with_auth(RequestGateway::new()?, Auth::api_key("abc123")).await?;
///
/// let apps = api.list_apps().await?;
/// api.set_config_vars("app1", &BTreeMap::from([("RUST_LOG", "info")])).await?;
/// ```
#[derive(Clone, Debug)]
pub struct HerokuApi {
    gateway: RequestGateway,
}

impl HerokuApi {
    /// Wrap a gateway as-is (keeps whatever credential it carries).
    #[must_use]
    pub fn new(gateway: RequestGateway) -> Self {
        Self { gateway }
    }

    /// Attach `auth` to `gateway`, logging in first for [`Auth::Password`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Credential`] for empty keys, or the login failure
    /// for a password exchange.
    pub async fn with_auth(gateway: RequestGateway, auth: Auth) -> Result<Self, ApiError> {
        let credential = auth.into_credential(&gateway).await?;
        Ok(Self {
            gateway: gateway.with_credential(credential)?,
        })
    }

    /// Build from `HEROKU_API_ENDPOINT` and `HEROKU_API_KEY`.
    ///
    /// Must be called within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] for an invalid endpoint, or
    /// [`ApiError::Gateway`] if the gateway cannot be built.
    pub fn from_env() -> Result<Self, ApiError> {
        let gateway = GatewayBuilder::from_env()?.build()?;
        if gateway.credential().is_none() {
            tracing::warn!("HEROKU_API_KEY is not set; requests will be unauthenticated");
        }
        Ok(Self { gateway })
    }

    #[must_use]
    pub fn gateway(&self) -> &RequestGateway {
        &self.gateway
    }
}

/// Percent-encode one path segment.
pub(crate) fn segment(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

/// Reject an empty identifier before it turns into a malformed path.
pub(crate) fn required<'a>(value: &'a str, what: &'static str) -> Result<&'a str, ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidArgument(what));
    }
    Ok(value)
}

/// `/apps/{app}{rest}` with the app name encoded.
pub(crate) fn app_path(app: &str, rest: &str) -> Result<String, ApiError> {
    let app = required(app, "app name must not be empty")?;
    Ok(format!("/apps/{}{rest}", segment(app)))
}

/// Send and decode the JSON response body (an empty body decodes as `null`).
pub(crate) async fn fetch<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
    Ok(request.send().await?.json().await?)
}
