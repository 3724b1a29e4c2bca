use heroku_http::{RequestGateway, SecretString};
use serde::Deserialize;
use std::fmt;

use crate::client::{HerokuApi, fetch};
use crate::error::ApiError;

/// Body of a successful `POST /login`
#[derive(Clone, Deserialize)]
pub struct LoginResponse {
    pub api_key: Option<String>,
    pub email: Option<String>,
    pub id: Option<serde_json::Value>,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("email", &self.email)
            .field("id", &self.id)
            .finish()
    }
}

pub(crate) async fn post_login(
    gateway: &RequestGateway,
    username: &str,
    password: &SecretString,
) -> Result<LoginResponse, ApiError> {
    let request = gateway
        .post("/login")
        .query(&[("username", username), ("password", password.expose())])?;
    fetch(request).await
}

impl HerokuApi {
    /// Exchange a username and password for the account's API key.
    ///
    /// Sent without this client's credential.
    ///
    /// # Errors
    ///
    /// [`ApiError::Unauthorized`] for bad credentials, otherwise any
    /// gateway failure.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        post_login(
            &self.gateway().without_credential(),
            username,
            &SecretString::new(password),
        )
        .await
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn debug_hides_api_key() {
        let response: LoginResponse =
            serde_json::from_str(r#"{"api_key":"k-123","email":"ops@example.com"}"#).unwrap();
        let dbg = format!("{response:?}");
        assert!(!dbg.contains("k-123"));
        assert!(dbg.contains("ops@example.com"));
    }
}
