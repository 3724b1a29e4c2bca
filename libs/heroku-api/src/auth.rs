use heroku_http::{Credential, RequestGateway, SecretString};

use crate::error::ApiError;
use crate::resources::login::LoginResponse;

/// How a [`HerokuApi`](crate::HerokuApi) authenticates.
///
/// `Debug` never prints secrets.
#[derive(Clone, Debug)]
pub enum Auth {
    /// Platform API key
    ApiKey(SecretString),
    /// Account email plus API token, sent as `email:token`
    EmailToken { email: String, token: SecretString },
    /// Username and password, exchanged for an API key via `POST /login`
    Password {
        username: String,
        password: SecretString,
    },
}

impl Auth {
    #[must_use]
    pub fn api_key(key: impl Into<String>) -> Self {
        Self::ApiKey(SecretString::new(key))
    }

    #[must_use]
    pub fn email_token(email: impl Into<String>, token: impl Into<String>) -> Self {
        Self::EmailToken {
            email: email.into(),
            token: SecretString::new(token),
        }
    }

    #[must_use]
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Password {
            username: username.into(),
            password: SecretString::new(password),
        }
    }

    /// Resolve to a credential, performing the login exchange for `Password`.
    ///
    /// The exchange goes through `gateway` without any credential attached.
    pub(crate) async fn into_credential(
        self,
        gateway: &RequestGateway,
    ) -> Result<Credential, ApiError> {
        match self {
            Self::ApiKey(key) => Ok(Credential::from_api_key(key.expose())?),
            Self::EmailToken { email, token } => {
                Ok(Credential::from_email_token(&email, token.expose())?)
            }
            Self::Password { username, password } => {
                tracing::debug!(username = %username, "exchanging password for API key");
                let response: LoginResponse = crate::resources::login::post_login(
                    &gateway.without_credential(),
                    &username,
                    &password,
                )
                .await?;
                let key = response.api_key.ok_or(ApiError::MissingApiKey)?;
                Ok(Credential::from_api_key(&key)?)
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn debug_is_redacted() {
        let dbg = format!(
            "{:?} {:?} {:?}",
            Auth::api_key("key-1"),
            Auth::email_token("ops@example.com", "tok-1"),
            Auth::password("ops@example.com", "pw-1"),
        );
        assert!(!dbg.contains("key-1"));
        assert!(!dbg.contains("tok-1"));
        assert!(!dbg.contains("pw-1"));
        assert!(dbg.contains("ops@example.com"));
    }
}
