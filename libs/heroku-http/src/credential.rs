use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::HeaderValue;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::config::{API_KEY_ENV, non_empty_env};

/// Opaque wrapper around a secret string value.
///
/// `Debug` and `Display` both print `[REDACTED]`. Use [`expose`](Self::expose)
/// for controlled access when constructing headers or request parameters.
///
/// On [`Drop`] the backing buffer is securely zeroed via the [`zeroize`] crate.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretString(String);

impl SecretString {
    /// Create a new `SecretString` from a plain value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Provide read-only access to the underlying secret.
    ///
    /// Callers must not log, store, or otherwise persist the returned slice.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Credential construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CredentialError {
    /// The API key or token was empty
    #[error("no API token provided")]
    EmptyToken,

    /// The email half of an email/token pair was empty
    #[error("no email provided")]
    EmptyEmail,
}

/// Token used to authenticate every outbound call of one gateway instance.
///
/// Stored already base64-encoded, ready for `Authorization: Basic <token>`.
/// Cloning is cheap and shares the secret buffer.
#[derive(Clone)]
pub struct Credential {
    encoded: Arc<SecretString>,
}

impl Credential {
    /// Derive a credential from an API key.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::EmptyToken`] if `api_key` is empty or blank.
    pub fn from_api_key(api_key: &str) -> Result<Self, CredentialError> {
        if api_key.trim().is_empty() {
            return Err(CredentialError::EmptyToken);
        }
        Ok(Self::encode(api_key))
    }

    /// Derive a credential from an account email and API token (`email:token`).
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] if either part is empty.
    pub fn from_email_token(email: &str, token: &str) -> Result<Self, CredentialError> {
        if email.trim().is_empty() {
            return Err(CredentialError::EmptyEmail);
        }
        if token.trim().is_empty() {
            return Err(CredentialError::EmptyToken);
        }
        let joined = Zeroizing::new(format!("{email}:{token}"));
        Ok(Self::encode(&joined))
    }

    /// Read the default credential from `HEROKU_API_KEY`.
    ///
    /// Returns `None` when the variable is unset or blank.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let key = Zeroizing::new(non_empty_env(API_KEY_ENV)?);
        Some(Self::encode(&key))
    }

    /// Build the `Authorization` header value for this credential.
    ///
    /// The value is marked sensitive so it is never printed by `http`'s `Debug`.
    ///
    /// # Errors
    ///
    /// Returns [`http::header::InvalidHeaderValue`] if the value cannot be a
    /// header (not reachable for base64 output, kept for the fallible API).
    pub fn authorization_header(&self) -> Result<HeaderValue, http::header::InvalidHeaderValue> {
        let raw = Zeroizing::new(format!("Basic {}", self.encoded.expose()));
        let mut value = HeaderValue::from_str(&raw)?;
        value.set_sensitive(true);
        Ok(value)
    }

    fn encode(raw: &str) -> Self {
        Self {
            encoded: Arc::new(SecretString::new(STANDARD.encode(raw.as_bytes()))),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn decoded(credential: &Credential) -> String {
        let header = credential.authorization_header().unwrap();
        let value = header.to_str().unwrap();
        let encoded = value.strip_prefix("Basic ").unwrap();
        String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap()
    }

    #[test]
    fn api_key_is_base64_encoded() {
        let credential = Credential::from_api_key("abc123").unwrap();
        let header = credential.authorization_header().unwrap();
        assert_eq!(header.to_str().unwrap(), "Basic YWJjMTIz");
        assert!(header.is_sensitive());
    }

    #[test]
    fn email_token_pair_is_joined() {
        let credential = Credential::from_email_token("ops@example.com", "tok").unwrap();
        assert_eq!(decoded(&credential), "ops@example.com:tok");
    }

    #[test]
    fn empty_api_key_is_rejected() {
        assert_eq!(
            Credential::from_api_key("").unwrap_err(),
            CredentialError::EmptyToken
        );
        assert_eq!(
            Credential::from_api_key("   ").unwrap_err(),
            CredentialError::EmptyToken
        );
    }

    #[test]
    fn empty_email_or_token_is_rejected() {
        assert_eq!(
            Credential::from_email_token("", "tok").unwrap_err(),
            CredentialError::EmptyEmail
        );
        assert_eq!(
            Credential::from_email_token("ops@example.com", "").unwrap_err(),
            CredentialError::EmptyToken
        );
    }

    #[test]
    fn from_env_reads_api_key() {
        temp_env::with_var(API_KEY_ENV, Some("env-key"), || {
            let credential = Credential::from_env().unwrap();
            assert_eq!(decoded(&credential), "env-key");
        });
    }

    #[test]
    fn from_env_is_none_when_unset_or_blank() {
        temp_env::with_var_unset(API_KEY_ENV, || {
            assert!(Credential::from_env().is_none());
        });
        temp_env::with_var(API_KEY_ENV, Some(""), || {
            assert!(Credential::from_env().is_none());
        });
    }

    #[test]
    fn debug_does_not_reveal_secret() {
        let credential = Credential::from_api_key("super-secret-key").unwrap();
        let dbg = format!("{credential:?}");
        assert!(!dbg.contains("super-secret-key"));
        assert!(!dbg.contains(&STANDARD.encode("super-secret-key")));
    }

    #[test]
    fn secret_string_is_redacted() {
        let s = SecretString::new("hunter2");
        assert_eq!(format!("{s:?}"), "[REDACTED]");
        assert_eq!(format!("{s}"), "[REDACTED]");
        assert_eq!(s.expose(), "hunter2");
    }

    #[test]
    fn secret_string_zeroize_clears_buffer() {
        let mut s = SecretString::new("sensitive");
        s.zeroize();
        assert!(s.0.is_empty(), "buffer should be empty after zeroize");
    }
}
