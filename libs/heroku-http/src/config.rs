use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Default User-Agent string for gateway requests
pub const DEFAULT_USER_AGENT: &str = concat!("heroku-http/", env!("CARGO_PKG_VERSION"));

/// Default base endpoint of the platform API
pub const DEFAULT_BASE_URL: &str = "https://api.heroku.com";

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(5000);

/// Environment variable that overrides the base endpoint
pub const API_ENDPOINT_ENV: &str = "HEROKU_API_ENDPOINT";

/// Environment variable that supplies a default API key
pub const API_KEY_ENV: &str = "HEROKU_API_KEY";

/// Configuration loading errors
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    /// The configured base endpoint is not a valid absolute URL
    #[error("invalid API endpoint '{value}': {source}")]
    InvalidEndpoint {
        value: String,
        #[source]
        source: url::ParseError,
    },

    /// The configured base endpoint cannot carry a path (e.g. `mailto:`)
    #[error("API endpoint '{0}' cannot be used as a base URL")]
    NotABase(String),
}

/// TLS root certificate configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum TlsRootConfig {
    /// Use Mozilla's root certificates (webpki-roots, no OS dependency)
    #[default]
    WebPki,
    /// Use OS native root certificate store
    Native,
}

/// Transport security configuration
///
/// Controls whether the gateway enforces TLS or allows insecure HTTP.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportSecurity {
    /// Require TLS for all connections (HTTPS only) - default and recommended
    #[default]
    TlsOnly,
    /// Allow insecure HTTP connections (for testing with mock servers only)
    ///
    /// **WARNING**: Never use in production; the `Authorization` header would
    /// travel in clear text.
    AllowInsecureHttp,
}

/// Overall gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base endpoint that relative request paths are resolved against
    /// (default: `https://api.heroku.com`)
    pub base_url: Url,

    /// Per-request timeout (default: 5 seconds)
    ///
    /// A request that has not produced a response head within this duration
    /// completes with `GatewayError::Timeout`.
    pub request_timeout: Duration,

    /// Maximum response body size in bytes (default: 10 MB)
    ///
    /// Also bounds the body captured in `GatewayError::HttpStatus`.
    pub max_body_size: usize,

    /// User-Agent header value (default: `heroku-http/<version>`)
    pub user_agent: String,

    /// Transport security mode (default: `TlsOnly`)
    pub transport: TransportSecurity,

    /// TLS root certificate strategy (default: `WebPki`)
    pub tls_roots: TlsRootConfig,

    /// Buffer capacity for concurrent request handling (default: 1024)
    ///
    /// The gateway queues requests through an internal buffer so that clones
    /// can share one transport without locking. When the buffer is full,
    /// requests fail fast with `GatewayError::Overloaded`.
    pub buffer_capacity: usize,

    /// Timeout for idle connections in the pool (default: 90 seconds)
    ///
    /// Set to `None` to use hyper-util's default idle timeout.
    pub pool_idle_timeout: Option<Duration>,

    /// Maximum number of idle connections per host (default: 32)
    pub pool_max_idle_per_host: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_body_size: 10 * 1024 * 1024, // 10 MB
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            transport: TransportSecurity::TlsOnly,
            tls_roots: TlsRootConfig::default(),
            buffer_capacity: 1024,
            pool_idle_timeout: Some(Duration::from_secs(90)),
            pool_max_idle_per_host: 32,
        }
    }
}

impl GatewayConfig {
    /// Create configuration for testing with mock servers (allows insecure HTTP)
    ///
    /// **WARNING**: This configuration allows plain HTTP connections.
    /// Use only for local testing with mock servers, never in production.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            max_body_size: 1024 * 1024, // 1 MB
            transport: TransportSecurity::AllowInsecureHttp,
            buffer_capacity: 256,
            pool_idle_timeout: Some(Duration::from_secs(10)),
            pool_max_idle_per_host: 4,
            ..Self::default()
        }
    }

    /// Build the default configuration, overriding the base endpoint from
    /// `HEROKU_API_ENDPOINT` when it is set and non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the variable holds something that is not an
    /// absolute base URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(endpoint) = non_empty_env(API_ENDPOINT_ENV) {
            config.base_url = parse_base_url(&endpoint)?;
        }
        Ok(config)
    }
}

/// Parse and validate a base endpoint URL.
///
/// # Errors
///
/// Returns [`ConfigError`] if `value` is not an absolute URL that can carry a path.
pub fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|source| ConfigError::InvalidEndpoint {
        value: value.to_owned(),
        source,
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::NotABase(value.to_owned()));
    }
    Ok(url)
}

/// Read an environment variable, treating unset, empty and non-UTF-8 values alike.
pub(crate) fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn default_base_url() -> Url {
    // DEFAULT_BASE_URL is a constant absolute URL.
    #[allow(clippy::expect_used)]
    Url::parse(DEFAULT_BASE_URL).expect("DEFAULT_BASE_URL is a valid URL")
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.base_url.as_str(), "https://api.heroku.com/");
        assert_eq!(config.request_timeout, Duration::from_millis(5000));
        assert_eq!(config.transport, TransportSecurity::TlsOnly);
        assert!(config.user_agent.starts_with("heroku-http/"));
        assert!(config.user_agent.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_for_testing_allows_http() {
        let config = GatewayConfig::for_testing();
        assert_eq!(config.transport, TransportSecurity::AllowInsecureHttp);
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn test_from_env_uses_default_when_unset() {
        temp_env::with_var_unset(API_ENDPOINT_ENV, || {
            let config = GatewayConfig::from_env().unwrap();
            assert_eq!(config.base_url.as_str(), "https://api.heroku.com/");
        });
    }

    #[test]
    fn test_from_env_overrides_endpoint() {
        temp_env::with_var(API_ENDPOINT_ENV, Some("http://localhost:5000/v2"), || {
            let config = GatewayConfig::from_env().unwrap();
            assert_eq!(config.base_url.as_str(), "http://localhost:5000/v2");
        });
    }

    #[test]
    fn test_from_env_ignores_empty_value() {
        temp_env::with_var(API_ENDPOINT_ENV, Some("   "), || {
            let config = GatewayConfig::from_env().unwrap();
            assert_eq!(config.base_url.as_str(), "https://api.heroku.com/");
        });
    }

    #[test]
    fn test_from_env_rejects_relative_endpoint() {
        temp_env::with_var(API_ENDPOINT_ENV, Some("api.heroku.com"), || {
            let err = GatewayConfig::from_env().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidEndpoint { .. }), "{err:?}");
        });
    }

    #[test]
    fn test_parse_base_url_rejects_cannot_be_a_base() {
        let err = parse_base_url("mailto:ops@example.com").unwrap_err();
        assert!(matches!(err, ConfigError::NotABase(_)));
    }
}
