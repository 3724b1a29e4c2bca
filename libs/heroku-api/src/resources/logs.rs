use serde::Serialize;

use crate::client::{HerokuApi, app_path};
use crate::error::ApiError;

/// Query options for `GET /apps/{app}/logs`
///
/// `logplex` defaults to `true`, which makes the platform answer with a
/// one-time logplex URL instead of the log lines themselves.
#[derive(Debug, Clone, Serialize)]
pub struct LogOptions {
    pub logplex: bool,
    /// Number of lines to return
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num: Option<u32>,
    /// Only lines from this process, e.g. `web.1`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ps: Option<String>,
    /// Only lines from this source, e.g. `app` or `heroku`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail: Option<bool>,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            logplex: true,
            num: None,
            ps: None,
            source: None,
            tail: None,
        }
    }
}

impl HerokuApi {
    /// Fetch recent logs; the response is returned as text.
    pub async fn get_logs(&self, app: &str, options: &LogOptions) -> Result<String, ApiError> {
        let response = self
            .gateway()
            .get(&app_path(app, "/logs")?)
            .query(options)?
            .send()
            .await?;
        Ok(response.text().await?)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn default_options_request_logplex_only() {
        let query = serde_urlencoded::to_string(LogOptions::default()).unwrap();
        assert_eq!(query, "logplex=true");
    }

    #[test]
    fn filters_are_serialized_when_set() {
        let options = LogOptions {
            num: Some(100),
            ps: Some("web.1".to_owned()),
            ..LogOptions::default()
        };
        let query = serde_urlencoded::to_string(&options).unwrap();
        assert_eq!(query, "logplex=true&num=100&ps=web.1");
    }
}
