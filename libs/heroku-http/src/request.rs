use crate::config::TransportSecurity;
use crate::diagnostics::{Diagnostics, TransportFailure, sanitize_uri};
use crate::error::{GatewayError, InvalidUriKind};
use crate::gateway::{BufferedService, map_buffer_error, try_acquire_buffer_slot};
use crate::layers::BasicAuthLayer;
use crate::response::{GatewayResponse, ResponseBody, status_error};
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tower::{Layer, Service};

#[derive(Clone, Debug)]
enum BodyKind {
    Empty,
    Bytes(Bytes),
    Json(Bytes),
    Form(Bytes),
}

/// Outgoing request under construction
///
/// Created by [`RequestGateway::request`](crate::RequestGateway::request) and
/// the verb shortcuts. Caller headers are additive; `Accept`, `User-Agent`
/// and `Authorization` are always set by the gateway and replace any value
/// given here. A caller `Authorization` header is dropped when the gateway
/// has no credential.
///
/// # Example
///
/// ```ignore
/// let resp = gateway
///     .post("/apps")
///     .query(&[("name", "app1")])?
///     .header("x-request-id", "abc123")
///     .send()
///     .await?;
/// ```
#[must_use = "RequestBuilder does nothing until .send() or .spawn() is called"]
pub struct RequestBuilder {
    service: BufferedService,
    auth: Option<BasicAuthLayer>,
    max_body_size: usize,
    method: http::Method,
    url: String,
    query: Option<String>,
    headers: Vec<(http::header::HeaderName, http::header::HeaderValue)>,
    body: BodyKind,
    /// Error captured during building (deferred to `send()`)
    error: Option<GatewayError>,
    transport_security: TransportSecurity,
    request_timeout: Duration,
    diagnostics: Arc<dyn Diagnostics>,
}

impl RequestBuilder {
    pub(crate) fn new(
        service: BufferedService,
        auth: Option<BasicAuthLayer>,
        max_body_size: usize,
        method: http::Method,
        url: String,
        transport_security: TransportSecurity,
        request_timeout: Duration,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            service,
            auth,
            max_body_size,
            method,
            url,
            query: None,
            headers: Vec::new(),
            body: BodyKind::Empty,
            error: None,
            transport_security,
            request_timeout,
            diagnostics,
        }
    }

    /// Add a single header to the request
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if self.error.is_some() {
            return self;
        }

        match (
            http::header::HeaderName::try_from(name),
            http::header::HeaderValue::try_from(value),
        ) {
            (Ok(name), Ok(value)) => self.headers.push((name, value)),
            (Err(e), _) => self.error = Some(GatewayError::InvalidHeaderName(e)),
            (_, Err(e)) => self.error = Some(GatewayError::InvalidHeaderValue(e)),
        }
        self
    }

    /// Add multiple headers to the request
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in headers {
            self = self.header(name.as_ref(), value.as_ref());
        }
        self
    }

    /// Append query parameters, URL-encoded with `serde_urlencoded`.
    ///
    /// Accepts anything `serde_urlencoded` does: slices of pairs, maps, or a
    /// flat struct. May be called more than once; parameters accumulate.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::UrlEncode` if `params` cannot be encoded, or an
    /// error deferred from an earlier builder call.
    pub fn query<T: Serialize + ?Sized>(mut self, params: &T) -> Result<Self, GatewayError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }

        let encoded = serde_urlencoded::to_string(params)?;
        if !encoded.is_empty() {
            self.query = Some(match self.query.take() {
                Some(existing) => format!("{existing}&{encoded}"),
                None => encoded,
            });
        }
        Ok(self)
    }

    /// Set request body as JSON (`Content-Type: application/json` unless the
    /// caller supplied one).
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Json` if serialization fails.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, GatewayError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }

        let json_bytes = serde_json::to_vec(body)?;
        self.body = BodyKind::Json(Bytes::from(json_bytes));
        Ok(self)
    }

    /// Set request body as `application/x-www-form-urlencoded`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::UrlEncode` if encoding fails.
    pub fn form<T: Serialize + ?Sized>(mut self, fields: &T) -> Result<Self, GatewayError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }

        let form_string = serde_urlencoded::to_string(fields)?;
        self.body = BodyKind::Form(Bytes::from(form_string));
        Ok(self)
    }

    /// Set request body as raw bytes
    pub fn body_bytes(mut self, body: Bytes) -> Self {
        self.body = BodyKind::Bytes(body);
        self
    }

    /// Set request body as a string
    pub fn body_string(mut self, body: String) -> Self {
        self.body = BodyKind::Bytes(Bytes::from(body));
        self
    }

    fn target(&self) -> String {
        match &self.query {
            Some(query) if self.url.contains('?') => format!("{}&{query}", self.url),
            Some(query) => format!("{}?{query}", self.url),
            None => self.url.clone(),
        }
    }

    /// Parse the final URL and check its scheme against the transport security mode.
    fn validate_url(&self) -> Result<http::Uri, GatewayError> {
        let target = self.target();
        let uri: http::Uri =
            target
                .parse()
                .map_err(|e: http::uri::InvalidUri| GatewayError::InvalidUri {
                    url: self.url.clone(),
                    kind: InvalidUriKind::ParseError,
                    reason: e.to_string(),
                })?;

        if uri.authority().is_none() {
            return Err(GatewayError::InvalidUri {
                url: self.url.clone(),
                kind: InvalidUriKind::MissingAuthority,
                reason: "missing host/authority".to_owned(),
            });
        }

        match uri.scheme_str() {
            Some("https") => Ok(uri),
            Some("http") => match self.transport_security {
                TransportSecurity::AllowInsecureHttp => Ok(uri),
                TransportSecurity::TlsOnly => Err(GatewayError::InvalidScheme {
                    scheme: "http".to_owned(),
                    reason: "HTTPS required (transport security is TlsOnly)".to_owned(),
                }),
            },
            Some(scheme) => Err(GatewayError::InvalidScheme {
                scheme: scheme.to_owned(),
                reason: "only http:// and https:// schemes are supported".to_owned(),
            }),
            None => Err(GatewayError::InvalidUri {
                url: self.url.clone(),
                kind: InvalidUriKind::MissingScheme,
                reason: "missing scheme".to_owned(),
            }),
        }
    }

    /// Send the request.
    ///
    /// Resolves exactly once: `Ok` for a 2xx response, otherwise the
    /// normalized error. Non-2xx responses become
    /// [`GatewayError::HttpStatus`] with the body read (up to the size limit).
    ///
    /// # Errors
    ///
    /// - request construction failures (headers, URL, scheme, encoding)
    /// - `Transport`, `Tls` or `Timeout` when no response was received, or the
    ///   body of a non-2xx response could not be read before the gateway's
    ///   timeout (which covers the whole call)
    /// - `HttpStatus` for non-2xx responses
    /// - `Overloaded` when the request buffer is full
    pub async fn send(mut self) -> Result<GatewayResponse, GatewayError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }

        let uri = self.validate_url()?;
        let started = Instant::now();
        let failure_report = FailureReport {
            sink: Arc::clone(&self.diagnostics),
            method: self.method.clone(),
            url: sanitize_uri(&uri),
            started,
        };
        let mut builder = Request::builder().method(self.method).uri(uri);

        let has_content_type = self
            .headers
            .iter()
            .any(|(name, _)| name == http::header::CONTENT_TYPE);
        if !has_content_type {
            match &self.body {
                BodyKind::Json(_) => {
                    builder = builder.header(http::header::CONTENT_TYPE, "application/json");
                }
                BodyKind::Form(_) => {
                    builder = builder.header(
                        http::header::CONTENT_TYPE,
                        "application/x-www-form-urlencoded",
                    );
                }
                BodyKind::Empty | BodyKind::Bytes(_) => {}
            }
        }

        for (name, value) in self.headers {
            // Authorization comes from the gateway's credential only.
            if name == http::header::AUTHORIZATION {
                tracing::debug!("ignoring caller-supplied Authorization header");
                continue;
            }
            builder = builder.header(name, value);
        }

        let body_bytes = match self.body {
            BodyKind::Empty => Bytes::new(),
            BodyKind::Bytes(b) | BodyKind::Json(b) | BodyKind::Form(b) => b,
        };
        let request = builder.body(Full::new(body_bytes))?;

        try_acquire_buffer_slot(&mut self.service)
            .await
            .map_err(|e| failure_report.report(e))?;

        // The buffer slot is reserved on `self.service`; wrap it by reference
        // so the call goes to the instance that was polled ready.
        let pending = match &self.auth {
            Some(auth) => auth.layer(&mut self.service).call(request),
            None => self.service.call(request),
        };
        let inner: Response<ResponseBody> = pending.await.map_err(|e| match map_buffer_error(e) {
            // Inner-stack failures were already reported by `DiagnosticsLayer`.
            closed @ GatewayError::ServiceClosed => failure_report.report(closed),
            other => other,
        })?;

        if !inner.status().is_success() {
            let remaining = self.request_timeout.saturating_sub(started.elapsed());
            let error =
                match tokio::time::timeout(remaining, status_error(inner, self.max_body_size))
                    .await
                {
                    Ok(error) => error,
                    Err(_elapsed) => GatewayError::Timeout(self.request_timeout),
                };
            return Err(if error.is_transport() {
                failure_report.report(error)
            } else {
                error
            });
        }

        Ok(GatewayResponse {
            inner,
            max_body_size: self.max_body_size,
        })
    }

    /// Send the request on the Tokio runtime and invoke `on_complete` with the outcome.
    ///
    /// `on_complete` runs exactly once, unless the runtime shuts down first.
    /// Dropping the returned handle detaches the task; aborting it cancels the
    /// request without invoking `on_complete`.
    pub fn spawn<F>(self, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<GatewayResponse, GatewayError>) + Send + 'static,
    {
        tokio::spawn(async move { on_complete(self.send().await) })
    }
}

/// Reports transport failures that happen outside `DiagnosticsLayer`
/// (buffer admission, reading an error body).
struct FailureReport {
    sink: Arc<dyn Diagnostics>,
    method: http::Method,
    url: String,
    started: Instant,
}

impl FailureReport {
    fn report(&self, error: GatewayError) -> GatewayError {
        self.sink.transport_failure(&TransportFailure {
            method: &self.method,
            url: &self.url,
            error: &error,
            elapsed: self.started.elapsed(),
        });
        error
    }
}
