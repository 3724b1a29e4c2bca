use crate::error::GatewayError;
use bytes::Bytes;
use http::{HeaderMap, Response, StatusCode};
use http_body::Frame;
use http_body_util::BodyExt;
use pin_project_lite::pin_project;
use serde::de::DeserializeOwned;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, SystemTime};

/// Placeholder stored in [`GatewayError::HttpStatus`] when an error body exceeds the size limit.
pub const OVERSIZED_BODY_PLACEHOLDER: &str = "<body too large>";

/// Parse a `Retry-After` header value into a `Duration`.
///
/// Accepts delay-seconds ("120") or an HTTP-date. Returns `None` if the header
/// is missing, unparseable, negative, or names a time already passed.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(http::header::RETRY_AFTER)?.to_str().ok()?;
    let trimmed = value.trim();

    if let Ok(seconds) = trimmed.parse::<i64>() {
        if seconds < 0 {
            return None;
        }
        return Some(Duration::from_secs(seconds.cast_unsigned()));
    }

    let when = httpdate::parse_http_date(trimmed).ok()?;
    when.duration_since(SystemTime::now()).ok()
}

/// Boxed response body after the decompression layer.
pub type ResponseBody =
    http_body_util::combinators::BoxBody<Bytes, Box<dyn std::error::Error + Send + Sync>>;

pin_project! {
    /// Body wrapper that enforces the gateway's size limit while streaming.
    ///
    /// Created by [`GatewayResponse::into_limited_body()`]. Yields
    /// [`GatewayError::BodyTooLarge`] once more than `limit` decompressed
    /// bytes have been read.
    pub struct LimitedBody {
        #[pin]
        inner: ResponseBody,
        limit: usize,
        read: usize,
    }
}

impl LimitedBody {
    #[must_use]
    pub fn new(inner: ResponseBody, limit: usize) -> Self {
        Self {
            inner,
            limit,
            read: 0,
        }
    }

    /// Bytes read so far.
    #[must_use]
    pub fn bytes_read(&self) -> usize {
        self.read
    }
}

impl http_body::Body for LimitedBody {
    type Data = Bytes;
    type Error = GatewayError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.project();

        match this.inner.poll_frame(cx) {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    *this.read += data.len();
                    if *this.read > *this.limit {
                        return Poll::Ready(Some(Err(GatewayError::BodyTooLarge {
                            limit: *this.limit,
                            actual: *this.read,
                        })));
                    }
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(GatewayError::Transport(e)))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Successful (2xx) response returned by the gateway
///
/// Non-2xx responses never reach this type; they complete the request with
/// [`GatewayError::HttpStatus`]. All body reads enforce `max_body_size`.
#[derive(Debug)]
pub struct GatewayResponse {
    pub(crate) inner: Response<ResponseBody>,
    pub(crate) max_body_size: usize,
}

impl GatewayResponse {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Consume the wrapper and return the (already decompressed) inner response.
    #[must_use]
    pub fn into_inner(self) -> Response<ResponseBody> {
        self.inner
    }

    /// Read the body as bytes.
    ///
    /// # Errors
    /// Returns `GatewayError::BodyTooLarge` if the body exceeds the limit.
    pub async fn bytes(self) -> Result<Bytes, GatewayError> {
        read_body_limited(self.inner, self.max_body_size).await
    }

    /// Read the body as UTF-8 text, replacing invalid sequences.
    ///
    /// # Errors
    /// Returns `GatewayError::BodyTooLarge` if the body exceeds the limit.
    pub async fn text(self) -> Result<String, GatewayError> {
        let body = read_body_limited(self.inner, self.max_body_size).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Parse the body as JSON.
    ///
    /// An empty body (for example `204 No Content`) is parsed as JSON `null`,
    /// so `Option<T>` and `()` targets succeed.
    ///
    /// # Errors
    /// Returns `GatewayError::BodyTooLarge` or `GatewayError::Json`.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, GatewayError> {
        let body = read_body_limited(self.inner, self.max_body_size).await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::from_slice(b"null")?);
        }
        Ok(serde_json::from_slice(&body)?)
    }

    /// Stream the body while enforcing the size limit.
    #[must_use]
    pub fn into_limited_body(self) -> LimitedBody {
        LimitedBody::new(self.inner.into_body(), self.max_body_size)
    }

    #[must_use]
    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }
}

/// Turn a non-2xx response into [`GatewayError::HttpStatus`], reading its body.
///
/// Transport failures while reading the body propagate as such; an oversized
/// body is replaced by [`OVERSIZED_BODY_PLACEHOLDER`] so the status is not lost.
pub(crate) async fn status_error(
    response: Response<ResponseBody>,
    max_body_size: usize,
) -> GatewayError {
    let status = response.status();
    let content_type = response
        .headers()
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let retry_after = parse_retry_after(response.headers());

    let body = match read_body_limited(response, max_body_size).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(GatewayError::BodyTooLarge { .. }) => OVERSIZED_BODY_PLACEHOLDER.to_owned(),
        Err(e) => return e,
    };

    GatewayError::HttpStatus {
        status,
        body,
        content_type,
        retry_after,
    }
}

/// Collect a response body, failing once it exceeds `limit` decompressed bytes.
pub(crate) async fn read_body_limited(
    response: Response<ResponseBody>,
    limit: usize,
) -> Result<Bytes, GatewayError> {
    let (_parts, body) = response.into_parts();

    let mut collected = Vec::new();
    let mut body = std::pin::pin!(body);

    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(GatewayError::Transport)?;
        if let Some(chunk) = frame.data_ref() {
            if collected.len() + chunk.len() > limit {
                return Err(GatewayError::BodyTooLarge {
                    limit,
                    actual: collected.len() + chunk.len(),
                });
            }
            collected.extend_from_slice(chunk);
        }
    }

    Ok(Bytes::from(collected))
}
