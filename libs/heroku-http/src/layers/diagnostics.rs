use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};

use crate::diagnostics::{CompletedRequest, Diagnostics, TransportFailure, sanitize_uri};
use crate::error::GatewayError;

/// Tower layer that reports request outcomes to a [`Diagnostics`] sink
///
/// Transport-kind failures (connect, TLS, timeout) are reported through
/// [`Diagnostics::transport_failure`] before the error propagates; every
/// received response is reported through [`Diagnostics::request_completed`].
/// URLs are reported without their query string.
#[derive(Clone)]
pub struct DiagnosticsLayer {
    sink: Arc<dyn Diagnostics>,
}

impl DiagnosticsLayer {
    /// Create a new diagnostics layer writing to `sink`
    #[must_use]
    pub fn new(sink: Arc<dyn Diagnostics>) -> Self {
        Self { sink }
    }
}

impl<S> Layer<S> for DiagnosticsLayer {
    type Service = DiagnosticsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DiagnosticsService {
            inner,
            sink: Arc::clone(&self.sink),
        }
    }
}

/// Service that times each request and reports its outcome
#[derive(Clone)]
pub struct DiagnosticsService<S> {
    inner: S,
    sink: Arc<dyn Diagnostics>,
}

impl<S, ResBody> Service<Request<Full<Bytes>>> for DiagnosticsService<S>
where
    S: Service<Request<Full<Bytes>>, Response = Response<ResBody>, Error = GatewayError>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = GatewayError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Full<Bytes>>) -> Self::Future {
        let method = req.method().clone();
        let url = sanitize_uri(req.uri());
        let sink = Arc::clone(&self.sink);

        // Call the instance that was poll_ready'd, keep a fresh clone for the next cycle
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let started = Instant::now();
            let result = inner.call(req).await;
            let elapsed = started.elapsed();

            match &result {
                Ok(response) => sink.request_completed(&CompletedRequest {
                    method: &method,
                    url: &url,
                    status: response.status(),
                    elapsed,
                }),
                Err(error) if error.is_transport() => sink.transport_failure(&TransportFailure {
                    method: &method,
                    url: &url,
                    error,
                    elapsed,
                }),
                Err(_) => {}
            }

            result
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http::{Method, StatusCode};
    use std::sync::Mutex;
    use std::time::Duration;
    use tower::ServiceExt;

    #[derive(Default)]
    struct Recorder {
        failures: Mutex<Vec<(String, String, String)>>,
        completed: Mutex<Vec<(String, u16)>>,
    }

    impl Diagnostics for Recorder {
        fn transport_failure(&self, failure: &TransportFailure<'_>) {
            self.failures.lock().unwrap().push((
                failure.method.to_string(),
                failure.url.to_owned(),
                failure.error.to_string(),
            ));
        }

        fn request_completed(&self, completed: &CompletedRequest<'_>) {
            self.completed
                .lock()
                .unwrap()
                .push((completed.url.to_owned(), completed.status.as_u16()));
        }
    }

    #[derive(Clone)]
    enum Outcome {
        Status(StatusCode),
        Timeout,
        BadHeader,
    }

    #[derive(Clone)]
    struct FixedService(Outcome);

    impl Service<Request<Full<Bytes>>> for FixedService {
        type Response = Response<Full<Bytes>>;
        type Error = GatewayError;
        type Future = std::future::Ready<Result<Self::Response, Self::Error>>;

        fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _: Request<Full<Bytes>>) -> Self::Future {
            std::future::ready(match &self.0 {
                Outcome::Status(status) => Ok(Response::builder()
                    .status(*status)
                    .body(Full::new(Bytes::new()))
                    .unwrap()),
                Outcome::Timeout => Err(GatewayError::Timeout(Duration::from_millis(5000))),
                Outcome::BadHeader => Err(GatewayError::InvalidHeaderValue(
                    http::HeaderValue::from_str("bad\x00").unwrap_err(),
                )),
            })
        }
    }

    fn request() -> Request<Full<Bytes>> {
        Request::builder()
            .method(Method::GET)
            .uri("https://api.heroku.com/apps?name=app1")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn reports_transport_failure_once() {
        let recorder = Arc::new(Recorder::default());
        let mut svc =
            DiagnosticsLayer::new(recorder.clone()).layer(FixedService(Outcome::Timeout));

        let err = svc.ready().await.unwrap().call(request()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Timeout(_)));

        let failures = recorder.failures.lock().unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "GET");
        assert_eq!(failures[0].1, "https://api.heroku.com/apps");
        assert!(failures[0].2.contains("timed out"));
        assert!(recorder.completed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reports_completed_for_error_status() {
        let recorder = Arc::new(Recorder::default());
        let mut svc = DiagnosticsLayer::new(recorder.clone())
            .layer(FixedService(Outcome::Status(StatusCode::NOT_FOUND)));

        let response = svc.ready().await.unwrap().call(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        assert!(recorder.failures.lock().unwrap().is_empty());
        assert_eq!(
            *recorder.completed.lock().unwrap(),
            vec![("https://api.heroku.com/apps".to_owned(), 404)]
        );
    }

    #[tokio::test]
    async fn request_errors_are_not_reported() {
        let recorder = Arc::new(Recorder::default());
        let mut svc =
            DiagnosticsLayer::new(recorder.clone()).layer(FixedService(Outcome::BadHeader));

        let _ = svc.ready().await.unwrap().call(request()).await.unwrap_err();

        assert!(recorder.failures.lock().unwrap().is_empty());
        assert!(recorder.completed.lock().unwrap().is_empty());
    }
}
