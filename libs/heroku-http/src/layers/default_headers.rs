use crate::error::GatewayError;
use http::{HeaderValue, Request, Response};
use std::task::{Context, Poll};
use tower::{Layer, Service};

const ACCEPT_JSON: &str = "application/json";

/// Tower layer that sets the gateway's fixed headers on all requests
///
/// `Accept: application/json` and `User-Agent` are inserted unconditionally,
/// replacing any caller-supplied value.
#[derive(Clone)]
pub struct DefaultHeadersLayer {
    user_agent: HeaderValue,
}

impl DefaultHeadersLayer {
    /// Create a new `DefaultHeadersLayer` with the specified user agent string
    ///
    /// # Errors
    /// Returns `GatewayError::InvalidHeaderValue` if the user agent string is not valid
    pub fn try_new(user_agent: impl AsRef<str>) -> Result<Self, GatewayError> {
        let user_agent = HeaderValue::from_str(user_agent.as_ref())
            .map_err(GatewayError::InvalidHeaderValue)?;
        Ok(Self { user_agent })
    }
}

impl<S> Layer<S> for DefaultHeadersLayer {
    type Service = DefaultHeadersService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DefaultHeadersService {
            inner,
            user_agent: self.user_agent.clone(),
        }
    }
}

/// Service that sets the fixed headers on requests
#[derive(Clone)]
pub struct DefaultHeadersService<S> {
    inner: S,
    user_agent: HeaderValue,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for DefaultHeadersService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let headers = req.headers_mut();
        headers.insert(http::header::ACCEPT, HeaderValue::from_static(ACCEPT_JSON));
        headers.insert(http::header::USER_AGENT, self.user_agent.clone());
        self.inner.call(req)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Method, Request, Response, StatusCode};
    use http_body_util::Full;
    use tower::ServiceExt;

    /// Test service that asserts the fixed headers match the expected values.
    #[derive(Clone)]
    struct CheckHeadersService {
        expected_ua: HeaderValue,
    }

    impl Service<Request<Full<Bytes>>> for CheckHeadersService {
        type Response = Response<Full<Bytes>>;
        type Error = Box<dyn std::error::Error + Send + Sync>;
        type Future = std::future::Ready<Result<Self::Response, Self::Error>>;

        fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: Request<Full<Bytes>>) -> Self::Future {
            let ua: Vec<_> = req
                .headers()
                .get_all(http::header::USER_AGENT)
                .iter()
                .collect();
            assert_eq!(ua, vec![&self.expected_ua]);

            let accept: Vec<_> = req.headers().get_all(http::header::ACCEPT).iter().collect();
            assert_eq!(accept, vec![&HeaderValue::from_static(ACCEPT_JSON)]);

            std::future::ready(Ok(Response::builder()
                .status(StatusCode::OK)
                .body(Full::new(Bytes::new()))
                .unwrap()))
        }
    }

    #[tokio::test]
    async fn test_default_headers_added() {
        let check_service = CheckHeadersService {
            expected_ua: HeaderValue::from_static("heroku-http/1.0"),
        };

        let layer = DefaultHeadersLayer::try_new("heroku-http/1.0").unwrap();
        let mut service = layer.layer(check_service);

        let req = Request::builder()
            .method(Method::GET)
            .uri("https://api.heroku.com/user")
            .body(Full::new(Bytes::new()))
            .unwrap();

        service.ready().await.unwrap().call(req).await.unwrap();
    }

    #[tokio::test]
    async fn test_caller_values_are_overwritten() {
        let check_service = CheckHeadersService {
            expected_ua: HeaderValue::from_static("heroku-http/1.0"),
        };

        let layer = DefaultHeadersLayer::try_new("heroku-http/1.0").unwrap();
        let mut service = layer.layer(check_service);

        let req = Request::builder()
            .method(Method::GET)
            .uri("https://api.heroku.com/user")
            .header(http::header::USER_AGENT, "custom-agent/2.0")
            .header(http::header::ACCEPT, "text/html")
            .header(http::header::ACCEPT, "application/xml")
            .body(Full::new(Bytes::new()))
            .unwrap();

        service.ready().await.unwrap().call(req).await.unwrap();
    }

    #[test]
    fn test_default_headers_layer_invalid_value() {
        // Control characters are invalid in header values
        let result = DefaultHeadersLayer::try_new("invalid\x00agent");
        assert!(result.is_err());
    }
}
