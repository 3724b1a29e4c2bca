use http::header::AUTHORIZATION;
use http::{HeaderValue, Request, Response};
use std::fmt;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::credential::Credential;
use crate::error::GatewayError;

/// Tower layer that injects `Authorization: Basic <token>` into outbound requests.
///
/// The header value is derived once from a [`Credential`] and replaces any
/// `Authorization` header the caller may have set.
#[derive(Clone)]
pub struct BasicAuthLayer {
    authorization: HeaderValue,
}

impl BasicAuthLayer {
    /// Create a layer for the given credential.
    ///
    /// # Errors
    /// Returns `GatewayError::InvalidHeaderValue` if the credential cannot be
    /// encoded as a header value.
    pub fn try_new(credential: &Credential) -> Result<Self, GatewayError> {
        let authorization = credential
            .authorization_header()
            .map_err(GatewayError::InvalidHeaderValue)?;
        Ok(Self { authorization })
    }
}

impl fmt::Debug for BasicAuthLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuthLayer").finish_non_exhaustive()
    }
}

impl<S> Layer<S> for BasicAuthLayer {
    type Service = BasicAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BasicAuthService {
            inner,
            authorization: self.authorization.clone(),
        }
    }
}

/// Service that sets the `Authorization` header before forwarding the request.
///
/// Created by [`BasicAuthLayer`]. Calls go straight to the wrapped service, so
/// a service that was already driven to readiness stays ready after wrapping.
#[derive(Clone)]
pub struct BasicAuthService<S> {
    inner: S,
    authorization: HeaderValue,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for BasicAuthService<S>
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
        req.headers_mut()
            .insert(AUTHORIZATION, self.authorization.clone());
        self.inner.call(req)
    }
}
