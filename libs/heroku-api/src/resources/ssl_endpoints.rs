use serde::Serialize;
use serde_json::Value;

use crate::client::{HerokuApi, app_path, fetch, required, segment};
use crate::error::ApiError;

#[derive(Serialize)]
struct Certificate<'a> {
    key: &'a str,
    pem: &'a str,
}

impl<'a> Certificate<'a> {
    fn new(pem: &'a str, key: &'a str) -> Result<Self, ApiError> {
        Ok(Self {
            key: required(key, "private key must not be empty")?,
            pem: required(pem, "certificate must not be empty")?,
        })
    }
}

impl HerokuApi {
    pub async fn list_ssl_endpoints(&self, app: &str) -> Result<Value, ApiError> {
        fetch(self.gateway().get(&app_path(app, "/ssl-endpoints")?)).await
    }

    pub async fn get_ssl_endpoint(&self, app: &str, cname: &str) -> Result<Value, ApiError> {
        fetch(self.gateway().get(&endpoint_path(app, cname, "")?)).await
    }

    /// Create an endpoint from a PEM certificate chain and its private key.
    pub async fn add_ssl_endpoint(
        &self,
        app: &str,
        pem: &str,
        key: &str,
    ) -> Result<Value, ApiError> {
        let request = self
            .gateway()
            .post(&app_path(app, "/ssl-endpoints")?)
            .query(&Certificate::new(pem, key)?)?;
        fetch(request).await
    }

    /// Replace the certificate of an existing endpoint.
    pub async fn update_ssl_endpoint(
        &self,
        app: &str,
        cname: &str,
        pem: &str,
        key: &str,
    ) -> Result<Value, ApiError> {
        let request = self
            .gateway()
            .put(&endpoint_path(app, cname, "")?)
            .query(&Certificate::new(pem, key)?)?;
        fetch(request).await
    }

    /// Restore the previous certificate of an endpoint.
    pub async fn rollback_ssl_endpoint(&self, app: &str, cname: &str) -> Result<Value, ApiError> {
        fetch(self.gateway().post(&endpoint_path(app, cname, "/rollback")?)).await
    }

    pub async fn remove_ssl_endpoint(&self, app: &str, cname: &str) -> Result<Value, ApiError> {
        fetch(self.gateway().delete(&endpoint_path(app, cname, "")?)).await
    }
}

fn endpoint_path(app: &str, cname: &str, rest: &str) -> Result<String, ApiError> {
    let cname = required(cname, "endpoint cname must not be empty")?;
    app_path(app, &format!("/ssl-endpoints/{}{rest}", segment(cname)))
}
