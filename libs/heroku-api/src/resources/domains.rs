use serde_json::Value;

use crate::client::{HerokuApi, app_path, fetch, required, segment};
use crate::error::ApiError;

impl HerokuApi {
    pub async fn list_domains(&self, app: &str) -> Result<Value, ApiError> {
        fetch(self.gateway().get(&app_path(app, "/domains")?)).await
    }

    pub async fn add_domain(&self, app: &str, domain: &str) -> Result<Value, ApiError> {
        let domain = required(domain, "domain must not be empty")?;
        let request = self
            .gateway()
            .post(&app_path(app, "/domains")?)
            .query(&[("domain_name[domain]", domain)])?;
        fetch(request).await
    }

    pub async fn remove_domain(&self, app: &str, domain: &str) -> Result<Value, ApiError> {
        let domain = required(domain, "domain must not be empty")?;
        let path = app_path(app, &format!("/domains/{}", segment(domain)))?;
        fetch(self.gateway().delete(&path)).await
    }

    /// Remove every custom domain from `app`.
    pub async fn remove_all_domains(&self, app: &str) -> Result<Value, ApiError> {
        fetch(self.gateway().delete(&app_path(app, "/domains")?)).await
    }
}
