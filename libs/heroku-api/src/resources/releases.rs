use serde_json::Value;

use crate::client::{HerokuApi, app_path, fetch, required, segment};
use crate::error::ApiError;

impl HerokuApi {
    pub async fn list_releases(&self, app: &str) -> Result<Value, ApiError> {
        fetch(self.gateway().get(&app_path(app, "/releases")?)).await
    }

    /// Fetch one release, e.g. `v42`.
    pub async fn get_release(&self, app: &str, release: &str) -> Result<Value, ApiError> {
        let release = required(release, "release must not be empty")?;
        let path = app_path(app, &format!("/releases/{}", segment(release)))?;
        fetch(self.gateway().get(&path)).await
    }

    /// Roll `app` back to `release`. An empty release is rejected before
    /// anything is sent.
    pub async fn rollback_release(&self, app: &str, release: &str) -> Result<Value, ApiError> {
        let release = required(release, "release must not be empty")?;
        let request = self
            .gateway()
            .post(&app_path(app, "/releases")?)
            .query(&[("rollback", release)])?;
        fetch(request).await
    }
}
