use serde::Serialize;
use serde_json::Value;

use crate::client::{HerokuApi, app_path, fetch, required, segment};
use crate::error::ApiError;

impl HerokuApi {
    pub async fn list_config_vars(&self, app: &str) -> Result<Value, ApiError> {
        fetch(self.gateway().get(&app_path(app, "/config_vars")?)).await
    }

    /// Set or overwrite config vars; `vars` is sent as a JSON object.
    pub async fn set_config_vars<V>(&self, app: &str, vars: &V) -> Result<Value, ApiError>
    where
        V: Serialize + ?Sized,
    {
        let request = self
            .gateway()
            .put(&app_path(app, "/config_vars")?)
            .json(vars)?;
        fetch(request).await
    }

    pub async fn remove_config_var(&self, app: &str, key: &str) -> Result<Value, ApiError> {
        let key = required(key, "config var name must not be empty")?;
        let path = app_path(app, &format!("/config_vars/{}", segment(key)))?;
        fetch(self.gateway().delete(&path)).await
    }
}
