use serde::Serialize;
use serde_json::Value;

use crate::client::{HerokuApi, app_path, fetch, required, segment};
use crate::error::ApiError;

impl HerokuApi {
    /// Add-ons of `app`, or every add-on available to the account when `None`.
    pub async fn list_addons(&self, app: Option<&str>) -> Result<Value, ApiError> {
        let path = match app {
            Some(app) => app_path(app, "/addons")?,
            None => "/addons".to_owned(),
        };
        fetch(self.gateway().get(&path)).await
    }

    /// Provision `addon` (e.g. `heroku-postgresql:dev`); `config` is sent as query parameters.
    pub async fn add_addon<C>(&self, app: &str, addon: &str, config: &C) -> Result<Value, ApiError>
    where
        C: Serialize + ?Sized,
    {
        let path = addon_path(app, addon)?;
        fetch(self.gateway().post(&path).query(config)?).await
    }

    /// Switch `app` to another plan of the same add-on.
    pub async fn upgrade_addon<C>(
        &self,
        app: &str,
        addon: &str,
        config: &C,
    ) -> Result<Value, ApiError>
    where
        C: Serialize + ?Sized,
    {
        let path = addon_path(app, addon)?;
        fetch(self.gateway().put(&path).query(config)?).await
    }

    pub async fn remove_addon(&self, app: &str, addon: &str) -> Result<Value, ApiError> {
        fetch(self.gateway().delete(&addon_path(app, addon)?)).await
    }
}

fn addon_path(app: &str, addon: &str) -> Result<String, ApiError> {
    let addon = required(addon, "add-on name must not be empty")?;
    app_path(app, &format!("/addons/{}", segment(addon)))
}
