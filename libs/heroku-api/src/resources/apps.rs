use serde::Serialize;
use serde_json::Value;

use crate::client::{HerokuApi, app_path, fetch};
use crate::error::ApiError;

/// Parameters for `POST /apps`; every field is optional.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AppCreate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// Parameters for `PUT /apps/{app}`, used to rename or migrate an app
#[derive(Debug, Clone, Default, Serialize)]
pub struct AppUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl HerokuApi {
    pub async fn list_apps(&self) -> Result<Value, ApiError> {
        fetch(self.gateway().get("/apps")).await
    }

    pub async fn get_app(&self, app: &str) -> Result<Value, ApiError> {
        fetch(self.gateway().get(&app_path(app, "")?)).await
    }

    pub async fn create_app(&self, params: &AppCreate) -> Result<Value, ApiError> {
        fetch(self.gateway().post("/apps").query(params)?).await
    }

    pub async fn update_app(&self, app: &str, params: &AppUpdate) -> Result<Value, ApiError> {
        fetch(self.gateway().put(&app_path(app, "")?).query(params)?).await
    }

    pub async fn delete_app(&self, app: &str) -> Result<Value, ApiError> {
        fetch(self.gateway().delete(&app_path(app, "")?)).await
    }

    pub async fn get_maintenance(&self, app: &str) -> Result<Value, ApiError> {
        fetch(self.gateway().get(&app_path(app, "/server/maintenance")?)).await
    }

    /// Turn maintenance mode on or off.
    pub async fn set_maintenance(&self, app: &str, enabled: bool) -> Result<Value, ApiError> {
        let request = self
            .gateway()
            .post(&app_path(app, "/server/maintenance")?)
            .query(&[("maintenance_mode", enabled)])?;
        fetch(request).await
    }
}
