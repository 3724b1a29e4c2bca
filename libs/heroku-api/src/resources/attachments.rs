use serde_json::Value;

use crate::client::{HerokuApi, app_path, fetch};
use crate::error::ApiError;

impl HerokuApi {
    pub async fn list_attachments(&self, app: &str) -> Result<Value, ApiError> {
        fetch(self.gateway().get(&app_path(app, "/attachments")?)).await
    }
}
