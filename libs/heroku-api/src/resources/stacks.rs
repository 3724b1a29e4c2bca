use serde_json::Value;

use crate::client::{HerokuApi, app_path, fetch, required};
use crate::error::ApiError;

impl HerokuApi {
    /// Stacks available to `app`, with the current one flagged.
    pub async fn get_stack(&self, app: &str) -> Result<Value, ApiError> {
        fetch(self.gateway().get(&app_path(app, "/stack")?)).await
    }

    /// Migrate `app` to `stack`; the name is sent as the raw body and the
    /// platform's migration output comes back as text.
    pub async fn migrate_stack(&self, app: &str, stack: &str) -> Result<String, ApiError> {
        let stack = required(stack, "stack name must not be empty")?;
        let response = self
            .gateway()
            .put(&app_path(app, "/stack")?)
            .body_string(stack.to_owned())
            .send()
            .await?;
        Ok(response.text().await?)
    }
}
