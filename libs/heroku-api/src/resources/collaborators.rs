use serde_json::Value;

use crate::client::{HerokuApi, app_path, fetch, required, segment};
use crate::error::ApiError;

impl HerokuApi {
    pub async fn list_collaborators(&self, app: &str) -> Result<Value, ApiError> {
        fetch(self.gateway().get(&app_path(app, "/collaborators")?)).await
    }

    /// Invite `email` to collaborate on `app`.
    pub async fn add_collaborator(&self, app: &str, email: &str) -> Result<Value, ApiError> {
        let email = required(email, "collaborator email must not be empty")?;
        let request = self
            .gateway()
            .post(&app_path(app, "/collaborators")?)
            .query(&[("collaborators[email]", email)])?;
        fetch(request).await
    }

    pub async fn remove_collaborator(&self, app: &str, email: &str) -> Result<Value, ApiError> {
        let email = required(email, "collaborator email must not be empty")?;
        let path = app_path(app, &format!("/collaborators/{}", segment(email)))?;
        fetch(self.gateway().delete(&path)).await
    }
}
