use serde_json::Value;

use crate::client::{HerokuApi, fetch, required, segment};
use crate::error::ApiError;

impl HerokuApi {
    pub async fn list_keys(&self) -> Result<Value, ApiError> {
        fetch(self.gateway().get("/keys")).await
    }

    /// Upload an SSH public key, sent verbatim as the request body.
    pub async fn add_key(&self, public_key: &str) -> Result<Value, ApiError> {
        let public_key = required(public_key, "public key must not be empty")?;
        let request = self
            .gateway()
            .post("/keys")
            .header("content-type", "text/ssh-authkey")
            .body_string(public_key.to_owned());
        fetch(request).await
    }

    /// Remove one key, identified by its `user@host` comment.
    pub async fn remove_key(&self, key: &str) -> Result<Value, ApiError> {
        let key = required(key, "key name must not be empty")?;
        let path = format!("/keys/{}", segment(key));
        fetch(self.gateway().delete(&path)).await
    }

    pub async fn remove_all_keys(&self) -> Result<Value, ApiError> {
        fetch(self.gateway().delete("/keys")).await
    }
}
