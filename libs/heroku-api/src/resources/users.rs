use serde_json::Value;

use crate::client::{HerokuApi, fetch};
use crate::error::ApiError;

impl HerokuApi {
    /// The account the current credential belongs to.
    pub async fn get_user(&self) -> Result<Value, ApiError> {
        fetch(self.gateway().get("/user")).await
    }
}
