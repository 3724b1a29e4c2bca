use heroku_http::RequestBuilder;
use serde_json::Value;

use crate::client::{HerokuApi, fetch, required, segment};
use crate::error::ApiError;

/// Feature flags are account-wide unless `app` scopes them with `?app=`.
impl HerokuApi {
    pub async fn list_features(&self, app: Option<&str>) -> Result<Value, ApiError> {
        fetch(scoped(self.gateway().get("/features"), app)?).await
    }

    pub async fn get_feature(&self, feature: &str, app: Option<&str>) -> Result<Value, ApiError> {
        let path = feature_path(feature)?;
        fetch(scoped(self.gateway().get(&path), app)?).await
    }

    pub async fn enable_feature(
        &self,
        feature: &str,
        app: Option<&str>,
    ) -> Result<Value, ApiError> {
        let path = feature_path(feature)?;
        fetch(scoped(self.gateway().post(&path), app)?).await
    }

    pub async fn disable_feature(
        &self,
        feature: &str,
        app: Option<&str>,
    ) -> Result<Value, ApiError> {
        let path = feature_path(feature)?;
        fetch(scoped(self.gateway().delete(&path), app)?).await
    }
}

fn feature_path(feature: &str) -> Result<String, ApiError> {
    let feature = required(feature, "feature name must not be empty")?;
    Ok(format!("/features/{}", segment(feature)))
}

fn scoped(request: RequestBuilder, app: Option<&str>) -> Result<RequestBuilder, ApiError> {
    match app {
        Some(app) => {
            let app = required(app, "app name must not be empty")?;
            Ok(request.query(&[("app", app)])?)
        }
        None => Ok(request),
    }
}
