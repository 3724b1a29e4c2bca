use serde::Serialize;
use serde_json::Value;

use crate::client::{HerokuApi, app_path, fetch, required};
use crate::error::ApiError;

/// Options for a one-off `POST /apps/{app}/ps`
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunOptions {
    /// Attach to the process and get a rendezvous URL back
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attach: Option<bool>,
}

#[derive(Serialize)]
struct RunQuery<'a> {
    command: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    attach: Option<bool>,
}

/// Which processes a restart or stop applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessSelector<'a> {
    All,
    /// A single process, e.g. `web.1`
    Process(&'a str),
    /// Every process of a type, e.g. `worker`
    Type(&'a str),
}

impl ProcessSelector<'_> {
    fn query(self) -> Result<Vec<(&'static str, String)>, ApiError> {
        Ok(match self {
            Self::All => Vec::new(),
            Self::Process(ps) => {
                vec![("ps", required(ps, "process name must not be empty")?.to_owned())]
            }
            Self::Type(kind) => {
                vec![("type", required(kind, "process type must not be empty")?.to_owned())]
            }
        })
    }
}

impl HerokuApi {
    pub async fn list_processes(&self, app: &str) -> Result<Value, ApiError> {
        fetch(self.gateway().get(&app_path(app, "/ps")?)).await
    }

    /// Start a one-off process running `command`.
    pub async fn run_process(
        &self,
        app: &str,
        command: &str,
        options: &RunOptions,
    ) -> Result<Value, ApiError> {
        let command = required(command, "command must not be empty")?;
        let request = self
            .gateway()
            .post(&app_path(app, "/ps")?)
            .query(&RunQuery {
                command,
                attach: options.attach,
            })?;
        fetch(request).await
    }

    pub async fn restart_processes(
        &self,
        app: &str,
        selector: ProcessSelector<'_>,
    ) -> Result<Value, ApiError> {
        let request = self
            .gateway()
            .post(&app_path(app, "/ps/restart")?)
            .query(&selector.query()?)?;
        fetch(request).await
    }

    pub async fn stop_processes(
        &self,
        app: &str,
        selector: ProcessSelector<'_>,
    ) -> Result<Value, ApiError> {
        let request = self
            .gateway()
            .post(&app_path(app, "/ps/stop")?)
            .query(&selector.query()?)?;
        fetch(request).await
    }

    /// Scale a process type to `quantity` dynos.
    pub async fn scale_processes(
        &self,
        app: &str,
        process_type: &str,
        quantity: u32,
    ) -> Result<Value, ApiError> {
        let process_type = required(process_type, "process type must not be empty")?;
        let request = self
            .gateway()
            .post(&app_path(app, "/ps/scale")?)
            .query(&[("type", process_type.to_owned()), ("qty", quantity.to_string())])?;
        fetch(request).await
    }

    /// Legacy web dyno count for pre-Cedar stacks.
    pub async fn set_dynos(&self, app: &str, dynos: u32) -> Result<Value, ApiError> {
        let request = self
            .gateway()
            .put(&app_path(app, "/dynos")?)
            .query(&[("dynos", dynos)])?;
        fetch(request).await
    }

    /// Legacy worker count for pre-Cedar stacks.
    pub async fn set_workers(&self, app: &str, workers: u32) -> Result<Value, ApiError> {
        let request = self
            .gateway()
            .put(&app_path(app, "/workers")?)
            .query(&[("workers", workers)])?;
        fetch(request).await
    }

    /// Update the process formation; `formation` is sent as JSON.
    pub async fn update_formation<F>(&self, app: &str, formation: &F) -> Result<Value, ApiError>
    where
        F: Serialize + ?Sized,
    {
        let request = self
            .gateway()
            .put(&app_path(app, "/formation")?)
            .json(formation)?;
        fetch(request).await
    }

    pub async fn list_dyno_types(&self, app: &str) -> Result<Value, ApiError> {
        fetch(self.gateway().get(&app_path(app, "/dyno-types")?)).await
    }
}
