use anyhow::{Context, Result, bail};
use clap::Args;
use heroku_http::RequestGateway;
use http::Method;
use serde_json::Value;

#[derive(Args)]
pub struct RequestArgs {
    /// HTTP method, e.g. GET or POST
    #[arg(value_parser = parse_method)]
    method: Method,

    /// Path relative to the endpoint, e.g. /apps
    path: String,

    /// Query parameter, repeatable
    #[arg(short, long = "query", value_name = "KEY=VALUE", value_parser = parse_pair)]
    query: Vec<(String, String)>,

    /// JSON request body
    #[arg(short, long, value_parser = parse_json)]
    data: Option<Value>,
}

impl RequestArgs {
    pub async fn run(self, gateway: &RequestGateway) -> Result<Value> {
        let mut request = gateway
            .request(self.method.clone(), &self.path)
            .query(&self.query)?;
        if let Some(body) = &self.data {
            request = request.json(body)?;
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("{} {} failed", self.method, self.path))?;
        Ok(response.json().await?)
    }
}

fn parse_method(value: &str) -> Result<Method> {
    Method::from_bytes(value.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method '{value}'"))
}

fn parse_pair(value: &str) -> Result<(String, String)> {
    let Some((key, val)) = value.split_once('=') else {
        bail!("expected KEY=VALUE, got '{value}'");
    };
    if key.is_empty() {
        bail!("empty key in '{value}'");
    }
    Ok((key.to_owned(), val.to_owned()))
}

fn parse_json(value: &str) -> Result<Value> {
    serde_json::from_str(value).context("--data must be valid JSON")
}
