mod commands;
mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use heroku_api::{Auth, HerokuApi};
use heroku_http::{GatewayBuilder, parse_base_url};

/// Heroku platform API client
#[derive(Parser)]
#[command(name = "heroku", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// API key; `HEROKU_API_KEY` when omitted
    #[arg(long, env = "HEROKU_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Base endpoint of the platform API
    #[arg(long, env = "HEROKU_API_ENDPOINT", global = true)]
    endpoint: Option<String>,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send an arbitrary request and print the JSON response
    Request(commands::RequestArgs),
    /// List apps, or show one app
    Apps {
        name: Option<String>,
    },
    /// Show the config vars of an app
    Config {
        app: String,
    },
    /// Show the account behind the current credential
    User,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let api = connect(&cli).await?;
    let output = match cli.command {
        Commands::Request(args) => args.run(api.gateway()).await?,
        Commands::Apps { name: Some(name) } => api
            .get_app(&name)
            .await
            .with_context(|| format!("failed to fetch app '{name}'"))?,
        Commands::Apps { name: None } => api.list_apps().await.context("failed to list apps")?,
        Commands::Config { app } => api
            .list_config_vars(&app)
            .await
            .with_context(|| format!("failed to fetch config vars of '{app}'"))?,
        Commands::User => api.get_user().await.context("failed to fetch user")?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn connect(cli: &Cli) -> Result<HerokuApi> {
    let mut builder = GatewayBuilder::new();
    if let Some(endpoint) = &cli.endpoint {
        builder = builder.base_url(parse_base_url(endpoint)?);
    }
    let gateway = builder.build().context("failed to build request gateway")?;

    match &cli.api_key {
        Some(key) => HerokuApi::with_auth(gateway, Auth::api_key(key.as_str()))
            .await
            .context("invalid API key"),
        None => {
            tracing::warn!("no API key given; requests will be unauthenticated");
            Ok(HerokuApi::new(gateway))
        }
    }
}
