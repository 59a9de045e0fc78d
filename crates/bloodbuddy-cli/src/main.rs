mod output;
mod register;
mod route;
mod search;
mod track;

use bloodbuddy_client::{NominatimClient, OsrmClient, RegistryClient};
use bloodbuddy_core::{AppConfig, ResultLimit};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::register::RegisterArgs;
use crate::route::RouteArgs;
use crate::search::SearchArgs;
use crate::track::TrackArgs;

#[derive(Debug, Parser)]
#[command(name = "bloodbuddy")]
#[command(about = "Find nearby blood donors, register as one, and route to them")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search the registry for donors near a place
    Search(SearchArgs),
    /// Register a new donor
    Register(RegisterArgs),
    /// Compute a driving route between two coordinates
    Route(RouteArgs),
    /// Replay a recorded position track through the live map
    Track(TrackArgs),
}

/// Parses a page size; only the sizes the search screen offers are accepted.
pub(crate) fn parse_limit(raw: &str) -> Result<ResultLimit, String> {
    let value: u32 = raw.parse().map_err(|e| format!("{e}"))?;
    ResultLimit::try_from(value).map_err(|e| e.to_string())
}

pub(crate) fn registry_client(config: &AppConfig) -> anyhow::Result<RegistryClient> {
    Ok(RegistryClient::new(
        &config.api_url,
        &config.user_agent,
        config.request_timeout_secs,
    )?)
}

pub(crate) fn geocoder_client(config: &AppConfig) -> anyhow::Result<NominatimClient> {
    Ok(NominatimClient::new(
        &config.geocoder_url,
        &config.user_agent,
        config.request_timeout_secs,
    )?)
}

pub(crate) fn routing_client(config: &AppConfig) -> anyhow::Result<OsrmClient> {
    Ok(OsrmClient::new(
        &config.router_url,
        &config.user_agent,
        config.request_timeout_secs,
    )?)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = bloodbuddy_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(env = %config.env, api_url = %config.api_url, "configuration loaded");

    match cli.command {
        Commands::Search(args) => search::run_search(&config, &args).await,
        Commands::Register(args) => register::run_register(&config, &args).await,
        Commands::Route(args) => route::run_route(&config, &args).await,
        Commands::Track(args) => track::run_track(&config, &args).await,
    }
}
