/*
[INPUT]:  CLI arguments, optional YAML configuration file, access token
[OUTPUT]: Registry listing or the result of one JSON-RPC call
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags or subcommands
*/

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bitski_sdk::bitski_provider::{NetworkRegistry, StaticTokenProvider};
use bitski_sdk::{EngineManagerConfig, ProviderEngineManager, ProviderOptions, SdkConfig};

#[derive(Parser, Debug)]
#[command(name = "bitski", version, about = "Authenticated JSON-RPC access to Bitski networks")]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn")]
    log_level: String,
    #[arg(long = "access-token", env = "BITSKI_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,
    #[arg(long = "client-id", env = "BITSKI_CLIENT_ID")]
    client_id: Option<String>,
    #[arg(long = "network", value_name = "NAME")]
    network: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the known networks
    Networks,
    /// Send one JSON-RPC call and print the result
    Call {
        method: String,
        /// JSON array or object of parameters
        #[arg(value_name = "PARAMS_JSON")]
        params: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    let config = load_config(&args)?;
    info!(client_id = %config.client_id, api_base_url = %config.api_base_url, "configuration loaded");

    match &args.command {
        Command::Networks => {
            let registry = NetworkRegistry::new(config.api_base_url.clone());
            for network in registry.networks() {
                println!(
                    "{:<10} chain_id={:<4} {}",
                    network.name.as_deref().unwrap_or("-"),
                    network.chain_id,
                    network.rpc_url
                );
            }
        }
        Command::Call { method, params } => {
            let params = parse_params(params.as_deref())?;
            let result = call(&config, &args, method, params).await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&result).context("encode result")?
            );
        }
    }

    Ok(())
}

async fn call(config: &SdkConfig, args: &Cli, method: &str, params: Value) -> Result<Value> {
    let tokens = Arc::new(StaticTokenProvider::new(args.access_token.clone()));
    let engine_config = EngineManagerConfig {
        client_id: config.client_id.clone(),
        registry: NetworkRegistry::new(config.api_base_url.clone()),
        default_polling_interval: config.polling_interval(),
        web_base_url: config.web_base_url.clone(),
        additional_headers: config.additional_headers.clone(),
        retry: config.retry_policy(),
        client: config.client_config(),
    };
    let manager = ProviderEngineManager::new(engine_config, tokens);

    let options = ProviderOptions {
        network_name: args.network.clone(),
        ..ProviderOptions::default()
    };
    let engine = manager.get_provider(options).context("resolve provider")?;
    info!(network = %engine.network().rpc_url, method, "sending call");

    let result = engine
        .request(method, params)
        .await
        .with_context(|| format!("{method} failed"))?;
    manager.stop_all();
    Ok(result)
}

fn parse_params(raw: Option<&str>) -> Result<Value> {
    match raw {
        None => Ok(Value::Array(Vec::new())),
        Some(raw) => serde_json::from_str(raw).context("PARAMS_JSON must be valid JSON"),
    }
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

fn load_config(args: &Cli) -> Result<SdkConfig> {
    let mut config = match &args.config_path {
        Some(path) => SdkConfig::from_file(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => {
            let client_id = args
                .client_id
                .clone()
                .context("--client-id or --config is required")?;
            SdkConfig::new(client_id)
        }
    };
    if let Some(client_id) = &args.client_id {
        config.client_id = client_id.clone();
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}
