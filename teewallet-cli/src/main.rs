use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use teewallet_core::core_account::{Account, AccountKeypair, Ed25519Keypair};
use teewallet_core::logging::{init_logging_with_config, LogConfig};
use teewallet_core::{HttpConnector, WalletConfig, WalletStore, X25519ChannelCrypto};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "teewallet")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Runtime endpoint, overrides the config file
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Hex-encoded 32-byte account seed
    #[arg(long, env = "TEEWALLET_SEED", hide_env_values = true)]
    seed: Option<String>,

    /// Human-readable account address; defaults to the hex account id
    #[arg(long)]
    address: Option<String>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON formatted logging
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print runtime info from the endpoint
    Info,
    /// Run the channel handshake and print the wallet snapshot
    Connect,
    /// Refresh and print the free balance
    Balance,
    /// Refresh and print the asset list
    Assets,
    /// Refresh balance and assets, then print the wallet snapshot
    Refresh,
    /// Write the effective configuration to a file
    InitConfig {
        /// Destination path
        path: PathBuf,
    },
}

fn load_config(args: &Args) -> Result<WalletConfig> {
    let mut config = match &args.config {
        Some(path) => WalletConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => WalletConfig::default(),
    };
    config.apply_env()?;

    if let Some(endpoint) = &args.endpoint {
        config.runtime.endpoint = endpoint.clone();
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    config.logging.json_format |= args.json_logs;

    config.validate()?;
    Ok(config)
}

fn load_account(args: &Args) -> Result<Option<Account>> {
    let Some(seed) = &args.seed else {
        return Ok(None);
    };
    let keypair = Arc::new(Ed25519Keypair::from_seed_hex(seed).context("parsing account seed")?);
    let address = args
        .address
        .clone()
        .unwrap_or_else(|| format!("0x{}", hex::encode(keypair.public_key())));
    Ok(Some(Account::new(address, keypair)))
}

/// Run `fut` under the configured deadline, recording failures on the store
async fn run_step<T, F>(store: &WalletStore, timeout: Duration, step: &str, fut: F) -> Result<T>
where
    F: Future<Output = teewallet_core::WalletResult<T>>,
{
    let outcome = match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(e)) => anyhow::Error::new(e),
        Err(_) => anyhow::anyhow!("timed out after {timeout:?}"),
    };
    warn!(step, error = %outcome, "Wallet step failed");
    store.set_error(format!("{step}: {outcome}")).await;
    Err(outcome.context(format!("{step} failed")))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    // Level already validated by load_config.
    init_logging_with_config(LogConfig::from(&config.logging))?;
    teewallet_core::metrics::init_metrics();

    info!(endpoint = %config.runtime.endpoint, "teewallet started");

    if let Command::InitConfig { path } = &args.command {
        config.save_to_file(path)?;
        info!(path = %path.display(), "Configuration written");
        return Ok(());
    }

    let account = load_account(&args)?;
    if account.is_none() {
        warn!("No account seed given; encrypted queries will be refused");
    }

    let timeout = config.runtime.request_timeout;
    let store = WalletStore::new(
        config,
        account,
        Arc::new(X25519ChannelCrypto::new()),
        Arc::new(HttpConnector::new()),
    );

    match args.command {
        Command::Info => {
            store.bind_default_client()?;
            let info = run_step(&store, timeout, "info", store.refresh_info()).await?;
            print_json(&info)?;
        }
        Command::Connect => {
            run_step(&store, timeout, "handshake", store.establish()).await?;
            print_json(&store.snapshot().await)?;
        }
        Command::Balance => {
            run_step(&store, timeout, "handshake", store.establish()).await?;
            let main = run_step(&store, timeout, "balance", store.refresh_balance()).await?;
            print_json(&main)?;
        }
        Command::Assets => {
            run_step(&store, timeout, "handshake", store.establish()).await?;
            run_step(&store, timeout, "assets", store.refresh_assets()).await?;
            print_json(&store.asset_symbols().await)?;
        }
        Command::Refresh => {
            run_step(&store, timeout, "handshake", store.establish()).await?;
            run_step(&store, timeout, "refresh", store.refresh_all()).await?;
            print_json(&store.snapshot().await)?;
        }
        Command::InitConfig { .. } => {}
    }

    info!(latency_ms = store.latency().await, "teewallet finished");

    Ok(())
}
