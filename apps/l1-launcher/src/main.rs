//! # L1 Launcher
//!
//! Command-line host for the L1 configuration wizard.

use anyhow::Context;
use clap::Parser;
use l1_launcher::cli::{HELP, cmd_status, cmd_write_genesis, run_session};
use l1_launcher::config::AppConfig;
use l1_launcher::driver::WizardDriver;
use l1_launcher::wallet::{ChainedWallet, EnvWallet, StaticWallet};
use l1_launcher_core::Wizard;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Interactive configuration wizard for custom L1 chains.
#[derive(Parser, Debug)]
#[command(name = "l1-launcher", version)]
#[command(about = "Configure a custom L1 and generate its genesis document")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read commands from a script file instead of stdin
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Write the generated genesis to this file when the session ends
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Wallet address used by the `wallet` command
    /// (falls back to the config file, then $L1_LAUNCHER_WALLET)
    #[arg(long)]
    wallet: Option<String>,

    /// Genesis derivation deadline in seconds (overrides the config file)
    #[arg(long)]
    timeout: Option<u64>,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level '{level}'"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let config = AppConfig::load_or_default(args.config.as_deref())?;
    let timeout = args
        .timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.session.genesis_timeout());

    let mut wallet = ChainedWallet::new();
    if let Some(addr) = args.wallet.clone().or_else(|| config.session.wallet.clone()) {
        wallet = wallet.with(StaticWallet::new(addr));
    }
    let wallet = wallet.with(EnvWallet::default());

    let driver = WizardDriver::new(Wizard::with_params(config.genesis.clone()), timeout);
    info!(timeout_secs = timeout.as_secs(), "session started");

    let mut stdout = std::io::stdout();
    match &args.script {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open script {}", path.display()))?;
            run_session(&driver, &wallet, BufReader::new(file), &mut stdout).await?;
        }
        None => {
            println!("{HELP}");
            run_session(&driver, &wallet, BufReader::new(tokio::io::stdin()), &mut stdout).await?;
        }
    }

    let wizard = driver.lock().await;
    println!("{}", cmd_status(&wizard, false)?);
    if let Some(path) = &args.output {
        cmd_write_genesis(&wizard, path)?;
        println!("genesis written to {}", path.display());
    }
    Ok(())
}
