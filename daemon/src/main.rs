//! chainload: bootstrap, inspect and reset a wallet's local chain state.

mod wallet;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use chainload_bootstrap::{
    init_logging, BootstrapConfig, BootstrapLoader, HeaderChainConstructor, Orchestrator, Outcome,
};
use chainload_checkpoints::{load_from, FileSource};
use chainload_store::ValidHashStore;
use chainload_types::NetworkId;
use chainload_wallet_core::WalletState;

use crate::wallet::{FileWallet, WALLET_FILENAME};

#[derive(Parser)]
#[command(name = "chainload", about = "Local chain-state bootstrap and recovery")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "CHAINLOAD_CONFIG")]
    config: Option<PathBuf>,

    /// Private data directory holding the chain state files.
    #[arg(long, env = "CHAINLOAD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Network: "main", "test" or "regtest".
    #[arg(long, env = "CHAINLOAD_NETWORK")]
    network: Option<String>,

    /// Checkpoint bundle to apply to young header stores.
    #[arg(long, env = "CHAINLOAD_CHECKPOINTS")]
    checkpoints: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "CHAINLOAD_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "CHAINLOAD_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Bootstrap the chain state. Ctrl-C cancels at the next stage boundary.
    Run {
        /// Delete partially built chain state when cancelled.
        #[arg(long)]
        reset_on_cancel: bool,
    },
    /// Show which chain state files exist and where the wallet thinks it is.
    Status,
    /// Delete the header store and validated-hash cache.
    Reset,
    /// Parse a checkpoint bundle and summarise it.
    Checkpoints {
        /// Bundle file to inspect.
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;
    init_logging(config.log_format(), &config.log_level);

    match cli.command {
        Command::Run { reset_on_cancel } => run(config, reset_on_cancel).await,
        Command::Status => status(&config),
        Command::Reset => reset(&config),
        Command::Checkpoints { ref file } => inspect_checkpoints(file),
    }
}

fn build_config(cli: &Cli) -> anyhow::Result<BootstrapConfig> {
    let mut config = match &cli.config {
        Some(path) => BootstrapConfig::from_toml_file(path)?,
        None => BootstrapConfig::default(),
    };

    if let Some(network) = &cli.network {
        config.network = NetworkId::parse(network)
            .with_context(|| format!("unknown network {network:?}"))?;
    }
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(checkpoints) = &cli.checkpoints {
        config.checkpoints = Some(checkpoints.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    Ok(config)
}

async fn run(config: BootstrapConfig, reset_on_cancel: bool) -> anyhow::Result<()> {
    tracing::info!(
        network = config.network.as_str(),
        data_dir = %config.data_dir.display(),
        checkpoints = %config.checkpoints_path().display(),
        "starting chain state bootstrap"
    );

    let wallet = Arc::new(FileWallet::open_or_create(&config.data_dir.join(WALLET_FILENAME))?);
    let loader = BootstrapLoader::new(Orchestrator::new(&config, HeaderChainConstructor));
    let handle = loader.start(wallet.clone())?;

    let canceller = handle.canceller();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!(full_reset = reset_on_cancel, "received SIGINT, cancelling bootstrap");
            canceller.cancel(reset_on_cancel);
        }
    });

    match handle.outcome().await {
        Outcome::Ready(bundle) => {
            let head = bundle.chain_head();
            let validated = bundle.valid_hash_cache().len()?;
            println!("ready");
            println!("  chain head:       {} at height {}", head.hash(), head.height);
            println!("  validated hashes: {validated}");
            bundle.close();
            Ok(())
        }
        Outcome::Cancelled { full_reset } => {
            println!("cancelled (chain state {})", if full_reset { "deleted" } else { "kept" });
            Ok(())
        }
        Outcome::Failed(e) => Err(anyhow::Error::new(e).context("chain state bootstrap failed")),
    }
}

fn status(config: &BootstrapConfig) -> anyhow::Result<()> {
    let files = config.files();
    println!("network:        {}", config.network.as_str());
    println!("data dir:       {}", config.data_dir.display());
    println!("header store:   {}", describe_file(&files.header_store));
    println!("validated hash: {}", describe_file(&files.valid_hashes));

    let wallet_path = config.data_dir.join(WALLET_FILENAME);
    if wallet_path.is_file() {
        let wallet = FileWallet::open_or_create(&wallet_path)?;
        let hash = wallet
            .last_seen_block_hash()
            .map(|h| h.to_string())
            .unwrap_or_else(|| "none".to_string());
        println!("wallet height:  {}", wallet.last_seen_block_height());
        println!("wallet block:   {hash}");
        println!("transactions:   {}", wallet.transactions().len());
    } else {
        println!("wallet:         absent");
    }
    Ok(())
}

fn describe_file(path: &Path) -> String {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => format!("{} ({} bytes)", path.display(), meta.len()),
        _ => format!("{} (absent)", path.display()),
    }
}

fn reset(config: &BootstrapConfig) -> anyhow::Result<()> {
    config
        .files()
        .remove_all()
        .context("removing chain state files")?;
    println!("chain state removed; the wallet will rescan on the next run");
    Ok(())
}

fn inspect_checkpoints(file: &Path) -> anyhow::Result<()> {
    let set = load_from(&FileSource::new(file))
        .with_context(|| format!("loading checkpoints from {}", file.display()))?;
    let (earliest, latest) = (set.earliest(), set.latest());
    println!("checkpoints: {}", set.len());
    println!(
        "  earliest:  height {} time {} {}",
        earliest.height,
        earliest.timestamp(),
        earliest.hash()
    );
    println!(
        "  latest:    height {} time {} {}",
        latest.height,
        latest.timestamp(),
        latest.hash()
    );
    println!("  data hash: {}", hex::encode(set.data_hash()));
    Ok(())
}
