mod acquire;
mod config;
mod configure;
mod drivers;
mod error;
mod facts;
mod models;
mod parsers;
mod reconcile;
mod registry;
mod render;
mod utils;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{read_puppetdb_hosts, read_switch_connect_options, Config};

/// Label switch ports from host facts
#[derive(Parser, Debug)]
#[command(name = "switchportlabel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Data directory (overrides DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture CLI output from every switch in switches.toml
    AcquireSwitches,
    /// Fetch host facts from every fact store in puppetdb.toml
    AcquirePuppetdb,
    /// Print the label changes per switch
    Configure,
    /// Push the label changes to the switches and save them
    ConfigureApply,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing; stdout is reserved for rendered configuration
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "switchportlabel=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut cfg = Config::load();
    if let Some(data_dir) = &cli.data_dir {
        cfg = cfg.with_data_dir(data_dir);
    }
    tracing::debug!("Data dir: {}", cfg.data_dir.display());

    match cli.command {
        Command::AcquireSwitches => {
            let inventory = read_switch_connect_options(&cfg.switches_inventory())
                .context("failed to read switch inventory")?;
            let failures = acquire::acquire_switches(&cfg, inventory).await?;
            if failures > 0 {
                bail!("{} switches could not be acquired", failures);
            }
        }
        Command::AcquirePuppetdb => {
            let hosts = read_puppetdb_hosts(&cfg.puppetdb_inventory())
                .context("failed to read fact-store inventory")?;
            let failures = acquire::acquire_puppetdb(&cfg, hosts).await?;
            if failures > 0 {
                bail!("{} fact stores could not be queried", failures);
            }
        }
        Command::Configure => configure::run(&cfg, false).await?,
        Command::ConfigureApply => configure::run(&cfg, true).await?,
    }

    Ok(())
}
