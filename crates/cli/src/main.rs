//! # unbound-warden
//!
//! Per-VLAN DNS resolver supervisor and query-log ingestion.

mod bootstrap;
mod commands;

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::error;

#[derive(Parser)]
#[command(name = "unbound-warden")]
#[command(version)]
#[command(about = "Per-VLAN recursive resolver supervisor with query-log ingestion")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Supervise one resolver per VLAN and ingest their query logs
    Run,

    /// Mirror the mesh-VPN host map into each VLAN's local include file
    SyncHosts {
        /// Update only this VLAN
        #[arg(long)]
        vlan_id: Option<u32>,

        /// Rewrite and reload even when nothing changed
        #[arg(short, long)]
        force: bool,

        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,

        /// Domain suffix override
        #[arg(long)]
        domain: Option<String>,
    },

    /// Fetch one blocklist and write its include file
    FetchBlocklist {
        /// Source name; becomes blacklists.d/<name>.conf
        name: String,
        url: String,

        #[arg(long, default_value_t = 0)]
        vlan_id: u32,
    },

    /// Rebuild every VLAN's blocklist include files from the store
    SyncBlocklists,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match bootstrap::config::load_config(cli.config.as_deref()) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    bootstrap::logging::init_logging(&config);

    let result = match cli.command {
        Command::Run => commands::run::execute(config).await,
        Command::SyncHosts {
            vlan_id,
            force,
            dry_run,
            domain,
        } => commands::sync_hosts::execute(config, vlan_id, force, dry_run, domain).await,
        Command::FetchBlocklist { name, url, vlan_id } => {
            commands::fetch_blocklist::execute(config, name, url, vlan_id).await
        }
        Command::SyncBlocklists => commands::sync_blocklists::execute(config).await,
    };

    if let Err(e) = result {
        error!(error = %e, "Fatal error");
        std::process::exit(1);
    }
}
