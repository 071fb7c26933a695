//! Volcanology daemon
//!
//! Polls a Jenkins view, reduces its jobs to one status and drives lamps,
//! outlets and Photon functions to match.

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, Level};
use volcanology_core::telemetry::init_tracing;

use crate::config::DaemonConfig;

#[derive(Parser)]
#[command(name = "volcanologyd")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Scans Jenkins job status and activates indicators", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(env = "VOLCANOLOGY_CONFIG", default_value = "config/volcanology.toml")]
    config: PathBuf,

    /// Run a single scan cycle, print its outcome as JSON and exit
    #[arg(long)]
    once: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(cli.json, level);

    info!("startup volcanology");
    let config = DaemonConfig::load(&cli.config)?;
    let mut scanner = config.scanner()?;

    if cli.once {
        let outcome = scanner.tick().await.context("scan cycle failed")?;
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    let cycles = scanner
        .run(config.poll_interval(), async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "cannot listen for ctrl-c, running until killed");
                std::future::pending::<()>().await;
            }
        })
        .await;

    info!(cycles = cycles, "volcanology stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from(["volcanologyd", "/etc/volcanology.toml", "--once", "-v"])
            .unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/volcanology.toml"));
        assert!(cli.once);
        assert!(cli.verbose);
        assert!(!cli.json);
    }
}
