//! Command line entry points.
//!
//! `watch` is the default: it spawns the poll loop and shows each refresh,
//! either in the full-screen dashboard or as plain text with `--plain`.
//! `status` runs a single cycle and exits non-zero when it fails. `relay`
//! serves the XML-RPC relay. `init` writes a `default.toml` holding the
//! built-in defaults. Every other command loads settings from the `--config`
//! directory, or from `CONFIG_PATH` when the flag is absent.

pub mod output;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::Settings;
use crate::dashboard::start_dashboard;
use crate::gateway;
use crate::monitoring::{DisplayModel, PollState, Poller};

#[derive(Parser)]
#[command(name = "cloud-pool-monitor")]
#[command(version)]
#[command(about = "Live view of cloud scheduler clusters and their VMs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding default.toml / local.toml
    #[arg(short, long, value_name = "CONFIG", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Poll continuously and show the live table (default)
    Watch {
        /// Print each refresh as text instead of the full-screen view
        #[arg(long)]
        plain: bool,
    },
    /// Poll once and print the result
    Status,
    /// Run the XML-RPC relay
    Relay {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Generate default configuration
    Init {
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Watch { plain: false })
    }

    /// The full-screen view owns the terminal, so it logs nothing by default.
    pub fn default_log_filter(&self) -> &'static str {
        match self.command() {
            Commands::Watch { plain: false } => "off",
            _ => "info",
        }
    }

    fn config_dir(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Settings::default_dir)
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let config_dir = cli.config_dir();

    if let Commands::Init { force } = cli.command() {
        return handle_init_command(&config_dir, force);
    }

    let settings = Settings::from_dir(&config_dir)?;

    match cli.command() {
        Commands::Watch { plain } => handle_watch_command(settings, plain).await,
        Commands::Status => handle_status_command(settings).await,
        Commands::Relay { port } => {
            let port = port.unwrap_or(settings.relay.port);
            let cancel = shutdown_on_ctrl_c();
            crate::api::serve(&settings.relay, port, cancel).await
        }
        Commands::Init { .. } => Ok(()),
    }
}

async fn handle_watch_command(settings: Settings, plain: bool) -> Result<()> {
    let gateway = gateway::from_settings(&settings)?;
    let endpoint = settings.monitor.endpoint.clone();
    let (poller, mut handle) = Poller::new(gateway, settings.monitor);

    let cancel = shutdown_on_ctrl_c();
    let task = poller.spawn(cancel.clone());

    let result = if plain {
        while let Some(frame) = handle.changed().await {
            if frame.state == PollState::Idle {
                print!("{}", output::format_frame(&frame));
            }
        }
        Ok(())
    } else {
        start_dashboard(handle, endpoint, cancel.clone()).await
    };

    if let Err(e) = &result {
        error!(error = %e, "Dashboard failed");
    }
    cancel.cancel();
    task.await?;
    result
}

async fn handle_status_command(settings: Settings) -> Result<()> {
    let gateway = gateway::from_settings(&settings)?;
    let (mut poller, _handle) = Poller::new(gateway, settings.monitor);

    let model = poller.run_cycle().await;
    print!("{}", output::format_model(&model));

    if matches!(model, DisplayModel::Error { .. }) {
        bail!("refresh failed");
    }
    Ok(())
}

fn handle_init_command(config_dir: &Path, force: bool) -> Result<()> {
    let target = config_dir.join("default.toml");
    if target.exists() && !force {
        bail!(
            "{} already exists. Use --force to overwrite.",
            target.display()
        );
    }

    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("creating {}", config_dir.display()))?;
    let config_str = toml::to_string_pretty(&Settings::default())?;
    std::fs::write(&target, config_str)?;

    info!(path = %target.display(), "Default configuration written");
    println!("{} Default configuration generated at {}", "✓".green(), target.display());
    Ok(())
}

fn shutdown_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            trigger.cancel();
        }
    });
    cancel
}
