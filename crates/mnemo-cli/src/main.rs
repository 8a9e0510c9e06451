//! `mnemo` – command line entry point for the memory graph service.
//!
//! * `mnemo serve` resolves the configuration, checks that the graph is
//!   reachable, and serves the HTTP API until Ctrl-C or SIGTERM.
//! * `mnemo config init` writes a default `~/.mnemo/config.toml`.
//! * `mnemo config show` prints the resolved configuration, secrets redacted.

mod config;
mod telemetry;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use mnemo_memory::{GraphEngine, GraphRecordStore, MemoryService};
use mnemo_server::MemoryServer;
use tracing::{error, info};

/// Mnemo – CRUD, search and relationship API over a memory graph
#[derive(Parser)]
#[command(name = "mnemo")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Bind address (overrides config and MNEMO_HOST)
        #[arg(long)]
        host: Option<String>,
        /// Listening port (overrides config and MNEMO_PORT)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default configuration to ~/.mnemo/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the resolved configuration
    Show,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { host, port } => serve(host, port),
        Commands::Config { action: ConfigAction::Init { force } } => config_init(force),
        Commands::Config { action: ConfigAction::Show } => config_show(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// serve
// ─────────────────────────────────────────────────────────────────────────────

fn serve(host: Option<String>, port: Option<u16>) -> Result<(), String> {
    // Hold the guard until the server has stopped so pending spans flush.
    let _guard = telemetry::init_tracing("mnemo");

    let mut cfg = config::resolve()?;
    if let Some(host) = host {
        cfg.host = host;
    }
    if let Some(port) = port {
        cfg.port = port;
    }
    let bind_host = cfg.bind_host()?;
    info!(config = ?cfg, "configuration resolved");

    let engine = GraphEngine::new(cfg.graph_config());
    engine.verify().map_err(|e| {
        error!(error = %e, "graph engine unreachable");
        e.to_string()
    })?;
    info!(uri = %engine.config().uri, user = %engine.config().user, "graph engine ready");

    let server = MemoryServer::new(MemoryService::new(GraphRecordStore::new(engine)))
        .with_host(bind_host)
        .with_port(cfg.port);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start async runtime: {e}"))?;
    runtime
        .block_on(server.run_until(shutdown_signal()))
        .map_err(|e| e.to_string())
}

/// Resolve on Ctrl-C, or on SIGTERM where available.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received, draining requests");
}

// ─────────────────────────────────────────────────────────────────────────────
// config
// ─────────────────────────────────────────────────────────────────────────────

fn config_init(force: bool) -> Result<(), String> {
    let path = config::config_path();
    if path.exists() && !force {
        return Err(format!(
            "{} already exists (pass --force to overwrite)",
            path.display()
        ));
    }
    config::save(&config::Config::default())?;
    println!("  {} Configuration written to {}", "✓".green(), path.display().to_string().bold());
    Ok(())
}

fn config_show() -> Result<(), String> {
    let cfg = config::resolve()?;
    println!("{}", config::config_path().display().to_string().bold());
    println!("{cfg:#?}");
    Ok(())
}
