//! CLI entry point for the stashd archiving service.
//!
//! This binary watches a directory tree and transparently archives every
//! new or modified file into a compressed, flattened location, recording
//! per-file compression statistics to a durable log.
//!
//! # Usage
//!
//! ```bash
//! stashd [OPTIONS] <COMMAND>
//!
//! # Watch monitored/ and archive into archive/ until interrupted
//! stashd run
//!
//! # Same, with explicit roots
//! stashd run --monitored /srv/inbox --archive /srv/cold
//!
//! # Archive the current contents of the tree once and exit
//! stashd sweep
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::Write;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stash_core::Config;
use stash_service::{sweep, Dispatcher, ServiceSnapshot};
use stash_watcher::{AcceptAll, SkipHidden};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Background service that archives new and modified files as gzip
/// streams and logs per-file compression statistics.
#[derive(Parser)]
#[command(name = "stashd", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// Directory tree to watch.
    ///
    /// Must exist before startup. Defaults to `monitored/`.
    #[arg(short, long, global = true, env = "STASHD_MONITORED")]
    monitored: Option<Utf8PathBuf>,

    /// Directory receiving compressed outputs.
    ///
    /// Must exist and be writable; never created. Defaults to `archive/`.
    #[arg(short, long, global = true, env = "STASHD_ARCHIVE")]
    archive: Option<Utf8PathBuf>,

    /// Append-only compression history log.
    ///
    /// Created on first append. Defaults to `service_history.log`.
    #[arg(long, global = true, env = "STASHD_HISTORY")]
    history: Option<Utf8PathBuf>,

    /// Optional JSON configuration file; flags override its values.
    #[arg(short, long, global = true, env = "STASHD_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Skip dotfile names instead of archiving them.
    #[arg(long, global = true)]
    skip_hidden: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Watch the tree and archive changes until interrupted.
    Run,

    /// Archive every file currently in the tree once, then exit.
    Sweep,
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `info` level by default.
/// Noisy crates are filtered to `warn` level.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{level},notify=warn,ignore=warn"))
    });

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_ansi(use_ansi))
        .with(filter)
        .init();
}

/// Builds a [`Config`] from the optional file and CLI overrides.
///
/// # Errors
///
/// Returns an error if the config file is unreadable, or if validation
/// fails: the watched root and archive root must both be pre-existing
/// directories.
fn build_config(cli: &Cli) -> color_eyre::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };

    if let Some(monitored) = &cli.monitored {
        config.archive.monitored_root.clone_from(monitored);
    }
    if let Some(archive) = &cli.archive {
        config.archive.archive_root.clone_from(archive);
    }
    if let Some(history) = &cli.history {
        config.archive.history_path.clone_from(history);
    }

    config.validate()?;
    Ok(config)
}

/// Cancels the token on ctrl-c or SIGTERM.
fn spawn_signal_listener(token: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => info!("Received ctrl-c, shutting down"),
                        _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                    }
                }
                Err(error) => {
                    tracing::warn!(%error, "Failed to install SIGTERM handler");
                    let _ = tokio::signal::ctrl_c().await;
                    info!("Received ctrl-c, shutting down");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received ctrl-c, shutting down");
        }

        token.cancel();
    });
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Runs the watch-and-archive service until interrupted.
///
/// # Errors
///
/// Returns an error for fatal-startup conditions only: watcher creation
/// failure or missing roots. Everything after startup is logged and
/// survived.
async fn run_service(config: Config, skip_hidden: bool) -> color_eyre::Result<()> {
    info!(
        monitored = %config.archive.monitored_root,
        archive = %config.archive.archive_root,
        "Starting watch service"
    );

    let dispatcher = if skip_hidden {
        Dispatcher::new(&config, SkipHidden)?
    } else {
        Dispatcher::new(&config, AcceptAll)?
    };

    let token = CancellationToken::new();
    spawn_signal_listener(token.clone());

    let snapshot = dispatcher.run(token).await?;
    print_summary(&snapshot);
    Ok(())
}

/// Archives the current tree once.
///
/// # Errors
///
/// Returns an error if the configured roots are missing.
async fn run_sweep(config: Config) -> color_eyre::Result<()> {
    info!(
        monitored = %config.archive.monitored_root,
        archive = %config.archive.archive_root,
        "Sweeping tree"
    );

    let snapshot = sweep(&config).await?;
    print_summary(&snapshot);
    Ok(())
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

/// Prints the final counters.
fn print_summary(snapshot: &ServiceSnapshot) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    let _ = writeln!(handle);
    let _ = writeln!(handle, "Archive Summary");
    let _ = writeln!(handle, "===============");
    let _ = writeln!(handle);
    let _ = writeln!(handle, "Files archived:    {}", snapshot.archived);
    let _ = writeln!(handle, "Skipped (empty):   {}", snapshot.skipped_empty);
    let _ = writeln!(handle, "Failures:          {}", snapshot.failed);
    let _ = writeln!(handle, "Directories:       {}", snapshot.directories);
    let _ = writeln!(handle, "Transport errors:  {}", snapshot.transport_errors);
    let _ = writeln!(handle, "Bytes in:          {}", snapshot.bytes_in);
    let _ = writeln!(handle, "Bytes out:         {}", snapshot.bytes_out);
    let _ = writeln!(handle, "Space saved:       {:.1}%", snapshot.saved_percent());
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Route to appropriate command
    let config = build_config(&cli)?;
    match &cli.command {
        Commands::Run => run_service(config, cli.skip_hidden).await,
        Commands::Sweep => run_sweep(config).await,
    }
}
