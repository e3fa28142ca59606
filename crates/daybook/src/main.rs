// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daybook - inspect and operate the durable notification state.
//!
//! This is the binary entry point. Every command works against the SQLite
//! key-value store named by `[storage] database_path`.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod doctor;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use daybook_config::DaybookConfig;
use daybook_core::{Clock, DaybookError, SystemClock};

/// Daybook - inspect and operate the durable notification state.
#[derive(Parser, Debug)]
#[command(name = "daybook", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a reminder description and print the resulting offsets.
    ParseReminder {
        /// Free text ("15 minutes before") or a JSON reminder list.
        text: String,
    },
    /// Inspect the interaction deferred while the device was locked.
    Deferred {
        #[command(subcommand)]
        action: DeferredAction,
    },
    /// Inspect the replay ledger of processed interactions.
    Replay {
        #[command(subcommand)]
        action: ReplayAction,
    },
    /// Inspect native alarm bookkeeping.
    Alarms {
        #[command(subcommand)]
        action: AlarmsAction,
    },
    /// Show or toggle per-module notification handling.
    Modules {
        #[command(subcommand)]
        action: ModulesAction,
    },
    /// Run diagnostic checks against config and database.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

#[derive(Subcommand, Debug)]
enum DeferredAction {
    /// Print the pending interaction, if any.
    Show,
    /// Discard the pending interaction.
    Clear,
}

#[derive(Subcommand, Debug)]
enum ReplayAction {
    /// List live signatures with the time they were processed.
    List,
    /// Drop expired signatures.
    Prune,
    /// Forget every signature.
    Clear,
}

#[derive(Subcommand, Debug)]
enum AlarmsAction {
    /// List recorded alarm-clock reminders.
    List,
}

#[derive(Subcommand, Debug)]
enum ModulesAction {
    /// Show the effective switch for each known module.
    List,
    /// Turn notification handling on for a module.
    Enable { module: String },
    /// Turn notification handling off for a module.
    Disable { module: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => daybook_config::load_and_validate_path(path),
        None => daybook_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            daybook_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.app.log_level);

    #[cfg(feature = "prometheus")]
    let recorder = install_metrics(&config);

    if let Err(e) = run(cli.command, &config).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }

    #[cfg(feature = "prometheus")]
    if let Some(recorder) = recorder {
        tracing::debug!(metrics = %recorder.render(), "metrics at exit");
    }
}

async fn run(command: Option<Commands>, config: &DaybookConfig) -> Result<(), DaybookError> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    match command {
        Some(Commands::ParseReminder { text }) => {
            print!("{}", state::render_reminders(&text));
            Ok(())
        }
        Some(Commands::Doctor { plain }) => doctor::run_doctor(config, plain).await,
        Some(Commands::Deferred { action }) => match action {
            DeferredAction::Show => {
                state::with_store(config, |kv, _| state::deferred_show(kv, config, Utc::now()))
                    .await
            }
            DeferredAction::Clear => {
                state::with_store(config, |kv, _| state::deferred_clear(kv)).await
            }
        },
        Some(Commands::Replay { action }) => match action {
            ReplayAction::List => {
                state::with_store(config, |kv, _| state::replay_list(kv, config, clock)).await
            }
            ReplayAction::Prune => {
                state::with_store(config, |kv, _| state::replay_prune(kv, config, clock)).await
            }
            ReplayAction::Clear => {
                state::with_store(config, |kv, _| state::replay_clear(kv, config, clock)).await
            }
        },
        Some(Commands::Alarms {
            action: AlarmsAction::List,
        }) => state::with_store(config, |kv, _| state::alarms_list(kv)).await,
        Some(Commands::Modules { action }) => match action {
            ModulesAction::List => {
                state::with_store(config, |kv, keys| async move {
                    state::modules_list(kv, &keys, config).await
                })
                .await
            }
            ModulesAction::Enable { module } => {
                state::with_store(config, |kv, _| async move {
                    state::modules_set(kv, config, &module, true).await
                })
                .await
            }
            ModulesAction::Disable { module } => {
                state::with_store(config, |kv, _| async move {
                    state::modules_set(kv, config, &module, false).await
                })
                .await
            }
        },
        None => {
            println!("daybook: use --help for available commands");
            Ok(())
        }
    }
}

/// Initialize the tracing subscriber with an env filter.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("daybook={log_level},warn")));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(feature = "prometheus")]
fn install_metrics(config: &DaybookConfig) -> Option<daybook_prometheus::PrometheusRecorder> {
    if !config.metrics.enabled {
        return None;
    }
    match daybook_prometheus::PrometheusRecorder::install() {
        Ok(recorder) => Some(recorder),
        Err(e) => {
            tracing::warn!(error = %e, "metrics disabled");
            None
        }
    }
}
