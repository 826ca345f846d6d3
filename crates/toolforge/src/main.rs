// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! toolforge - create, reuse, run and repair model-generated Python tools.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod commands;
mod doctor;
mod wiring;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use toolforge_config::ForgeConfig;
use toolforge_lifecycle::ToolManager;

/// toolforge - model-generated Python tools on demand.
#[derive(Parser, Debug)]
#[command(name = "toolforge", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, global = true)]
    plain: bool,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Arguments passed to a tool's entry point.
#[derive(Args, Debug, Clone)]
struct CallArgs {
    /// Positional arguments as a JSON array.
    #[arg(long, value_name = "JSON")]
    args: Option<String>,

    /// Keyword arguments as a JSON object.
    #[arg(long, value_name = "JSON")]
    kwargs: Option<String>,

    /// Do not ask the model to repair a failing tool.
    #[arg(long)]
    no_repair: bool,

    /// Repair attempts per call (defaults to lifecycle.max_repair_attempts).
    #[arg(long)]
    max_repairs: Option<u32>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reuse or create a tool for a task, then run it.
    Run {
        task: String,
        #[command(flatten)]
        call: CallArgs,
        /// Maximum distance for reusing a stored tool.
        #[arg(long)]
        threshold: Option<f32>,
    },
    /// Ask the model for a new tool.
    Create { task: String },
    /// Look up the closest stored tool.
    Find {
        description: String,
        #[arg(long)]
        threshold: Option<f32>,
    },
    /// Run a stored tool by name.
    Exec {
        name: String,
        #[command(flatten)]
        call: CallArgs,
    },
    /// Change a stored tool as described.
    Improve { name: String, request: String },
    /// List stored tools.
    List,
    /// Show a stored tool, including its code.
    Show { name: String },
    /// Delete a stored tool.
    Delete { name: String },
    /// Ask the model for a rewrite of a lifecycle module. Prints it only.
    ProposeFix { component: String, issue: String },
    /// Check configuration, model, embeddings, database and interpreter.
    Doctor,
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("toolforge={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => toolforge_config::load_and_validate_path(path),
        None => toolforge_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            toolforge_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.logging.log_level);

    let out = commands::Output::new(cli.plain, cli.json);
    let ok = match cli.command {
        Commands::Doctor => doctor::run_doctor(&config, &out).await,
        command => match wiring::build_manager(&config).await {
            Ok(manager) => {
                let ok = dispatch(&config, &manager, &out, command).await;
                manager.shutdown().await;
                ok
            }
            Err(e) => {
                out.error(&format!("startup failed: {e}"));
                false
            }
        },
    };
    exit_code(ok)
}

async fn dispatch(
    config: &ForgeConfig,
    manager: &ToolManager,
    out: &commands::Output,
    command: Commands,
) -> bool {
    match command {
        Commands::Run {
            task,
            call,
            threshold,
        } => commands::run(manager, out, &task, &call.into(), threshold).await,
        Commands::Create { task } => commands::create(manager, out, &task).await,
        Commands::Find {
            description,
            threshold,
        } => commands::find(manager, out, &description, threshold).await,
        Commands::Exec { name, call } => commands::exec(manager, out, &name, &call.into()).await,
        Commands::Improve { name, request } => {
            commands::improve(manager, out, &name, &request).await
        }
        Commands::List => commands::list(manager, out).await,
        Commands::Show { name } => commands::show(manager, out, &name).await,
        Commands::Delete { name } => commands::delete(manager, out, &name).await,
        Commands::ProposeFix { component, issue } => {
            commands::propose_fix(manager, out, &component, &issue).await
        }
        Commands::Doctor => doctor::run_doctor(config, out).await,
    }
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

impl From<CallArgs> for commands::CallOptions {
    fn from(call: CallArgs) -> Self {
        commands::CallOptions {
            args: call.args,
            kwargs: call.kwargs,
            repair: !call.no_repair,
            max_repairs: call.max_repairs,
        }
    }
}
