//! Checkflow CLI - dependency-aware execution planning for validation
//! pipelines.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

mod commands;

use commands::CommandHandler;

#[derive(Parser)]
#[command(name = "checkflow")]
#[command(about = "Execution planner for quality-validation pipelines", long_about = None)]
struct Cli {
    /// Dependency config document backing the store
    #[arg(long, global = true, default_value = ".checkflow/dependencies.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add or overwrite a validation criterion
    Add {
        /// Criterion id
        id: String,
        /// Criterion config as JSON
        #[arg(long, default_value = "{}")]
        spec: String,
    },
    /// Remove a criterion (edges pointing at it are kept and reported)
    Remove {
        /// Criterion id
        id: String,
    },
    /// Show a single criterion
    Get {
        /// Criterion id
        id: String,
    },
    /// Dump the whole dependency graph
    Graph,
    /// Report cycles and missing references
    Validate,
    /// Generate execution plans
    Plan {
        #[command(subcommand)]
        plan: PlanCommands,
    },
    /// Write the graph to a config document
    Save {
        /// Target path (defaults to --config)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Replace the graph from a config document
    Load {
        /// Source path
        path: PathBuf,
    },
    /// Show read-only graph statistics
    Stats,
}

#[derive(Subcommand)]
enum PlanCommands {
    /// Linear execution order
    Order,
    /// Concurrency-bounded wave schedule
    Parallel {
        /// Maximum criteria per wave
        #[arg(long)]
        max_concurrency: Option<usize>,
        /// Resource profile as JSON (width defaults to its CPU count)
        #[arg(long)]
        resource_profile: Option<String>,
    },
    /// Wave schedule tuned to live system resources
    Adaptive {
        /// System resource snapshot as JSON (probed when omitted)
        #[arg(long)]
        system_info: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::WARN)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut handler = CommandHandler::open(&cli.config).await;

    let response = match cli.command {
        Commands::Add { id, spec } => {
            let response = match serde_json::from_str(&spec) {
                Ok(config) => handler.add_dependency(&id, &config),
                Err(e) => {
                    serde_json::json!({ "success": false, "error": format!("malformed criterion config: {e}") })
                }
            };
            if response["success"] == true {
                persist_after_mutation(&handler).await;
            }
            response
        }
        Commands::Remove { id } => {
            let response = handler.remove_dependency(&id);
            if response["success"] == true {
                persist_after_mutation(&handler).await;
            }
            response
        }
        Commands::Get { id } => handler.get_dependency(&id),
        Commands::Graph => handler.get_dependency_graph(),
        Commands::Validate => handler.validate_dependency_graph(),
        Commands::Plan { plan } => match plan {
            PlanCommands::Order => handler.generate_execution_plan(),
            PlanCommands::Parallel { max_concurrency, resource_profile } => {
                match parse_optional_json(resource_profile.as_deref()) {
                    Ok(profile) => {
                        handler.generate_parallel_plan(profile.as_ref(), max_concurrency)
                    }
                    Err(response) => response,
                }
            }
            PlanCommands::Adaptive { system_info } => {
                match parse_optional_json(system_info.as_deref()) {
                    Ok(info) => handler.generate_adaptive_plan(info.as_ref()),
                    Err(response) => response,
                }
            }
        },
        Commands::Save { path } => handler.save_config(path.as_deref()).await,
        Commands::Load { path } => {
            let response = handler.load_config(&path).await;
            if response["success"] == true {
                persist_after_mutation(&handler).await;
            }
            response
        }
        Commands::Stats => handler.get_visualization(),
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Keep the mutated store on disk; the command's own envelope already went
/// to the caller, so a persistence failure is only logged.
async fn persist_after_mutation(handler: &CommandHandler) {
    let response = handler.persist().await;
    if response["success"] == false {
        tracing::warn!(error = %response["error"], "failed to persist mutation");
    }
}

fn parse_optional_json(
    raw: Option<&str>,
) -> std::result::Result<Option<serde_json::Value>, serde_json::Value> {
    match raw {
        None => Ok(None),
        Some(raw) => serde_json::from_str(raw).map(Some).map_err(|e| {
            serde_json::json!({ "success": false, "error": format!("malformed JSON argument: {e}") })
        }),
    }
}
