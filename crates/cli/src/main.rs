//! CLI for the tenderly-core library
//!
//! Verifies and pushes smart contracts to Tenderly and queries account data.

use clap::{Parser, Subcommand};
use eyre::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tenderly_core::{
    ForkVerificationRequest, PluginConfig, VerificationOutcome, VerificationRequest,
    VerificationService,
};
use tracing::Level;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

/// Tenderly contract verification client
#[derive(Parser, Debug)]
#[command(name = "tenderly")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the plugin configuration
    #[arg(short, long, global = true, default_value = "tenderly.toml")]
    config: PathBuf,

    /// Output JSON to stdout
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all logging except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Project owning pushed contracts, defaults to the configured one
#[derive(Parser, Debug, Clone, Default)]
struct ProjectArgs {
    /// Project slug
    #[arg(long)]
    project: Option<String>,

    /// Account owning the project
    #[arg(long)]
    username: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List public networks
    Networks,

    /// Print the latest block number of a network
    BlockNumber {
        /// Network (chain) id
        network: String,
    },

    /// Verify contracts publicly
    Verify {
        /// JSON verification request
        #[arg(long)]
        request: PathBuf,
    },

    /// Push contracts to a project
    Push {
        /// JSON verification request
        #[arg(long)]
        request: PathBuf,

        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Verify contracts deployed on a fork
    VerifyFork {
        /// JSON fork verification request
        #[arg(long)]
        request: PathBuf,

        /// Fork id, defaults to the configured one
        #[arg(long)]
        fork: Option<String>,

        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Show the user owning the access key
    Whoami,

    /// List projects of a principal
    Projects {
        /// Principal id, defaults to the current user
        #[arg(long)]
        principal: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        Level::ERROR
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(log_level).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = tokio::runtime::Runtime::new()
        .context("Failed to create async runtime")
        .and_then(|runtime| runtime.block_on(run(cli)));

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            tracing::error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

/// Runs a command. `Ok(false)` means a verification did not succeed.
async fn run(cli: Cli) -> Result<bool> {
    let config = load_config(&cli.config)?;
    let service = VerificationService::new(config.api.clone(), config.credentials());
    let json = cli.json;

    match cli.command {
        Commands::Networks => {
            let networks = service.list_networks().await;
            if json {
                print_json(&networks)?;
            } else {
                for network in &networks {
                    println!("{}\t{}", network.id, network.name);
                }
            }
        }
        Commands::BlockNumber { network } => {
            let Some(block_number) = service.latest_block_number(&network).await else {
                return Ok(false);
            };
            if json {
                print_json(&serde_json::json!({ "block_number": block_number }))?;
            } else {
                println!("{block_number}");
            }
        }
        Commands::Verify { request } => {
            let request: VerificationRequest = read_request(&request)?;
            let outcome = service.verify_publicly(&request).await;
            return report_outcome(&outcome, json);
        }
        Commands::Push { request, project } => {
            let request: VerificationRequest = read_request(&request)?;
            let (project, username) = resolve_project(&config, project)?;
            let outcome = service.push_privately(&request, &project, &username).await;
            return report_outcome(&outcome, json);
        }
        Commands::VerifyFork {
            request,
            fork,
            project,
        } => {
            let request: ForkVerificationRequest = read_request(&request)?;
            let (project, username) = resolve_project(&config, project)?;
            let fork = fork
                .or_else(|| config.project.fork_id.clone())
                .ok_or_else(|| eyre::eyre!("No fork id given and project.fork_id is not set"))?;
            let outcome = service.verify_on_fork(&request, &project, &username, &fork).await;
            return report_outcome(&outcome, json);
        }
        Commands::Whoami => {
            let Some(principal) = service.principal().await else {
                return Ok(false);
            };
            if json {
                print_json(&principal)?;
            } else {
                println!("{} ({})", principal.username, principal.id);
            }
        }
        Commands::Projects { principal } => {
            let principal_id = match principal {
                Some(id) => id,
                None => match service.principal().await {
                    Some(principal) => principal.id,
                    None => return Ok(false),
                },
            };
            let projects = service.projects(&principal_id).await;
            if json {
                print_json(&projects)?;
            } else {
                for project in &projects {
                    println!("{}\t{}", project.slug, project.name);
                }
            }
        }
    }

    Ok(true)
}

/// Loads the config file, falling back to defaults when it does not exist
fn load_config(path: &Path) -> Result<PluginConfig> {
    if path.exists() {
        tracing::debug!("Loading config from {}", path.display());
        PluginConfig::from_file(path)
    } else {
        tracing::debug!("No config at {}, using defaults", path.display());
        Ok(PluginConfig::default())
    }
}

fn read_request<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Project and username from the flags, then from the config
fn resolve_project(config: &PluginConfig, args: ProjectArgs) -> Result<(String, String)> {
    let project = args
        .project
        .or_else(|| config.project.project.clone())
        .ok_or_else(|| eyre::eyre!("No project given and project.project is not set"))?;
    let username = args
        .username
        .or_else(|| config.project.username.clone())
        .ok_or_else(|| eyre::eyre!("No username given and project.username is not set"))?;
    Ok((project, username))
}

fn report_outcome(outcome: &VerificationOutcome, json: bool) -> Result<bool> {
    if json {
        print_json(outcome)?;
    } else if let VerificationOutcome::Verified { contracts, dashboard_url } = outcome {
        println!("✅ Verified {} contract(s)", contracts.len());
        for contract in contracts {
            match &contract.url {
                Some(url) => println!("   - {} ({})", contract.address, url),
                None => println!("   - {}", contract.address),
            }
        }
        if let Some(url) = dashboard_url {
            println!("📁 Project contracts: {url}");
        }
    } else {
        println!("❌ Verification failed");
    }

    Ok(outcome.is_success())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
