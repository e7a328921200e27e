//! staticpush: publish a static site build directory to blob storage.
//!
//! Configuration comes from the environment (and `.env`); flags override it.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use staticpush_cli::{init_tracing, ConfigOverrides};
use staticpush_core::DeployConfig;
use staticpush_deploy::{alter_cors, set_wildcard_cors, DeployOptions, Deployer};
use staticpush_storage::{create_storage, Storage};

#[derive(Parser)]
#[command(name = "staticpush", about = "Deploy a static site to blob storage")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sanitize, upload and optionally clear the container first
    Deploy(DeployArgs),
    /// Print the upload targets without changing anything
    Plan(DeployArgs),
    /// Container CORS policy
    Cors {
        #[command(subcommand)]
        sub: CorsCommands,
    },
}

#[derive(Subcommand)]
enum CorsCommands {
    /// Print the current policy
    Show,
    /// Replace all rules with GET from any origin
    Wildcard,
    /// Remove all rules
    Clear,
}

#[derive(Args)]
struct DeployArgs {
    /// Build output directory
    #[arg(long)]
    source: Option<PathBuf>,
    /// Delete every object in the container before uploading
    #[arg(long)]
    clear: bool,
    /// Comma separated extensions to gzip
    #[arg(long)]
    gzip_extensions: Option<String>,
    /// Cache-Control max-age in seconds
    #[arg(long)]
    max_age: Option<u64>,
    /// Content type for unknown extensions
    #[arg(long)]
    default_content_type: Option<String>,
    /// Maximum concurrent uploads and deletes
    #[arg(long)]
    concurrency: Option<usize>,
    /// JSON file of extension to content type overrides
    #[arg(long)]
    content_types: Option<PathBuf>,
}

impl From<DeployArgs> for ConfigOverrides {
    fn from(args: DeployArgs) -> Self {
        ConfigOverrides {
            source: args.source,
            clear: args.clear,
            gzip_extensions: args.gzip_extensions,
            max_age: args.max_age,
            default_content_type: args.default_content_type,
            concurrency: args.concurrency,
            content_types: args.content_types,
        }
    }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

fn load_config(overrides: ConfigOverrides) -> anyhow::Result<DeployConfig> {
    let mut config = DeployConfig::from_env().context("Failed to load configuration")?;
    overrides.apply(&mut config);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn build_deployer(config: &DeployConfig) -> anyhow::Result<Deployer> {
    let options = DeployOptions::from_config(config)?;
    let storage = create_storage(&config.storage)
        .await
        .context("Failed to initialize storage")?;
    Ok(Deployer::new(storage, options))
}

async fn deploy(args: DeployArgs) -> anyhow::Result<()> {
    let config = load_config(args.into())?;
    let deployer = build_deployer(&config).await?;

    let cancel = deployer.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight operations");
            cancel.cancel();
        }
    });

    match deployer.run().await {
        Ok(report) => print_json(&report),
        Err(e) => {
            // Partial results: which keys failed, and which were never started.
            if let Some(report) = e.batch_report() {
                print_json(report)?;
            }
            Err(e.into())
        }
    }
}

async fn plan(args: DeployArgs) -> anyhow::Result<()> {
    let config = load_config(args.into())?;
    let deployer = build_deployer(&config).await?;
    let targets = deployer.plan().await?;
    print_json(&targets)
}

async fn cors(sub: CorsCommands) -> anyhow::Result<()> {
    let config = load_config(ConfigOverrides::default())?;
    let storage: Arc<dyn Storage> = create_storage(&config.storage)
        .await
        .context("Failed to initialize storage")?;

    let policy = match sub {
        CorsCommands::Show => storage.cors_policy().await?,
        CorsCommands::Wildcard => set_wildcard_cors(storage.as_ref()).await?,
        CorsCommands::Clear => alter_cors(storage.as_ref(), |_| None).await?,
    };
    print_json(&policy)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Deploy(args) => deploy(args).await,
        Commands::Plan(args) => plan(args).await,
        Commands::Cors { sub } => cors(sub).await,
    }
}
