use anyhow::{Context, Result};
use api_client::Connector;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// The main entry point for the Webtrekk connector command-line tool.
#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; credentials may come from the config file.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => configuration::load_config_from(path),
        None => configuration::load_config(),
    }
    .context("Failed to load the connector configuration")?;
    configuration::init_tracing(&settings.logging)?;

    let mut connector = Connector::new(&settings.connector)?;

    // Execute the appropriate command
    let output = match cli.command {
        Commands::TestConnection => connector.test_connection().await?,
        Commands::Accounts => serde_json::to_value(connector.list_accounts().await?)?,
        Commands::Login => {
            let token = connector.login().await?;
            serde_json::json!({
                "customerId": connector.customer_id(),
                "token": token,
            })
        }
        Commands::Objects => {
            connector.login().await?;
            connector.list_analysis_objects_and_metrics().await?
        }
        Commands::Analysis(args) => {
            let analysis_config = read_analysis_config(&args.file)?;
            connector.login().await?;
            connector.request_analysis(&analysis_config).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A command-line client for the Webtrekk / Mapp Analytics JSON-RPC API.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file (defaults to `connector.toml`).
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the endpoint is reachable.
    TestConnection,
    /// List the accounts available to the configured user.
    Accounts,
    /// Log in and print the session token.
    Login,
    /// Log in and list the available analysis objects and metrics.
    Objects,
    /// Log in and run an analysis query.
    Analysis(AnalysisArgs),
}

#[derive(Parser)]
struct AnalysisArgs {
    /// A JSON file holding the `analysisConfig` object.
    #[arg(long, short)]
    file: PathBuf,
}

fn read_analysis_config(path: &Path) -> Result<Value> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("{} is not valid JSON", path.display()))
}
