//! order-desk command-line entry point
//!
//! `serve` runs the HTTP API, `validate` checks a JSON file of raw orders
//! and prints a per-record report.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use order_desk::config::{AppConfig, StorageConfig};
use order_desk::core::catalog::Catalog;
use order_desk::ingest::ingest_file;
use order_desk::server::ServerBuilder;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "order-desk", version, about = "Validate and clean raw customer orders")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true, env = "ORDER_DESK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Override the bind address from the configuration
        #[arg(long)]
        bind: Option<String>,
    },

    /// Validate a JSON file of raw orders and print a report
    Validate {
        /// Path to a JSON array of order records
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(2);
        }
    };

    init_logging(&config);

    if let Err(e) = run(cli, config).await {
        tracing::error!(error = %e, "order-desk failed");
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let config = match &cli.config {
        Some(path) => AppConfig::from_yaml_file(path)?,
        None => AppConfig::default(),
    };
    Ok(config.with_env_overrides()?)
}

/// `RUST_LOG` wins over the configured level
fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli, mut config: AppConfig) -> Result<()> {
    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind = bind;
                config.bind_addr()?;
            }
            serve(config).await
        }
        Commands::Validate { file } => {
            let report = ingest_file(&file)
                .with_context(|| format!("Failed to ingest {}", file.display()))?;
            println!("Loading orders from: {}\n", file.display());
            print!("{}", report);
            Ok(())
        }
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    let catalog = Catalog::default_catalog()?;

    let builder = ServerBuilder::new()
        .with_cors_origins(config.cors_origins.clone())
        .with_catalog(catalog.clone());
    let builder = with_storage(builder, &config.storage).await?;
    let builder = with_extractor(builder, &config, &catalog)?;

    builder.serve(&config.bind).await
}

async fn with_storage(builder: ServerBuilder, storage: &StorageConfig) -> Result<ServerBuilder> {
    match storage {
        StorageConfig::Memory => {
            use order_desk::storage::{InMemoryOrderStore, InMemoryProductStore};

            tracing::info!("using in-memory storage");
            Ok(builder
                .with_order_service(InMemoryOrderStore::new())
                .with_product_service(InMemoryProductStore::new()))
        }
        #[cfg(feature = "sqlite")]
        StorageConfig::Sqlite { database_url } => {
            use order_desk::storage::sqlite::{
                SqliteOrderStore, SqliteProductStore, connect, ensure_schema,
            };

            let pool = connect(database_url).await?;
            ensure_schema(&pool).await?;
            tracing::info!(database_url = %database_url, "using sqlite storage");
            Ok(builder
                .with_order_service(SqliteOrderStore::new(pool.clone()))
                .with_product_service(SqliteProductStore::new(pool)))
        }
        #[cfg(not(feature = "sqlite"))]
        StorageConfig::Sqlite { .. } => Err(anyhow::anyhow!(
            "sqlite storage requires building with the `sqlite` feature"
        )),
    }
}

#[cfg(feature = "llm")]
fn with_extractor(
    builder: ServerBuilder,
    config: &AppConfig,
    catalog: &Catalog,
) -> Result<ServerBuilder> {
    use order_desk::extraction::openai::{OpenAiExtractor, OpenAiSettings};
    use std::sync::Arc;

    let Some(llm) = &config.llm else {
        tracing::info!("no llm section configured, /extract-order disabled");
        return Ok(builder);
    };
    let Some(api_key) = llm.api_key() else {
        tracing::warn!(
            variable = %llm.api_key_env,
            "API key variable is unset, /extract-order disabled"
        );
        return Ok(builder);
    };

    let extractor = OpenAiExtractor::new(
        OpenAiSettings {
            endpoint: llm.endpoint.clone(),
            model: llm.model.clone(),
            api_key,
            timeout_ms: llm.timeout_ms,
        },
        &catalog.list(),
    )?;
    tracing::info!(model = %llm.model, "order extraction enabled");
    Ok(builder.with_extractor(Arc::new(extractor)))
}

#[cfg(not(feature = "llm"))]
fn with_extractor(
    builder: ServerBuilder,
    config: &AppConfig,
    _catalog: &Catalog,
) -> Result<ServerBuilder> {
    if config.llm.is_some() {
        tracing::warn!("llm section ignored: built without the `llm` feature");
    }
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_validate() {
        let cli = Cli::try_parse_from(["order-desk", "validate", "orders.json"]).unwrap();
        match cli.command {
            Commands::Validate { file } => assert_eq!(file, PathBuf::from("orders.json")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_parses_serve_with_config() {
        let cli = Cli::try_parse_from([
            "order-desk",
            "serve",
            "--bind",
            "0.0.0.0:9000",
            "--config",
            "desk.yaml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("desk.yaml")));
        assert!(matches!(cli.command, Commands::Serve { bind: Some(_) }));
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["order-desk"]).is_err());
    }
}
