use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

mod cli;

use cli::output::{model_list, version_line};
use cli::{BANNER, Cli, Commands, normalize_args};
use llmstack::airbyte::run_dli_airbyte;
use llmstack::config::{Config, MODEL_CONFIG_KEY};
use llmstack::etl::run_etl_loader;
use llmstack::model::{CUSTOM_MODEL_KEY_NAME, get_model, list_supported_models, run_custom_model, run_http_server};
use llmstack::retriever::get_retriever;
use llmstack::server::ApiServer;
use llmstack::vectordb::get_vectordb;

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("llmstack")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("llmstack.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn load_config(config_file: Option<&Path>) -> Result<Config> {
    info!("Loading config from: {:?}", config_file);
    Config::load(config_file).context("Failed to load configuration")
}

async fn run_application(cli: &Cli) -> Result<()> {
    let config_file = cli.command.config_file().map(PathBuf::as_path);
    match &cli.command {
        Commands::Version => {
            println!("{}", version_line());
            Ok(())
        }
        Commands::ListModels => {
            println!("{}", model_list(&list_supported_models()));
            Ok(())
        }
        Commands::Start { .. } => handle_start_command(&load_config(config_file)?).await,
        Commands::Etl { .. } => handle_etl_command(&load_config(config_file)?),
        Commands::DliAirbyte { destination } => handle_dli_airbyte_command(destination),
        Commands::Server { .. } => handle_server_command(&load_config(config_file)?).await,
    }
}

async fn handle_start_command(config: &Config) -> Result<()> {
    let vectordb = get_vectordb(config).context("Failed to build vector database")?;
    let retriever = get_retriever(config, vectordb).context("Failed to build retriever")?;
    let model_name = config.section_name(MODEL_CONFIG_KEY)?;

    info!("Starting model {}", model_name);
    println!("{} {}", "Starting model:".green(), model_name);

    if model_name == CUSTOM_MODEL_KEY_NAME {
        run_custom_model(config, retriever).await?;
    } else {
        let model = get_model(model_name, config, retriever)?;
        run_http_server(model, &config.server).await?;
    }
    Ok(())
}

fn handle_etl_command(config: &Config) -> Result<()> {
    println!("{}", "Running ETL...".cyan());
    let report = run_etl_loader(config).context("ETL failed")?;
    println!(
        "{} {} chunks from {} files",
        "Loaded:".green(),
        report.chunks,
        report.files
    );
    Ok(())
}

fn handle_dli_airbyte_command(destination: &Path) -> Result<()> {
    println!("{} {}", "Setting up Airbyte in:".cyan(), destination.display());
    run_dli_airbyte(destination).context("Airbyte setup failed")?;
    Ok(())
}

async fn handle_server_command(config: &Config) -> Result<()> {
    let server = ApiServer::from_config(config).context("Failed to open prompt store")?;
    println!("{} http://{}", "Prompt engine API:".green(), config.server.addr());
    server.start(&config.server).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse_from(normalize_args(std::env::args()));

    println!("{}", BANNER);

    // Run the main application logic
    run_application(&cli).await.context("Application failed")?;

    Ok(())
}
