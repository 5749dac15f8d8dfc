use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::info;
use std::fs;
use std::path::PathBuf;

use toolset::{ErrorClass, ToolsetContract, ToolsetEvent, TraceScope};

mod cli;
mod config;

use cli::Cli;
use cli::calculator;
use cli::commands::Commands;
use config::Config;

fn setup_logging(level: Option<&str>) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("toolset")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("toolset.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // RUST_LOG, when set, overrides the configured level
    let mut builder = env_logger::Builder::new();
    if let Some(level) = level {
        builder.parse_filters(level);
    }
    builder
        .parse_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Describe { contract, version } => handle_describe_command(
            contract.as_ref().or(config.contract.as_ref()),
            version.as_deref(),
        ),
        Commands::Dispatch { request, version } => {
            handle_dispatch_command(request, version, config).await
        }
    }
}

fn handle_describe_command(path: Option<&PathBuf>, version: Option<&str>) -> Result<()> {
    let contract = match path {
        Some(path) => {
            info!("Describing contract from {}", path.display());
            ToolsetContract::from_file(path)
                .context(format!("Failed to load contract {}", path.display()))?
        }
        None => calculator::contract().context("Failed to build calculator contract")?,
    };

    println!("{} {} ({})", "Toolset:".green(), contract.name(), contract.uri());
    println!("  accepts:  {}", contract.accepts_event_type());
    println!("  complete: {}", contract.complete_event_type());
    println!("  error:    {}", contract.system_error_event_type());

    let mut shown = 0;
    for versioned in contract.versions() {
        if version.is_some_and(|v| v != versioned.version.to_string()) {
            continue;
        }
        shown += 1;

        println!(
            "{} {} ({})",
            "Version".cyan(),
            versioned.version,
            versioned.dataschema
        );
        for tool in versioned.registry().all() {
            println!("  {} - {}", tool.name.bold(), tool.description);
            let arguments = tool.argument_names();
            if !arguments.is_empty() {
                println!("    arguments: {}", arguments.join(", "));
            }
        }
    }

    if shown == 0 {
        return Err(eyre!(
            "Contract {} has no version {}",
            contract.name(),
            version.unwrap_or_default()
        ));
    }
    Ok(())
}

async fn handle_dispatch_command(request: &str, version: &str, config: &Config) -> Result<()> {
    let data: serde_json::Value = serde_json::from_str(request)
        .context("Request must be valid JSON")?;

    let toolset = calculator::build(&config.toolset)
        .context("Failed to build calculator toolset")?;
    let contract = toolset.contract();
    let event = ToolsetEvent::new(contract.accepts_event_type(), version, data)
        .with_source("toolset.cli")
        .with_dataschema(format!("{}/{}", contract.uri(), version));

    let span = tracing::info_span!("toolset.dispatch", toolset = contract.name(), version);
    let reply = match toolset.execute(event, TraceScope::new(span)).await {
        Ok(reply) => reply,
        Err(err) => {
            let label = match err.class() {
                ErrorClass::Fatal => "Aborted:",
                ErrorClass::Recoverable => "Rejected:",
                ErrorClass::Configuration => "Misconfigured:",
            };
            eprintln!("{} {}", label.red(), err);
            return Err(err).context("Dispatch failed");
        }
    };

    if reply.event_type == contract.system_error_event_type() {
        println!("{} {}", "Failed:".red(), reply.event_type);
    } else {
        println!("{} {}", "Completed:".green(), reply.event_type);
    }
    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref())
        .context("Failed to load configuration")?;

    // Setup logging at the configured level
    setup_logging(config.log_level.as_deref()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
