//! AgentTeam - multi-agent software team
//!
//! CLI entry point: runs the planner, coder, tester and reviewer agents on a
//! requirement and writes the results to disk.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use agentteam::cli::{Cli, Command, OutputFormat, get_log_path};
use agentteam::config::Config;
use agentteam::domain::RunId;
use agentteam::events::{EventBus, RunEvent, spawn_event_logger};
use agentteam::export::{ExportOptions, write_result};
use agentteam::llm::create_client;
use agentteam::orchestrator::{Orchestrator, OrchestratorConfig};
use agentteam::prompts::{PromptLoader, embedded};
use agentteam::report::{describe_event, summarize_result};
use agentteam::stage::llm_stages;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(model = %config.llm.model, "AgentTeam loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Run {
            requirement,
            file,
            max_iterations,
            output,
            no_save,
            format,
        } => {
            let requirement = read_requirement(requirement, file)?;
            let mut config = config;
            if let Some(max) = max_iterations {
                debug!(max, "main: overriding max_iterations");
                config.team.max_iterations = max;
            }
            if let Some(dir) = output {
                debug!(?dir, "main: overriding output dir");
                config.output.dir = dir;
            }
            cmd_run(&config, &requirement, !no_save, format).await
        }
        Command::Config { validate } => cmd_config(&config, validate),
        Command::Prompts { name } => cmd_prompts(&config, name.as_deref()),
    }
}

/// Requirement from the positional argument or a file
fn read_requirement(requirement: Option<String>, file: Option<PathBuf>) -> Result<String> {
    debug!(?file, "read_requirement: called");
    let text = match (requirement, file) {
        (_, Some(path)) => {
            fs::read_to_string(&path).context(format!("Failed to read requirement from {}", path.display()))?
        }
        (Some(text), None) => text,
        (None, None) => return Err(eyre::eyre!("No requirement given. Pass it as an argument or use --file.")),
    };
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(eyre::eyre!("Requirement is empty"));
    }
    Ok(text)
}

/// Run the team on a requirement
async fn cmd_run(config: &Config, requirement: &str, save: bool, format: OutputFormat) -> Result<()> {
    debug!(requirement_len = requirement.len(), save, ?format, "cmd_run: called");
    config.validate()?;

    let client = create_client(&config.llm).context("Failed to create LLM client")?;
    let stages = llm_stages(config, client);

    let bus = Arc::new(EventBus::with_default_capacity());
    let printer = tokio::spawn(print_progress(bus.subscribe()));
    let logger = save.then(|| spawn_event_logger(&config.output.dir, bus.subscribe()));

    // Ctrl-C stops the run at the next stage boundary
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling run");
            eprintln!("\n{} interrupt received, stopping after the current agent finishes", "!".yellow());
            let _ = cancel_tx.send(true);
        }
    });

    let orchestrator = Orchestrator::new(stages, OrchestratorConfig::from(&config.team))?
        .with_events(bus.clone())
        .with_cancellation(cancel_rx);

    let run_id = RunId::new(requirement);
    let result = orchestrator.run_with_id(&run_id, requirement).await?;

    // Close the bus so the consumers drain and exit
    drop(orchestrator);
    drop(bus);
    let _ = printer.await;
    if let Some(logger) = logger {
        let _ = logger.await;
    }

    if save {
        let options = ExportOptions::new(&config.output.dir).with_clean_code(config.output.clean_code);
        let exported = write_result(&result, &options)?;
        eprintln!("{} results saved to {}", "✓".green(), exported.dir.display());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => {
            println!();
            print!("{}", summarize_result(&result));
        }
    }

    if let Some(error) = &result.error {
        return Err(eyre::eyre!("Run {} failed: {}", result.run_id, error));
    }
    Ok(())
}

/// Print progress lines to stderr until the bus closes
async fn print_progress(mut rx: broadcast::Receiver<RunEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                if let Some(line) = describe_event(&event) {
                    eprintln!("{}", line);
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                debug!(n, "print_progress: lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Show (and optionally validate) the effective configuration
fn cmd_config(config: &Config, validate: bool) -> Result<()> {
    debug!(validate, "cmd_config: called");
    print!("{}", serde_yaml::to_string(config).context("Failed to serialize config")?);
    if validate {
        config.validate()?;
        println!("{} configuration is valid", "✓".green());
    }
    Ok(())
}

/// Print one prompt template, or list them all
fn cmd_prompts(config: &Config, name: Option<&str>) -> Result<()> {
    debug!(?name, "cmd_prompts: called");
    let loader = PromptLoader::from_dir(config.team.prompts_dir.as_deref());
    match name {
        Some(name) => {
            print!("{}", loader.load_template(name)?);
        }
        None => {
            println!("Prompt templates:");
            for name in embedded::NAMES {
                println!("  {}", name);
            }
            if let Some(dir) = &config.team.prompts_dir {
                println!("Overrides are read from {}", dir.display());
            }
        }
    }
    Ok(())
}
