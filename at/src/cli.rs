//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// AgentTeam - plan, code, test and review with a team of LLM agents
#[derive(Parser)]
#[command(
    name = "at",
    about = "Multi-agent software team: planner, coder, tester and reviewer",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the team on a requirement
    Run {
        /// Requirement text (use --file to read it from a file instead)
        #[arg(value_name = "REQUIREMENT", required_unless_present = "file")]
        requirement: Option<String>,

        /// Read the requirement from a file
        #[arg(short, long, conflicts_with = "requirement")]
        file: Option<PathBuf>,

        /// Maximum Code→Test→Review cycles (overrides team.max-iterations)
        #[arg(short, long)]
        max_iterations: Option<u32>,

        /// Output directory (overrides output.dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not write result files
        #[arg(long)]
        no_save: bool,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the effective configuration
    Config {
        /// Also validate it (API key, iteration cap, temperatures)
        #[arg(long)]
        validate: bool,
    },

    /// Print a prompt template, or list them
    Prompts {
        /// Template name (plan, code, test, review, system)
        name: Option<String>,
    },
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("agentteam")
        .join("logs")
        .join("agentteam.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Output format for run results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => {
                debug!(%s, "OutputFormat::from_str: unknown format");
                Err(format!("Unknown format: {}. Use: text or json", s))
            }
        }
    }
}
