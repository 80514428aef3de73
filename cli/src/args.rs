//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Task table with statuses and agents
    Summary,
    /// The full project record as JSON
    Json,
}

/// CLI arguments for conclave
#[derive(Parser, Debug)]
#[command(name = "conclave")]
#[command(author, version, about = "Specialized agents work a goal through to reviewed results")]
#[command(long_about = r#"
Conclave hands a goal to a pool of specialized agents.

1. Decomposition: the goal is split into subtasks with dependencies
2. Assignment: each subtask goes to the agent whose capabilities match
3. Execution: agents work tasks once their dependencies are completed
4. Review: peers vote on results; a security rejection is a veto

Configuration files are loaded from (in priority order):
1. CONCLAVE_* environment variables (e.g. CONCLAVE_LLM__MODEL=llama3.1)
2. --config <path>        Explicit config file
3. ./conclave.toml        Project-level config
4. ~/.config/conclave/config.toml   Global config

Example:
  conclave "Build a REST API for orders with PostgreSQL storage"
  conclave --project shop -o json "Add password reset to the user service"
"#)]
pub struct Cli {
    /// The goal to work on
    pub goal: Option<String>,

    /// Project id (generated when omitted)
    #[arg(short, long, value_name = "ID")]
    pub project: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    pub output: OutputFormat,

    /// Stop waiting for tasks after this many seconds
    #[arg(long, value_name = "SECS", default_value_t = 600)]
    pub max_wait: u64,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["conclave", "Build an API"]);
        assert_eq!(cli.goal.as_deref(), Some("Build an API"));
        assert_eq!(cli.output, OutputFormat::Summary);
        assert_eq!(cli.max_wait, 600);
        assert_eq!(cli.verbose, 0);
        assert!(cli.project.is_none());
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from([
            "conclave",
            "-vv",
            "--project",
            "shop",
            "-o",
            "json",
            "--max-wait",
            "30",
            "--no-config",
            "Add search",
        ]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.project.as_deref(), Some("shop"));
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.max_wait, 30);
        assert!(cli.no_config);
    }
}
