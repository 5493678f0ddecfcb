use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::config::SearchBackend;
use super::constants::{ENV_BACKEND, ENV_CONFIG, ENV_MAX_DEPTH};

#[derive(Parser)]
#[command(name = "stockroom")]
#[command(version, about = "Inventory search filter compiler", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Maximum filter nesting depth
    #[arg(long, global = true, env = ENV_MAX_DEPTH)]
    pub max_depth: Option<usize>,

    /// Backend to compile for
    #[arg(long, short = 'b', global = true, env = ENV_BACKEND, value_parser = parse_search_backend)]
    pub backend: Option<SearchBackend>,
}

/// Parse search backend from CLI/env string
fn parse_search_backend(s: &str) -> Result<SearchBackend, String> {
    match s.to_lowercase().as_str() {
        "elasticsearch" | "es" => Ok(SearchBackend::Elasticsearch),
        "sqlite" => Ok(SearchBackend::Sqlite),
        "postgres" | "postgresql" => Ok(SearchBackend::Postgres),
        "duckdb" => Ok(SearchBackend::Duckdb),
        "clickhouse" => Ok(SearchBackend::Clickhouse),
        _ => Err(format!(
            "Invalid backend '{}'. Valid options: elasticsearch, sqlite, postgres, duckdb, clickhouse",
            s
        )),
    }
}

#[derive(Subcommand, Clone, Debug, PartialEq)]
pub enum Commands {
    /// Parse a filter and print the compiled query (default command)
    Compile {
        /// Filter JSON file (reads stdin when omitted or `-`)
        file: Option<PathBuf>,

        /// Emit a complete `_search` request body (Elasticsearch only)
        #[arg(long)]
        request: bool,

        /// Page number for --request (1-based)
        #[arg(long, requires = "request")]
        page: Option<u32>,

        /// Page size for --request
        #[arg(long, requires = "request")]
        limit: Option<u32>,

        /// Print compact JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
    },
    /// List registered filter operators
    Operators,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub max_depth: Option<usize>,
    pub backend: Option<SearchBackend>,
}

impl From<&Cli> for CliConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            config: cli.config.clone(),
            max_depth: cli.max_depth,
            backend: cli.backend,
        }
    }
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig::from(&cli);
    (config, cli.command)
}
