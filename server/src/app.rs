//! Core application

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value as JsonValue;

use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, DEFAULT_PAGE, ENV_LOG};
use crate::data::search::{ElasticsearchCompiler, QueryCompiler, SearchRequest, SqlCompiler};
use crate::domain::filters::{FilterNode, FilterParser, OperatorRegistry, registry};
use crate::utils::file::read_input;

/// Options of the `compile` command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompileArgs {
    /// Wrap the query in a paginated `_search` body
    pub request: bool,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub struct CoreApp {
    pub config: AppConfig,
    pub registry: &'static OperatorRegistry,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self::init(&cli_config)?;

        match command {
            Some(Commands::Operators) => {
                print!("{}", app.operators_table());
                Ok(())
            }
            Some(Commands::Compile {
                file,
                request,
                page,
                limit,
                compact,
            }) => {
                let args = CompileArgs {
                    request,
                    page,
                    limit,
                };
                app.compile_file(file.as_deref(), &args, compact)
            }
            None => app.compile_file(None, &CompileArgs::default(), false),
        }
    }

    pub fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        let registry = registry::global().context("Failed to build operator registry")?;

        tracing::debug!(
            operators = registry.len(),
            backend = %config.search.backend,
            max_depth = config.filter.max_depth,
            "Filter compiler initialized"
        );

        Ok(Self { config, registry })
    }

    pub fn parser(&self) -> FilterParser<'static> {
        FilterParser::new(self.registry, self.config.filter.parse_options())
    }

    /// Parse filter JSON text into a tree
    pub fn parse(&self, input: &str) -> Result<FilterNode> {
        self.parser().parse_str(input).context("Invalid filter")
    }

    /// Parse and compile filter JSON for the configured backend
    ///
    /// SQL backends produce `{"where": ..., "params": [...]}`.
    pub fn compile(&self, input: &str, args: &CompileArgs) -> Result<JsonValue> {
        let node = self.parse(input)?;
        let max_depth = self.config.filter.max_depth;

        if let Some(backend) = self.config.search.backend.sql_backend() {
            if args.request {
                anyhow::bail!(
                    "--request is only supported by the elasticsearch backend, not {}",
                    backend
                );
            }
            let compiler = SqlCompiler::for_backend(backend).with_max_depth(max_depth);
            let query = compiler.compile(&node)?;
            return serde_json::to_value(query).context("Failed to serialize SQL query");
        }

        let compiler = ElasticsearchCompiler::new(max_depth);
        if args.request {
            let request = SearchRequest::new(
                Some(node),
                args.page.unwrap_or(DEFAULT_PAGE),
                args.limit.unwrap_or(self.config.search.default_limit),
            )?;
            return Ok(request.to_body(&compiler)?);
        }

        Ok(compiler.compile(&node)?)
    }

    fn compile_file(&self, file: Option<&Path>, args: &CompileArgs, compact: bool) -> Result<()> {
        let input = read_input(file).with_context(|| match file {
            Some(path) => format!("Failed to read filter file: {}", path.display()),
            None => "Failed to read filter from stdin".to_string(),
        })?;

        let output = self.compile(&input, args)?;
        let rendered = if compact {
            serde_json::to_string(&output)?
        } else {
            serde_json::to_string_pretty(&output)?
        };
        println!("{}", rendered);
        Ok(())
    }

    /// One line per registered operator: marker and category
    pub fn operators_table(&self) -> String {
        self.registry
            .entries()
            .iter()
            .map(|entry| format!("{:<10} {}\n", entry.marker, entry.category))
            .collect()
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .compact()
            .with_env_filter(filter)
            .init();
    }
}
