use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::sql::SqlBackend;
use crate::domain::filters::{FieldSchema, ParseOptions};
use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_FILTER_MAX_DEPTH, DEFAULT_LIMIT,
    MAX_FILTER_MAX_DEPTH, MAX_PAGE_LIMIT,
};

// =============================================================================
// Search Backend Enum
// =============================================================================

/// Backend a filter is compiled for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchBackend {
    #[default]
    Elasticsearch,
    Sqlite,
    Postgres,
    Duckdb,
    Clickhouse,
}

impl SearchBackend {
    /// SQL backend, or `None` for Elasticsearch
    pub fn sql_backend(&self) -> Option<SqlBackend> {
        match self {
            SearchBackend::Elasticsearch => None,
            SearchBackend::Sqlite => Some(SqlBackend::Sqlite),
            SearchBackend::Postgres => Some(SqlBackend::Postgres),
            SearchBackend::Duckdb => Some(SqlBackend::Duckdb),
            SearchBackend::Clickhouse => Some(SqlBackend::Clickhouse),
        }
    }
}

impl fmt::Display for SearchBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchBackend::Elasticsearch => write!(f, "elasticsearch"),
            SearchBackend::Sqlite => write!(f, "sqlite"),
            SearchBackend::Postgres => write!(f, "postgres"),
            SearchBackend::Duckdb => write!(f, "duckdb"),
            SearchBackend::Clickhouse => write!(f, "clickhouse"),
        }
    }
}

// =============================================================================
// File Config
// =============================================================================

#[derive(Debug, Default, Clone, Deserialize)]
pub struct FilterFileConfig {
    pub max_depth: Option<usize>,
    pub schema: Option<FieldSchema>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchFileConfig {
    pub backend: Option<SearchBackend>,
    pub default_limit: Option<u32>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub filter: Option<FilterFileConfig>,
    pub search: Option<SearchFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    ///
    /// Schema entries are merged field by field.
    fn merge(&mut self, other: FileConfig) {
        // Filter
        if let Some(filter) = other.filter {
            let current = self.filter.get_or_insert_with(FilterFileConfig::default);
            if filter.max_depth.is_some() {
                tracing::trace!(max_depth = ?filter.max_depth, "Merging filter.max_depth");
                current.max_depth = filter.max_depth;
            }
            if let Some(schema) = filter.schema {
                tracing::trace!(fields = schema.len(), "Merging filter.schema");
                current
                    .schema
                    .get_or_insert_with(FieldSchema::default)
                    .extend(schema);
            }
        }

        // Search
        if let Some(search) = other.search {
            let current = self.search.get_or_insert_with(SearchFileConfig::default);
            if search.backend.is_some() {
                tracing::trace!(backend = ?search.backend, "Merging search.backend");
                current.backend = search.backend;
            }
            if search.default_limit.is_some() {
                tracing::trace!(limit = ?search.default_limit, "Merging search.default_limit");
                current.default_limit = search.default_limit;
            }
        }
    }
}

// =============================================================================
// Resolved Config
// =============================================================================

#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub max_depth: usize,
    pub schema: FieldSchema,
}

impl FilterConfig {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            max_depth: self.max_depth,
            schema: self.schema.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub backend: SearchBackend,
    pub default_limit: u32,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub filter: FilterConfig,
    pub search: SearchConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.stockroom/stockroom.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        Self::load_with_profile(cli, get_profile_config_path().as_deref())
    }

    /// Load with an explicit profile config path (`None` skips the profile layer)
    fn load_with_profile(cli: &CliConfig, profile_path: Option<&Path>) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Load from profile dir (~/.stockroom/stockroom.json) - skip if not exists
        if let Some(profile_path) = profile_path
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. Load from CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        Self::from_layers(cli, file_config)
    }

    /// Layer configs: defaults -> file config -> CLI/env overrides
    fn from_layers(cli: &CliConfig, file_config: FileConfig) -> Result<Self> {
        let file_filter = file_config.filter.unwrap_or_default();
        let file_search = file_config.search.unwrap_or_default();

        let filter = FilterConfig {
            max_depth: cli
                .max_depth
                .or(file_filter.max_depth)
                .unwrap_or(DEFAULT_FILTER_MAX_DEPTH),
            schema: file_filter.schema.unwrap_or_default(),
        };

        let search = SearchConfig {
            backend: cli.backend.or(file_search.backend).unwrap_or_default(),
            default_limit: file_search.default_limit.unwrap_or(DEFAULT_LIMIT),
        };

        let config = Self { filter, search };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.filter.max_depth == 0 || self.filter.max_depth > MAX_FILTER_MAX_DEPTH {
            anyhow::bail!(
                "Configuration error: filter.max_depth must be between 1 and {}, got {}",
                MAX_FILTER_MAX_DEPTH,
                self.filter.max_depth
            );
        }

        if self.search.default_limit == 0 || self.search.default_limit > MAX_PAGE_LIMIT {
            anyhow::bail!(
                "Configuration error: search.default_limit must be between 1 and {}, got {}",
                MAX_PAGE_LIMIT,
                self.search.default_limit
            );
        }

        Ok(())
    }
}

fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}
