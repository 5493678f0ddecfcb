// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "stockroom";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".stockroom";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "stockroom.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "STOCKROOM_CONFIG";

// =============================================================================
// Environment Variables
// =============================================================================

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "STOCKROOM_LOG";

/// Environment variable for the filter nesting limit
pub const ENV_MAX_DEPTH: &str = "STOCKROOM_MAX_DEPTH";

/// Environment variable for the compile backend
pub const ENV_BACKEND: &str = "STOCKROOM_BACKEND";

// =============================================================================
// Filters
// =============================================================================

/// Default maximum depth of a filter tree (root node is depth 1)
pub const DEFAULT_FILTER_MAX_DEPTH: usize = 16;

/// Upper bound accepted for a configured filter depth
pub const MAX_FILTER_MAX_DEPTH: usize = 64;

/// Maximum size of filter JSON text in bytes (64KB)
pub const MAX_FILTER_JSON_SIZE: usize = 64 * 1024;

// =============================================================================
// Pagination
// =============================================================================

/// Default page number (1-based)
pub const DEFAULT_PAGE: u32 = 1;

/// Highest page number a search request may ask for
pub const MAX_PAGE: u32 = 100;

/// Default page size
pub const DEFAULT_LIMIT: u32 = 50;

/// Largest page size a search request may ask for
pub const MAX_PAGE_LIMIT: u32 = 500;
