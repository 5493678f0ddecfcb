//! File utility functions

use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Path argument that means "read standard input"
pub const STDIN_MARKER: &str = "-";

/// Expand a path string to an absolute path.
///
/// Handles:
/// - Tilde expansion: `~` or `~/path` -> home directory
/// - Relative paths and bare names -> joined onto the current directory
/// - Absolute paths: passed through unchanged
///
/// # Examples
///
/// ```text
/// expand_path("~/.stockroom")   // -> /home/user/.stockroom
/// expand_path("./filters.json") // -> /current/dir/./filters.json
/// expand_path("/etc/stockroom") // -> /etc/stockroom
/// ```
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();

    if path.is_empty() {
        return std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    }

    let expanded = if path == "~" {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(path))
    } else if let Some(rest) = path.strip_prefix("~/") {
        match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => PathBuf::from(path),
        }
    } else {
        PathBuf::from(path)
    };

    if expanded.is_relative() {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    } else {
        expanded
    }
}

/// Read text from a file, or from stdin when `path` is `None` or `-`
pub fn read_input(path: Option<&Path>) -> io::Result<String> {
    match path {
        Some(path) if path != Path::new(STDIN_MARKER) => {
            std::fs::read_to_string(expand_path(&path.to_string_lossy()))
        }
        _ => {
            let mut content = String::new();
            io::stdin().lock().read_to_string(&mut content)?;
            Ok(content)
        }
    }
}
