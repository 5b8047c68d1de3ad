//! Runtime configuration
//!
//! Everything is read from the environment; there is no config file.

use std::path::PathBuf;

/// Environment variable holding the SQLite database path
pub const DATABASE_PATH_VAR: &str = "COSTCHEF_DATABASE_PATH";
/// Environment variable overriding the log filter
pub const LOG_FILTER_VAR: &str = "COSTCHEF_LOG";
/// Log directive used when `COSTCHEF_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "costchef=info";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> Self {
        let database_path = match std::env::var(DATABASE_PATH_VAR) {
            Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => default_database_path(),
        };

        let log_filter = std::env::var(LOG_FILTER_VAR)
            .ok()
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Self {
            database_path,
            log_filter,
        }
    }
}

/// `<project>/data/costchef.db`, resolved from the executable location
fn default_database_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    // Go up from target/release or target/debug to project root
    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(grandparent) = path.parent().and_then(|p| p.parent()) {
            path = grandparent.to_path_buf();
        }
    }

    path.push("data");
    path.push("costchef.db");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path_ends_in_data_dir() {
        let path = default_database_path();
        assert!(path.ends_with("data/costchef.db"));
    }
}
