use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::MatchOptions;
use crate::highlight::HighlightMode;

const APP_NAME: &str = "pathrank";
const CONFIG_FILE: &str = "config.json";

/// Command-line defaults stored in the app data directory.
///
/// Only the binary reads this file; library callers pass [`MatchOptions`]
/// explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Results to print when `--limit` is not given (0 prints all)
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Worker thread cap. If 0, uses the number of CPU cores
    #[serde(default = "default_max_threads")]
    pub max_threads: usize,

    #[serde(default)]
    pub highlight_mode: HighlightMode,

    /// Delimiter separating excluded substrings in a query, empty to disable
    #[serde(default = "default_inverting_delimiter")]
    pub query_inverting_delimiter: String,

    #[serde(default)]
    pub unicode: bool,

    /// Case-sensitive matching for queries with uppercase letters
    #[serde(default = "default_smart_case")]
    pub smart_case: bool,
}

fn default_limit() -> usize {
    20
}

fn default_max_threads() -> usize {
    0 // 0 means use CPU count
}

fn default_inverting_delimiter() -> String {
    "!".to_string()
}

fn default_smart_case() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            max_threads: default_max_threads(),
            highlight_mode: HighlightMode::default(),
            query_inverting_delimiter: default_inverting_delimiter(),
            unicode: false,
            smart_case: default_smart_case(),
        }
    }
}

impl AppConfig {
    /// Load config from the app data directory, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&get_config_path()?)
    }

    /// Load config from `path`, or return default if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Save config to the app data directory
    pub fn save(&self) -> Result<PathBuf> {
        let config_path = get_config_path()?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create app data directory")?;
        }
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// Get the effective thread cap (resolves 0 to CPU count)
    pub fn effective_max_threads(&self) -> usize {
        if self.max_threads == 0 {
            crate::query::executor::hardware_threads()
        } else {
            self.max_threads
        }
    }

    /// Matching options seeded from this config
    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            limit: self.limit,
            max_threads: self.max_threads,
            highlight_mode: self.highlight_mode,
            query_inverting_delimiter: self.query_inverting_delimiter.clone(),
            unicode: self.unicode,
            smart_case: self.smart_case,
            ..MatchOptions::default()
        }
    }
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_app_data_dir()?.join(CONFIG_FILE))
}

/// Get the application data directory. It is not created here.
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    Ok(base.join(APP_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.limit, 20);
        assert_eq!(config.max_threads, 0);
        assert_eq!(config.query_inverting_delimiter, "!");
        assert!(!config.unicode);
    }

    #[test]
    fn test_app_config_effective_max_threads() {
        let mut config = AppConfig::default();

        // 0 should resolve to CPU count
        assert!(config.effective_max_threads() >= 1);

        // Explicit value should be used as-is
        config.max_threads = 4;
        assert_eq!(config.effective_max_threads(), 4);
    }

    #[test]
    fn test_app_config_partial_json() {
        // Should use defaults for missing fields
        let json = r#"{"limit": 5, "highlight_mode": "basic"}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.limit, 5);
        assert_eq!(config.highlight_mode, HighlightMode::Basic);
        assert_eq!(config.query_inverting_delimiter, "!");
    }

    #[test]
    fn test_app_config_empty_json() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let config = AppConfig {
            limit: 3,
            smart_case: false,
            ..AppConfig::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "limit = 3").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config file"));
    }

    #[test]
    fn test_match_options_from_config() {
        let config = AppConfig {
            limit: 7,
            unicode: true,
            ..AppConfig::default()
        };
        let options = config.match_options();
        assert_eq!(options.limit, 7);
        assert!(options.unicode);
        assert_eq!(options.query_inverting_delimiter, "!");
    }
}
