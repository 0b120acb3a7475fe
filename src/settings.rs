//! User settings loaded from `config.toml`.

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use docscout_scan::{DiscoverConfig, FilterSpec};

/// Settings file contents. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Pipeline tuning.
    pub discover: DiscoverConfig,
    /// Filter used when no filter flags are given on the command line.
    pub filter: Option<FilterSpec>,
}

impl Settings {
    /// Default location: `<config dir>/docscout/config.toml`.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("docscout").join("config.toml"))
    }

    /// Load settings from an explicit file, or from the default location if
    /// it exists. An explicit file that cannot be read is an error; a missing
    /// default file is not.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match Self::config_path() {
                Some(path) if path.is_file() => path,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)
            .wrap_err_with(|| format!("Failed to read config {}", path.display()))?;
        let settings = Self::from_toml(&content)
            .wrap_err_with(|| format!("Invalid config {}", path.display()))?;

        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content)?;
        settings
            .discover
            .validate()
            .map_err(color_eyre::eyre::Report::msg)?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docscout_scan::EntryErrorPolicy;

    #[test]
    fn test_empty_file_gives_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.filter.is_none());
    }

    #[test]
    fn test_full_file() {
        let settings = Settings::from_toml(
            r#"
            [discover]
            workers = 2
            entry_errors = "fail-fast"
            max_depth = 4

            [filter]
            include_extensions = ["md", "markdown"]
            exclude_dir_names = [".git"]
            "#,
        )
        .unwrap();

        assert_eq!(settings.discover.workers, 2);
        assert_eq!(settings.discover.entry_errors, EntryErrorPolicy::FailFast);
        assert_eq!(settings.discover.max_depth, Some(4));
        assert_eq!(settings.discover.result_queue, 100);

        let filter = settings.filter.unwrap();
        assert_eq!(filter.include_extensions, vec!["md", "markdown"]);
        assert!(filter.include_dir_names.is_empty());
    }

    #[test]
    fn test_rejects_zero_workers() {
        assert!(Settings::from_toml("[discover]\nworkers = 0\n").is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let temp = tempfile::TempDir::new().unwrap();
        assert!(Settings::load(Some(&temp.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_explicit_file_loads() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[discover]\nsort_results = false\n").unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert!(!settings.discover.sort_results);
    }
}
