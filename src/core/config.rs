use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

/// Where the four CSV tables are read from.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum SourceConfig {
    /// Directory holding `actuals.csv`, `budget.csv`, `cash.csv` and `fx.csv`.
    Directory { path: String },
    /// Base URL serving `<base_url>/<table>.csv`.
    Http { base_url: String },
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Directory {
            path: "fixtures".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DisplayConfig {
    #[serde(default = "default_gross_margin_months")]
    pub gross_margin_months: usize,
    #[serde(default = "default_ebitda_months")]
    pub ebitda_months: usize,
}

fn default_gross_margin_months() -> usize {
    6
}

fn default_ebitda_months() -> usize {
    12
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            gross_margin_months: default_gross_margin_months(),
            ebitda_months: default_ebitda_months(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub source: SourceConfig,
    /// Restricts revenue vs budget to one entity.
    pub entity: Option<String>,
    /// Directory of CSV tables used when `source` fails to load.
    pub fallback_path: Option<String>,
    /// How long a loader keeps its dataset. Cached until invalidated when unset.
    ///
    /// The CLI loads once per invocation, so this only takes effect when a
    /// [`crate::providers::CachingLoader`] is reused within one process.
    pub cache_ttl_secs: Option<u64>,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl AppConfig {
    /// Loads the config at the default location, falling back to defaults when none exists.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(AppConfig::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "cfo-copilot", "cfo-copilot")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
source:
  path: "/data/fpa"
fallback_path: "fixtures"
entity: "EMEA"
cache_ttl_secs: 300
display:
  gross_margin_months: 3
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(
            config.source,
            SourceConfig::Directory {
                path: "/data/fpa".to_string()
            }
        );
        assert_eq!(config.entity.as_deref(), Some("EMEA"));
        assert_eq!(config.fallback_path.as_deref(), Some("fixtures"));
        assert_eq!(config.cache_ttl_secs, Some(300));
        assert_eq!(config.display.gross_margin_months, 3);
        assert_eq!(config.display.ebitda_months, 12);
    }

    #[test]
    fn test_http_source() {
        let yaml_str = r#"
source:
  base_url: "http://example.com/sheets"
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).unwrap();
        assert_eq!(
            config.source,
            SourceConfig::Http {
                base_url: "http://example.com/sheets".to_string()
            }
        );
        assert!(config.entity.is_none());
        assert!(config.fallback_path.is_none());
        assert!(config.cache_ttl_secs.is_none());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.display.gross_margin_months, 6);
        assert_eq!(config.source, SourceConfig::default());
    }

    #[test]
    fn test_load_from_missing_path_fails() {
        let result = AppConfig::load_from_path("/definitely/not/here.yaml");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }
}
