//! Application configuration.
//!
//! Configuration is read from a TOML file and then overridden from the environment:
//! `WEFT_TOOLKIT` selects the toolkit and `WEFT_LOG` sets the log filter. Invalid values are
//! reported and replaced with their defaults, so a broken configuration never keeps an
//! application from starting.
//!
//! ```toml
//! toolkit = "gtk"
//! ellipsis = "..."
//! log = "weft=debug"
//!
//! [font]
//! family = "Cantarell"
//! size = 11.0
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{fmt, fs, io};
use weft_core::{Font, ToolkitType};

pub const TOOLKIT_VAR: &str = "WEFT_TOOLKIT";
pub const LOG_VAR: &str = "WEFT_LOG";

/// Errors loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// The default font for text layouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub family: String,
    pub size: f64,
}

impl Default for FontConfig {
    fn default() -> FontConfig {
        let font = Font::default();
        FontConfig {
            family: font.family,
            size: font.size,
        }
    }
}

impl FontConfig {
    pub fn to_font(&self) -> Font {
        Font::new(&self.family, self.size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// The toolkit to use; the platform’s native toolkit if unset.
    pub toolkit: Option<ToolkitType>,
    pub font: FontConfig,
    /// The marker appended to truncated text.
    pub ellipsis: String,
    /// An `env_logger` filter.
    pub log: String,
}

impl Default for AppConfig {
    fn default() -> AppConfig {
        AppConfig {
            toolkit: None,
            font: FontConfig::default(),
            ellipsis: "…".to_string(),
            log: "info".to_string(),
        }
    }
}

/// A problem found by [`AppConfig::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigIssue {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl AppConfig {
    pub fn from_toml(source: &str) -> Result<AppConfig, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<AppConfig, ConfigError> {
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = AppConfig::from_toml(&source)?;
        log::info!("loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Loads a configuration file if there is one, applies environment overrides and repairs
    /// invalid values. Problems are logged.
    pub fn load_or_default(path: Option<&Path>) -> AppConfig {
        let mut config = match path {
            Some(path) if path.exists() => AppConfig::load(path).unwrap_or_else(|err| {
                log::error!("{}; using the default configuration", err);
                AppConfig::default()
            }),
            Some(path) => {
                log::debug!("no configuration at {:?}, using defaults", path);
                AppConfig::default()
            }
            None => AppConfig::default(),
        };
        config.apply_env(|name| std::env::var(name).ok());
        config.sanitize();
        config
    }

    /// Applies overrides from environment variables, looked up with `var`.
    pub fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, var: F) {
        if let Some(value) = var(TOOLKIT_VAR) {
            match value.parse() {
                Ok(toolkit) => self.toolkit = Some(toolkit),
                Err(err) => log::warn!("ignoring {}: {}", TOOLKIT_VAR, err),
            }
        }
        if let Some(filter) = var(LOG_VAR) {
            self.log = filter;
        }
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.font.family.trim().is_empty() {
            issues.push(ConfigIssue {
                field: "font.family",
                message: "must not be empty".to_string(),
            });
        }
        if !(self.font.size.is_finite() && self.font.size > 0.) {
            issues.push(ConfigIssue {
                field: "font.size",
                message: format!("must be a positive number, not {}", self.font.size),
            });
        }
        if self.ellipsis.is_empty() {
            issues.push(ConfigIssue {
                field: "ellipsis",
                message: "must not be empty".to_string(),
            });
        }
        issues
    }

    /// Replaces every invalid field with its default.
    pub fn sanitize(&mut self) {
        let defaults = AppConfig::default();
        for issue in self.validate() {
            log::warn!("config: {}; using the default", issue);
            match issue.field {
                "font.family" => self.font.family = defaults.font.family.clone(),
                "font.size" => self.font.size = defaults.font.size,
                "ellipsis" => self.ellipsis = defaults.ellipsis.clone(),
                _ => (),
            }
        }
    }

    /// The configured toolkit, or the platform’s native one.
    pub fn selected_toolkit(&self) -> ToolkitType {
        self.toolkit.unwrap_or_else(ToolkitType::platform_default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_files() {
        let config = AppConfig::from_toml(
            r#"
            toolkit = "winforms"

            [font]
            size = 14.0
            "#,
        )
        .unwrap();
        assert_eq!(config.toolkit, Some(ToolkitType::WinForms));
        assert_eq!(config.font.size, 14.);
        assert_eq!(config.font.family, FontConfig::default().family);
        assert_eq!(config.ellipsis, "…");
    }

    #[test]
    fn rejects_unknown_toolkits() {
        let err = AppConfig::from_toml("toolkit = \"qt\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn environment_overrides_the_file() {
        let mut config = AppConfig {
            toolkit: Some(ToolkitType::Gtk),
            ..AppConfig::default()
        };
        config.apply_env(|name| match name {
            TOOLKIT_VAR => Some("cocoa".to_string()),
            LOG_VAR => Some("weft=trace".to_string()),
            _ => None,
        });
        assert_eq!(config.selected_toolkit(), ToolkitType::Cocoa);
        assert_eq!(config.log, "weft=trace");

        config.apply_env(|name| match name {
            TOOLKIT_VAR => Some("motif".to_string()),
            _ => None,
        });
        assert_eq!(config.toolkit, Some(ToolkitType::Cocoa));
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let mut config = AppConfig {
            font: FontConfig {
                family: " ".to_string(),
                size: -3.,
            },
            ellipsis: String::new(),
            ..AppConfig::default()
        };
        assert_eq!(config.validate().len(), 3);
        config.sanitize();
        assert!(config.validate().is_empty());
        assert_eq!(config.font, FontConfig::default());
        assert_eq!(config.ellipsis, "…");
    }

    #[test]
    fn missing_files_are_reported() {
        let err = AppConfig::load(Path::new("/nonexistent/weft.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        let config = AppConfig::load_or_default(Some(Path::new("/nonexistent/weft.toml")));
        assert_eq!(config.font, FontConfig::default());
    }
}
