//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/sortree/sortree.toml`
//! 3. Explicit config file (`--config`)
//! 4. Environment variables: `SORTREE_*` prefix

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use config::{Config, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::ordering::ChildOrdering;

pub const ENV_PREFIX: &str = "SORTREE";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("config error: {message}")]
    Config { message: String },

    #[error("config file not found: {0}")]
    NotFound(PathBuf),
}

fn config_err(e: config::ConfigError) -> SettingsError {
    SettingsError::Config {
        message: e.to_string(),
    }
}

/// What part of a label children are compared by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Lexical,
    /// Labels that parse as numbers sort first, by value; the rest lexically
    Numeric,
    Length,
}

impl SortKey {
    pub fn compare(self, a: &str, b: &str, case_insensitive: bool) -> Ordering {
        match self {
            SortKey::Lexical => compare_lexical(a, b, case_insensitive),
            SortKey::Numeric => match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
                (Ok(x), Ok(y)) => x.total_cmp(&y),
                (Ok(_), Err(_)) => Ordering::Less,
                (Err(_), Ok(_)) => Ordering::Greater,
                (Err(_), Err(_)) => compare_lexical(a, b, case_insensitive),
            },
            SortKey::Length => a.chars().count().cmp(&b.chars().count()),
        }
    }
}

fn compare_lexical(a: &str, b: &str, case_insensitive: bool) -> Ordering {
    if case_insensitive {
        a.to_lowercase().cmp(&b.to_lowercase())
    } else {
        a.cmp(b)
    }
}

/// Unified configuration for sortree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub key: SortKey,
    pub descending: bool,
    pub case_insensitive: bool,
    /// Spaces per outline level
    pub indent: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            key: SortKey::Lexical,
            descending: false,
            case_insensitive: false,
            indent: 2,
        }
    }
}

/// Get the XDG config directory for sortree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "sortree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("sortree.toml"))
}

impl Settings {
    /// Load settings from the global config, an optional explicit file and `SORTREE_*` variables.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        Self::load_with(global_config_path().as_deref(), explicit, ENV_PREFIX)
    }

    /// Same as [`Settings::load`] with the global path and env prefix supplied by the caller.
    #[instrument(level = "debug")]
    pub fn load_with(
        global: Option<&Path>,
        explicit: Option<&Path>,
        env_prefix: &str,
    ) -> Result<Self, SettingsError> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("key", "lexical")
            .map_err(config_err)?
            .set_default("descending", defaults.descending)
            .map_err(config_err)?
            .set_default("case_insensitive", defaults.case_insensitive)
            .map_err(config_err)?
            .set_default("indent", defaults.indent as i64)
            .map_err(config_err)?;

        if let Some(global_path) = global {
            if global_path.exists() {
                debug!("loading global config {}", global_path.display());
                builder = builder.add_source(
                    File::from(global_path)
                        .format(FileFormat::Toml)
                        .required(false),
                );
            }
        }

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(SettingsError::NotFound(path.to_path_buf()));
            }
            debug!("loading config {}", path.display());
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;
        config.try_deserialize().map_err(config_err)
    }

    /// Apply command line overrides on top of loaded settings; `None` keeps the loaded value.
    pub fn with_overrides(
        mut self,
        key: Option<SortKey>,
        descending: Option<bool>,
        case_insensitive: Option<bool>,
        indent: Option<usize>,
    ) -> Self {
        if let Some(key) = key {
            self.key = key;
        }
        if let Some(descending) = descending {
            self.descending = descending;
        }
        if let Some(case_insensitive) = case_insensitive {
            self.case_insensitive = case_insensitive;
        }
        if let Some(indent) = indent {
            self.indent = indent;
        }
        self
    }

    /// The child ordering these settings describe.
    pub fn to_ordering(&self) -> ChildOrdering<String> {
        let key = self.key;
        let case_insensitive = self.case_insensitive;
        let ordering =
            ChildOrdering::custom(move |a: &String, b: &String| key.compare(a, b, case_insensitive));
        if self.descending {
            ordering.reversed()
        } else {
            ordering
        }
    }

    pub fn to_toml(&self) -> Result<String, SettingsError> {
        toml::to_string_pretty(self).map_err(|e| SettingsError::Config {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(SortKey::Lexical, "b", "a", Ordering::Greater)]
    #[case(SortKey::Numeric, "10", "9", Ordering::Greater)]
    #[case(SortKey::Numeric, "10", "x", Ordering::Less)]
    #[case(SortKey::Numeric, "y", "x", Ordering::Greater)]
    #[case(SortKey::Length, "abc", "zz", Ordering::Greater)]
    #[case(SortKey::Length, "ab", "zz", Ordering::Equal)]
    fn test_sort_key_compare(
        #[case] key: SortKey,
        #[case] a: &str,
        #[case] b: &str,
        #[case] expected: Ordering,
    ) {
        assert_eq!(key.compare(a, b, false), expected);
    }

    #[test]
    fn test_case_insensitive_lexical() {
        assert_eq!(SortKey::Lexical.compare("B", "a", false), Ordering::Less);
        assert_eq!(SortKey::Lexical.compare("B", "a", true), Ordering::Greater);
    }

    #[test]
    fn test_descending_ordering_reverses() {
        let settings = Settings {
            descending: true,
            ..Settings::default()
        };
        let ordering = settings.to_ordering();
        assert_eq!(
            ordering.compare(&"a".to_string(), &"b".to_string()),
            Ok(Ordering::Greater)
        );
    }

    #[test]
    fn test_with_overrides() {
        let settings =
            Settings::default().with_overrides(Some(SortKey::Length), Some(true), None, Some(4));
        assert_eq!(settings.key, SortKey::Length);
        assert!(settings.descending);
        assert!(!settings.case_insensitive);
        assert_eq!(settings.indent, 4);
    }

    #[test]
    fn test_with_overrides_can_switch_flags_off() {
        let loaded = Settings {
            descending: true,
            case_insensitive: true,
            ..Settings::default()
        };
        let settings = loaded.clone().with_overrides(None, Some(false), Some(false), None);
        assert!(!settings.descending);
        assert!(!settings.case_insensitive);

        let kept = loaded.with_overrides(None, None, None, None);
        assert!(kept.descending);
        assert!(kept.case_insensitive);
    }

    #[test]
    fn test_to_toml_contains_fields() {
        let toml = Settings::default().to_toml().unwrap();
        assert!(toml.contains("key = \"lexical\""));
        assert!(toml.contains("indent = 2"));
    }
}
