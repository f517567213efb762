use std::{io, path::Path};

use serde::{Deserialize, Serialize};

/// Configuration for parsing and writing ACU documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Currency assigned to a budget whose block omits `currency`.
    default_currency: String,

    /// Number of spaces per nesting level when writing ACU text.
    indent: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_currency: default_currency(),
            indent: default_indent(),
        }
    }
}

/// Errors raised while loading or saving a [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("Failed to access config file: {0}")]
    Io(#[from] io::Error),
    /// The file is not valid configuration TOML.
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    /// The configuration could not be rendered as TOML.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Currency used when a budget does not declare one.
    #[must_use]
    pub fn default_currency(&self) -> &str {
        &self.default_currency
    }

    /// Sets the default currency. The code is normalized to uppercase.
    pub fn set_default_currency(&mut self, currency: &str) {
        self.default_currency = currency.trim().to_uppercase();
    }

    /// Spaces per nesting level in written ACU text.
    #[must_use]
    pub const fn indent(&self) -> usize {
        self.indent
    }

    /// Sets the indentation width.
    pub const fn set_indent(&mut self, indent: usize) {
        self.indent = indent;
    }
}

fn default_currency() -> String {
    "PEN".to_string()
}

const fn default_indent() -> usize {
    2
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_currency")]
        default_currency: String,

        #[serde(default = "default_indent")]
        indent: usize,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                default_currency,
                indent,
            } => Self {
                default_currency,
                indent,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            default_currency: config.default_currency,
            indent: config.indent,
        }
    }
}
