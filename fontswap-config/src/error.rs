//! Typed error variants for the fontswap-config crate.
//!
//! `Config::load_from` and `Config::save_to` return `anyhow::Result`; the
//! underlying failure is a `ConfigError` that callers can recover with
//! `downcast_ref` when they need to tell a missing file from a bad one.
//!
//! # Example
//!
//! ```rust,no_run
//! use fontswap_config::ConfigError;
//!
//! fn describe(e: &anyhow::Error) -> &'static str {
//!     match e.downcast_ref::<ConfigError>() {
//!         Some(ConfigError::Io(_)) => "io",
//!         Some(ConfigError::Parse(_)) => "parse",
//!         Some(ConfigError::Validation(_)) => "validation",
//!         None => "other",
//!     }
//! }
//! ```

use std::fmt;

/// Errors that can occur when loading, saving or validating configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// An I/O error occurred reading or writing the config file.
    Io(std::io::Error),

    /// The config file contained invalid YAML that could not be parsed.
    Parse(serde_yaml_ng::Error),

    /// A field value failed semantic validation.
    ///
    /// The inner string describes which field is invalid and why.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "I/O error reading config: {e}"),
            ConfigError::Parse(e) => write!(f, "YAML parse error in config: {e}"),
            ConfigError::Validation(msg) => write!(f, "Config validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Validation(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_yaml_ng::Error> for ConfigError {
    fn from(e: serde_yaml_ng::Error) -> Self {
        ConfigError::Parse(e)
    }
}
