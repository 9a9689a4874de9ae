//! The `Config` value set, validation and change diffing.

mod persistence;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Font override configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Master switch. When off no override is applied and originals are restored.
    #[serde(default = "crate::defaults::enabled")]
    pub enabled: bool,

    /// File name of the selected font bundle inside `font_dir`.
    #[serde(default = "crate::defaults::font_bundle")]
    pub font_bundle: String,

    /// Keep the original font for ASCII-only text containing Latin letters.
    #[serde(default = "crate::defaults::keep_original_latin")]
    pub keep_original_latin: bool,

    /// Keep the original font for ASCII-only text containing digits.
    #[serde(default = "crate::defaults::keep_original_digits")]
    pub keep_original_digits: bool,

    /// Locale key the override is active for (case-insensitive).
    #[serde(default = "crate::defaults::target_locale")]
    pub target_locale: String,

    /// Directory holding font bundles, relative to the plugin directory
    /// unless absolute.
    #[serde(default = "crate::defaults::font_dir")]
    pub font_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: crate::defaults::enabled(),
            font_bundle: crate::defaults::font_bundle(),
            keep_original_latin: crate::defaults::keep_original_latin(),
            keep_original_digits: crate::defaults::keep_original_digits(),
            target_locale: crate::defaults::target_locale(),
            font_dir: crate::defaults::font_dir(),
        }
    }
}

/// A single logical value that changed between two configs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigChange {
    Enabled(bool),
    FontBundle(String),
    /// Emitted once when either keep-original flag changes.
    KeepOriginal { latin: bool, digits: bool },
    TargetLocale(String),
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_font_bundle(mut self, name: impl Into<String>) -> Self {
        self.font_bundle = name.into();
        self
    }

    pub fn with_keep_original(mut self, latin: bool, digits: bool) -> Self {
        self.keep_original_latin = latin;
        self.keep_original_digits = digits;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Whether any content-based keep-original policy is configured.
    pub fn keeps_any_original(&self) -> bool {
        self.keep_original_latin || self.keep_original_digits
    }

    /// Check field values that serde cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_locale.trim().is_empty() {
            return Err(ConfigError::Validation(
                "target_locale must not be empty".to_string(),
            ));
        }

        let bundle = self.font_bundle.as_str();
        if bundle.contains('/') || bundle.contains('\\') || bundle == ".." || bundle == "." {
            return Err(ConfigError::Validation(format!(
                "font_bundle must be a bare file name, got {bundle:?}"
            )));
        }

        Ok(())
    }

    /// Resolve `font_dir` against the plugin directory.
    pub fn resolved_font_dir(&self, plugin_dir: &Path) -> PathBuf {
        let dir = Path::new(&self.font_dir);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            plugin_dir.join(dir)
        }
    }

    /// List the logical values that differ from `old` to `new`.
    pub fn diff(old: &Config, new: &Config) -> Vec<ConfigChange> {
        let mut changes = Vec::new();

        if old.enabled != new.enabled {
            changes.push(ConfigChange::Enabled(new.enabled));
        }
        if old.font_bundle != new.font_bundle {
            changes.push(ConfigChange::FontBundle(new.font_bundle.clone()));
        }
        if old.keep_original_latin != new.keep_original_latin
            || old.keep_original_digits != new.keep_original_digits
        {
            changes.push(ConfigChange::KeepOriginal {
                latin: new.keep_original_latin,
                digits: new.keep_original_digits,
            });
        }
        if !old.target_locale.eq_ignore_ascii_case(&new.target_locale) {
            changes.push(ConfigChange::TargetLocale(new.target_locale.clone()));
        }

        changes
    }
}
