//! Configuration system for fontswap.
//!
//! This crate provides configuration loading, saving, and default values
//! for the font override. It includes:
//!
//! - The `Config` value set and its YAML persistence
//! - Per-value change notifications (`ConfigChange`) derived by diffing
//! - Font bundle directory scanning and selection reconciliation
//! - Configuration file watching

pub mod bundles;
pub mod defaults;
pub mod error;
pub mod settings;
#[cfg(feature = "watcher")]
pub mod watcher;

// Re-export main types for convenience
pub use bundles::{reconcile_selection, scan_font_bundles};
pub use error::ConfigError;
pub use settings::{Config, ConfigChange};
#[cfg(feature = "watcher")]
pub use watcher::{ConfigReloadEvent, ConfigWatcher};
