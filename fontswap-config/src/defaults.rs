//! Default value functions for configuration.
//!
//! Used as `#[serde(default = "crate::defaults::...")]` attributes on `Config`
//! fields so that partial config files keep working.

pub fn enabled() -> bool {
    true
}

pub fn font_bundle() -> String {
    String::new() // No bundle selected until the directory scan picks one
}

pub fn keep_original_latin() -> bool {
    false
}

pub fn keep_original_digits() -> bool {
    false
}

pub fn target_locale() -> String {
    "ch".to_string()
}

pub fn font_dir() -> String {
    "Font".to_string()
}
