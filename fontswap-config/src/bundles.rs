//! Font bundle directory scanning and selection reconciliation.

use std::fs;
use std::path::Path;

use crate::settings::Config;

/// List candidate font bundle file names in `dir` (top level only).
///
/// Names are deduplicated case-insensitively and returned sorted. A missing or
/// unreadable directory yields an empty list.
pub fn scan_font_bundles(dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Cannot scan font directory {:?}: {}", dir, e);
            return Vec::new();
        }
    };

    let mut names: Vec<String> = Vec::new();
    for entry in entries.flatten() {
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.is_empty() || names.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
            continue;
        }
        names.push(name);
    }

    names.sort_by_key(|n| n.to_lowercase());
    log::debug!("Found {} font bundles in {:?}", names.len(), dir);
    names
}

/// Make `config.font_bundle` point at one of `names`.
///
/// Keeps the current selection when it is present (case-insensitive, taking
/// the on-disk spelling), otherwise selects the first scanned bundle. Returns
/// the selected index, or `None` when `names` is empty (the selection is left
/// untouched).
pub fn reconcile_selection(config: &mut Config, names: &[String]) -> Option<usize> {
    if let Some(idx) = names
        .iter()
        .position(|n| n.eq_ignore_ascii_case(&config.font_bundle))
    {
        if names[idx] != config.font_bundle {
            config.font_bundle = names[idx].clone();
        }
        return Some(idx);
    }

    let first = names.first()?;
    log::info!(
        "Configured font bundle {:?} not found, selecting {:?}",
        config.font_bundle,
        first
    );
    config.font_bundle = first.clone();
    Some(0)
}
