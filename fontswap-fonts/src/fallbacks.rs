//! Fallback chain construction for the replacement typeface.
//!
//! The replacement usually only covers one script. Glyphs it lacks are looked
//! up in its fallback table, which is filled from the host's own locale fonts
//! and the shared font set.

use std::collections::HashSet;

use crate::types::{AssetRef, FontAsset};

/// Locales whose fonts are appended to the fallback table, in priority order.
pub const LOCALE_FALLBACK_ORDER: &[&str] = &["en", "ru"];

/// Append fallbacks to `replacement`'s fallback table.
///
/// `locale_fonts` are tried first (in order, `None` entries skipped), then
/// every font in `shared`. Entries already in the table, duplicates and the
/// replacement itself are skipped. Returns the number of entries added.
pub fn build_fallback_chain<I>(
    replacement: &FontAsset,
    locale_fonts: I,
    shared: &[AssetRef],
) -> usize
where
    I: IntoIterator<Item = Option<AssetRef>>,
{
    let mut table = replacement.fallback_table().write();

    let mut existing: HashSet<_> = table.iter().map(|font| font.id()).collect();
    existing.insert(replacement.id());

    let mut added = 0;
    let candidates = locale_fonts
        .into_iter()
        .flatten()
        .chain(shared.iter().cloned());
    for font in candidates {
        if existing.insert(font.id()) {
            log::debug!("Added fallback font: {}", font.name());
            table.push(font);
            added += 1;
        }
    }

    if added > 0 {
        log::info!(
            "Fallback chain for {}: added {}, total {}",
            replacement.name(),
            added,
            table.len()
        );
    }
    added
}
