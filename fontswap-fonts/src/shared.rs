//! Discovery of the shared font set shipped in a resource directory.

use std::path::Path;

use fontdb::Database;

use crate::types::{AssetKind, AssetRef, FontAsset, FontData};

/// Load every font face found under `dir` as a typeface asset.
///
/// Faces are named after their first family name (PostScript name if the
/// face has none). Faces whose data cannot be parsed are skipped.
pub fn load_shared_fonts(dir: &Path) -> Vec<AssetRef> {
    let mut db = Database::new();
    db.load_fonts_dir(dir);
    log::info!("Loaded {} shared font faces from {:?}", db.len(), dir);

    db.faces()
        .filter_map(|face| {
            let name = face
                .families
                .first()
                .map(|(family, _)| family.clone())
                .unwrap_or_else(|| face.post_script_name.clone());

            let data = db
                .with_face_data(face.id, |bytes, index| {
                    FontData::new_with_index(bytes.to_vec(), index as usize)
                })
                .flatten();

            match data {
                Some(data) => Some(FontAsset::with_data(name, AssetKind::Typeface, data)),
                None => {
                    log::debug!("Skipping unreadable shared font face {}", name);
                    None
                }
            }
        })
        .collect()
}
