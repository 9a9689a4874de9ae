//! Loading a replacement typeface out of a font bundle.
//!
//! A font bundle is a zip container holding one or more font files. The
//! typeface is picked by matching the bundle's base name against the entry
//! file stems, falling back to the first entry that parses as a font.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;
use zip::ZipArchive;

use crate::types::{AssetKind, FontAsset, FontData, ReplacementAsset};

/// File extensions treated as font entries inside a bundle.
pub const FONT_EXTENSIONS: &[&str] = &["ttf", "otf", "ttc"];

/// Upper bound on the buffer reserved from an entry's declared size.
const MAX_ENTRY_PREALLOC: u64 = 16 * 1024 * 1024;

/// Errors produced while loading a replacement from a font bundle.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no font bundle selected")]
    NoBundleSelected,

    #[error("failed to open font bundle {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read font bundle {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("font bundle {path} contains no usable font asset")]
    NoAsset { path: PathBuf },
}

/// Resolves bundle names to replacement assets inside a font directory.
#[derive(Debug, Clone)]
pub struct AssetResolver {
    font_dir: PathBuf,
}

impl AssetResolver {
    pub fn new(font_dir: impl Into<PathBuf>) -> Self {
        Self {
            font_dir: font_dir.into(),
        }
    }

    pub fn font_dir(&self) -> &Path {
        &self.font_dir
    }

    /// Full path of the bundle called `name`.
    pub fn bundle_path(&self, name: &str) -> PathBuf {
        self.font_dir.join(name)
    }

    /// Load the replacement typeface (and its native companion) from the
    /// bundle called `name`.
    ///
    /// # Errors
    /// Fails if no bundle name is given, the container cannot be opened or
    /// read, or it holds no entry that parses as a font.
    pub fn load_replacement(&self, name: &str) -> Result<ReplacementAsset, LoadError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LoadError::NoBundleSelected);
        }

        let path = self.bundle_path(name);
        let file = File::open(&path).map_err(|source| LoadError::Open {
            path: path.clone(),
            source,
        })?;
        let mut archive = ZipArchive::new(file).map_err(|source| LoadError::Archive {
            path: path.clone(),
            source,
        })?;

        let entries: Vec<String> = archive
            .file_names()
            .filter(|entry| is_font_entry(entry))
            .map(str::to_owned)
            .collect();

        let base = Path::new(name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string());

        for idx in entry_order(&entries, &base) {
            let entry = &entries[idx];
            let bytes = match read_entry(&mut archive, entry) {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::warn!("Skipping unreadable font entry {} in {:?}: {}", entry, path, e);
                    continue;
                }
            };

            let Some(data) = FontData::new(bytes) else {
                log::debug!("Skipping unparseable font entry {} in {:?}", entry, path);
                continue;
            };

            let asset_name = entry_stem(entry);
            let typeface = FontAsset::with_data(&asset_name, AssetKind::Typeface, data.clone());
            let companion = FontAsset::with_data(&asset_name, AssetKind::Native, data);
            log::info!(
                "Loaded font asset {} from {:?} (matched base name: {})",
                asset_name,
                path,
                asset_name.eq_ignore_ascii_case(&base)
            );
            return Ok(ReplacementAsset::new(typeface, Some(companion)));
        }

        Err(LoadError::NoAsset { path })
    }
}

fn is_font_entry(entry: &str) -> bool {
    if entry.ends_with('/') {
        return false;
    }
    Path::new(entry)
        .extension()
        .map(|ext| {
            FONT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

fn entry_stem(entry: &str) -> String {
    Path::new(entry)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| entry.to_string())
}

/// Order in which bundle entries are tried: entries whose stem matches
/// `base` first, then every other entry in container order.
pub(crate) fn entry_order(entries: &[String], base: &str) -> Vec<usize> {
    let (mut matched, rest): (Vec<usize>, Vec<usize>) = (0..entries.len())
        .partition(|&idx| entry_stem(&entries[idx]).eq_ignore_ascii_case(base));
    matched.extend(rest);
    matched
}

fn read_entry(archive: &mut ZipArchive<File>, entry: &str) -> io::Result<Vec<u8>> {
    let mut file = archive
        .by_name(entry)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let mut bytes = Vec::with_capacity(file.size().min(MAX_ENTRY_PREALLOC) as usize);
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}
