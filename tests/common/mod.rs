//! Shared integration test helpers for fontswap.
//!
//! Include this module at the top of each test file that needs it:
//!
//! ```ignore
//! mod common;
//! use common::{host_dyn, replacement, write_bundle};
//! ```
//!
//! The `#[allow(dead_code)]` attribute suppresses warnings when only a subset
//! of helpers is used per file.

#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

use fontswap::fonts::{AssetKind, AssetRef, FontAsset, ReplacementAsset};
use fontswap::sim::SimHost;
use fontswap::{Host, KeepPolicy, OverrideEngine, SchemaAdapter};
use zip::write::SimpleFileOptions;

/// Smallest byte sequence accepted as a TrueType face.
pub const EMPTY_SFNT: &[u8] = &[0x00, 0x01, 0x00, 0x00, 0, 0, 0, 0, 0, 0, 0, 0];

/// A TrueType face carrying only a `name` table with the family and
/// PostScript names set to `family`.
pub fn named_face(family: &str) -> Vec<u8> {
    let utf16: Vec<u8> = family.encode_utf16().flat_map(u16::to_be_bytes).collect();
    let len = utf16.len() as u16;

    let mut name = Vec::new();
    for word in [0u16, 2, 30] {
        name.extend(word.to_be_bytes());
    }
    for (name_id, offset) in [(1u16, 0u16), (6, len)] {
        for word in [3u16, 1, 0x0409, name_id, len, offset] {
            name.extend(word.to_be_bytes());
        }
    }
    name.extend(&utf16);
    name.extend(&utf16);

    let mut face = vec![0x00, 0x01, 0x00, 0x00, 0, 1, 0, 16, 0, 0, 0, 0];
    face.extend(b"name");
    face.extend(0u32.to_be_bytes());
    face.extend(28u32.to_be_bytes());
    face.extend((name.len() as u32).to_be_bytes());
    face.extend(name);
    face
}

pub fn host_dyn(host: &Rc<SimHost>) -> Rc<dyn Host> {
    Rc::clone(host) as Rc<dyn Host>
}

pub fn typeface(name: &str) -> AssetRef {
    FontAsset::new(name, AssetKind::Typeface)
}

pub fn native(name: &str) -> AssetRef {
    FontAsset::new(name, AssetKind::Native)
}

/// Replacement with both a typeface and a native companion.
pub fn replacement() -> ReplacementAsset {
    ReplacementAsset::new(typeface("NotoSansSC"), Some(native("NotoSansSC")))
}

/// Engine targeting "ch" with a replacement installed, not yet enabled.
pub fn engine_for(host: &Rc<SimHost>, policy: KeepPolicy) -> (Rc<OverrideEngine>, ReplacementAsset) {
    let engine = Rc::new(OverrideEngine::new(
        host_dyn(host),
        Rc::new(SchemaAdapter::new()),
        "ch",
        policy,
    ));
    let swap = replacement();
    engine.set_replacement(swap.clone());
    (engine, swap)
}

/// Write a zip font bundle with the given entries.
pub fn write_bundle(path: &Path, entries: &[(&str, &[u8])]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create bundle dir");
    }
    let file = File::create(path).expect("Failed to create bundle");
    let mut writer = zip::ZipWriter::new(file);
    for (name, bytes) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("Failed to start entry");
        writer.write_all(bytes).expect("Failed to write entry");
    }
    writer.finish().expect("Failed to finish bundle");
}
