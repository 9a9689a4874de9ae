//! Per-object original-font memory and last-seen content.
//!
//! Both maps are bounded: once `MAX_TRACKED_OBJECTS` identities are stored,
//! inserting a new identity first clears the whole map. Objects that are
//! still alive are simply re-recorded on their next observation.

use std::collections::{HashMap, HashSet};

use fontswap_fonts::{AssetId, AssetRef};

use crate::host::{ObjectId, TextKind};

/// Capacity of each per-object map.
pub const MAX_TRACKED_OBJECTS: usize = 8000;

/// HashMap keyed by object identity with full-clear eviction.
#[derive(Debug, Clone)]
pub struct BoundedMap<V> {
    entries: HashMap<ObjectId, V>,
    capacity: usize,
    clears: u64,
}

impl<V> Default for BoundedMap<V> {
    fn default() -> Self {
        Self::with_capacity(MAX_TRACKED_OBJECTS)
    }
}

impl<V> BoundedMap<V> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
            clears: 0,
        }
    }

    pub fn get(&self, id: ObjectId) -> Option<&V> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Insert or replace. A new key arriving at capacity clears the map first.
    pub fn insert(&mut self, id: ObjectId, value: V) {
        if !self.entries.contains_key(&id) && self.entries.len() >= self.capacity {
            log::debug!(
                "Tracked object map reached {} entries; clearing",
                self.entries.len()
            );
            self.entries.clear();
            self.clears += 1;
        }
        self.entries.insert(id, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// How many times the map has been cleared for exceeding its capacity.
    pub fn clears(&self) -> u64 {
        self.clears
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Last observed content per object, used by the poll-mode detector.
pub type LastSeenContent = BoundedMap<String>;

/// Fonts objects were showing before any override touched them.
#[derive(Debug, Default)]
pub struct OriginalStateCache {
    fonts: BoundedMap<AssetRef>,
    default_font: Option<AssetRef>,
    /// Every asset ever used as an override; never recorded as an original
    overrides: HashSet<AssetId>,
}

impl OriginalStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fonts: BoundedMap::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Remember `asset` as an override so it is never cached as an original.
    pub fn note_override(&mut self, asset: &AssetRef) {
        self.overrides.insert(asset.id());
    }

    pub fn is_override(&self, asset: &AssetRef) -> bool {
        self.overrides.contains(&asset.id())
    }

    /// Record the object's current font unless one is already known or the
    /// font is an override. Returns whether an entry was created.
    pub fn record_if_needed(&mut self, id: ObjectId, current: Option<&AssetRef>) -> bool {
        let Some(current) = current else {
            return false;
        };
        if self.fonts.contains(id) || self.is_override(current) {
            return false;
        }
        self.fonts.insert(id, AssetRef::clone(current));
        true
    }

    pub fn get(&self, id: ObjectId) -> Option<&AssetRef> {
        self.fonts.get(id)
    }

    /// The font to put back on an object: its own entry, else the recorded
    /// default (structured text only).
    pub fn original_for(&self, id: ObjectId, kind: TextKind) -> Option<AssetRef> {
        if let Some(font) = self.fonts.get(id) {
            return Some(AssetRef::clone(font));
        }
        match kind {
            TextKind::Structured => self.default_font.clone(),
            TextKind::Plain => None,
        }
    }

    /// Capture the host's default typeface. Only the first non-override value
    /// is kept.
    pub fn set_default_once(&mut self, font: Option<AssetRef>) -> bool {
        if self.default_font.is_some() {
            return false;
        }
        match font {
            Some(font) if !self.is_override(&font) => {
                self.default_font = Some(font);
                true
            }
            _ => false,
        }
    }

    pub fn default_font(&self) -> Option<&AssetRef> {
        self.default_font.as_ref()
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    pub fn clears(&self) -> u64 {
        self.fonts.clears()
    }
}
