//! Font data and asset handle types.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use swash::FontRef;

/// Stores font data with lifetime management.
///
/// This struct owns the font data bytes and provides a `FontRef` that can be used
/// for glyph lookups. The `FontRef` is guaranteed to be valid for the lifetime of
/// this struct.
#[derive(Clone)]
pub struct FontData {
    /// Raw font data bytes (TTF/OTF/TTC)
    pub data: Arc<Vec<u8>>,
    /// Face index within `data` (non-zero only for collections)
    pub face_index: usize,
    /// Swash font reference for glyph operations
    pub font_ref: FontRef<'static>,
}

impl std::fmt::Debug for FontData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontData")
            .field("data_len", &self.data.len())
            .field("face_index", &self.face_index)
            .finish()
    }
}

impl FontData {
    /// Create a new FontData from bytes using face index 0.
    ///
    /// Returns `None` if the bytes do not parse as a font.
    pub fn new(data: Vec<u8>) -> Option<Self> {
        Self::new_with_index(data, 0)
    }

    /// Create a new FontData from bytes with a specific face index.
    ///
    /// TrueType Collection (.ttc) files hold several faces that share the same
    /// data but have different face indices.
    pub fn new_with_index(data: Vec<u8>, face_index: usize) -> Option<Self> {
        let data_arc = Arc::new(data);

        // SAFETY: The bytes live in an Arc stored next to the FontRef, so the
        // FontRef can never outlive them. Both are dropped together.
        let font_ref = unsafe {
            let bytes = data_arc.as_slice();
            let static_bytes: &'static [u8] = std::mem::transmute(bytes);
            FontRef::from_index(static_bytes, face_index)?
        };

        Some(FontData {
            data: data_arc,
            face_index,
            font_ref,
        })
    }
}

static NEXT_ASSET_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a font asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(u64);

impl AssetId {
    fn next() -> Self {
        AssetId(NEXT_ASSET_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Which family of text objects an asset can be assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// Typeface used by structured (rich) text objects
    Typeface,
    /// Native font used by plain text objects
    Native,
}

/// A font asset shared between the host and the override engine.
///
/// Equality is identity: two handles are equal only if they refer to the
/// same asset, regardless of name or data.
pub struct FontAsset {
    id: AssetId,
    name: String,
    kind: AssetKind,
    data: Option<FontData>,
    fallbacks: RwLock<Vec<AssetRef>>,
}

/// Shared handle to a font asset.
pub type AssetRef = Arc<FontAsset>;

impl FontAsset {
    /// Create an asset with no font data attached (e.g. a host-owned font).
    pub fn new(name: impl Into<String>, kind: AssetKind) -> AssetRef {
        Self::build(name.into(), kind, None)
    }

    /// Create an asset backed by parsed font data.
    pub fn with_data(name: impl Into<String>, kind: AssetKind, data: FontData) -> AssetRef {
        Self::build(name.into(), kind, Some(data))
    }

    fn build(name: String, kind: AssetKind, data: Option<FontData>) -> AssetRef {
        Arc::new(FontAsset {
            id: AssetId::next(),
            name,
            kind,
            data,
            fallbacks: RwLock::new(Vec::new()),
        })
    }

    pub fn id(&self) -> AssetId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn data(&self) -> Option<&FontData> {
        self.data.as_ref()
    }

    /// Snapshot of the fallback table, in lookup order.
    pub fn fallbacks(&self) -> Vec<AssetRef> {
        self.fallbacks.read().clone()
    }

    pub(crate) fn fallback_table(&self) -> &RwLock<Vec<AssetRef>> {
        &self.fallbacks
    }
}

impl PartialEq for FontAsset {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for FontAsset {}

impl std::fmt::Debug for FontAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontAsset")
            .field("id", &self.id.0)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("has_data", &self.data.is_some())
            .field("fallbacks", &self.fallbacks.read().len())
            .finish()
    }
}

/// The currently selected substitute: a typeface for structured text and,
/// when available, its native-format companion for plain text.
#[derive(Debug, Clone)]
pub struct ReplacementAsset {
    pub typeface: AssetRef,
    pub companion: Option<AssetRef>,
}

impl ReplacementAsset {
    pub fn new(typeface: AssetRef, companion: Option<AssetRef>) -> Self {
        Self {
            typeface,
            companion,
        }
    }

    /// The asset to assign to text objects that take `kind` assets.
    pub fn asset_for(&self, kind: AssetKind) -> Option<&AssetRef> {
        match kind {
            AssetKind::Typeface => Some(&self.typeface),
            AssetKind::Native => self.companion.as_ref(),
        }
    }

    /// Whether `asset` is one of the override assets.
    pub fn is_override(&self, asset: &AssetRef) -> bool {
        self.typeface == *asset || self.companion.as_ref().is_some_and(|c| c == asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_identity_equality() {
        let a = FontAsset::new("Bender", AssetKind::Typeface);
        let b = FontAsset::new("Bender", AssetKind::Typeface);
        assert_ne!(a, b, "Same name must not imply same asset");
        assert_eq!(a, Arc::clone(&a));
        assert!(a.id() < b.id());
    }

    #[test]
    fn test_font_data_rejects_garbage() {
        assert!(FontData::new(vec![0u8; 64]).is_none());
        assert!(FontData::new(Vec::new()).is_none());
    }

    #[test]
    fn test_replacement_asset_for_kind() {
        let typeface = FontAsset::new("Noto", AssetKind::Typeface);
        let companion = FontAsset::new("Noto", AssetKind::Native);
        let replacement =
            ReplacementAsset::new(Arc::clone(&typeface), Some(Arc::clone(&companion)));

        assert_eq!(replacement.asset_for(AssetKind::Typeface), Some(&typeface));
        assert_eq!(replacement.asset_for(AssetKind::Native), Some(&companion));
        assert!(replacement.is_override(&companion));
        assert!(!replacement.is_override(&FontAsset::new("Other", AssetKind::Native)));

        let bare = ReplacementAsset::new(typeface, None);
        assert!(bare.asset_for(AssetKind::Native).is_none());
    }

    #[test]
    fn test_debug_reports_fallback_count() {
        let asset = FontAsset::new("Noto", AssetKind::Typeface);
        let debug_str = format!("{:?}", asset);
        assert!(debug_str.contains("FontAsset"));
        assert!(debug_str.contains("fallbacks: 0"));
    }
}
