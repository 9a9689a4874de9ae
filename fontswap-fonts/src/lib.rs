//! Font assets for fontswap.
//!
//! This crate provides:
//! - Identity-carrying font handles (`FontAsset` / `AssetRef`) shared with the host
//! - Loading a replacement typeface and its native companion from a font bundle
//! - Building a deduplicated fallback chain onto the replacement typeface
//! - Discovering the shared font set a host ships in a resource directory

pub mod fallbacks;
pub mod resolver;
pub mod shared;
pub mod types;

// Re-export main types for convenience
pub use fallbacks::{LOCALE_FALLBACK_ORDER, build_fallback_chain};
pub use resolver::{AssetResolver, FONT_EXTENSIONS, LoadError};
pub use shared::load_shared_fonts;
pub use types::{AssetId, AssetKind, AssetRef, FontAsset, FontData, ReplacementAsset};
