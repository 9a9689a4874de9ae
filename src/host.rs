//! Host-facing traits.
//!
//! The core never owns the text-object population. Every pass asks the host
//! for a fresh snapshot; objects can appear or disappear between passes.

use std::fmt;
use std::rc::Rc;

use fontswap_fonts::{AssetKind, AssetRef};

use crate::schema::DynObject;

/// Stable identity of a live text object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub i64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The two families of text objects the host renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextKind {
    /// Rich text component driven by typeface assets
    Structured,
    /// Legacy text component driven by native fonts
    Plain,
}

impl TextKind {
    pub const ALL: [TextKind; 2] = [TextKind::Structured, TextKind::Plain];

    /// The asset kind this family of objects accepts.
    pub fn asset_kind(self) -> AssetKind {
        match self {
            TextKind::Structured => AssetKind::Typeface,
            TextKind::Plain => AssetKind::Native,
        }
    }
}

/// A live text-bearing object.
pub trait TextObject {
    fn id(&self) -> ObjectId;

    fn kind(&self) -> TextKind;

    /// Current content, markup included.
    fn text(&self) -> String;

    fn font(&self) -> Option<AssetRef>;

    /// Assign a font and mark the object for re-layout.
    fn set_font(&self, font: AssetRef);
}

/// The embedding application.
pub trait Host {
    /// Snapshot of the live objects of `kind`.
    fn find_text_objects(&self, kind: TextKind) -> Vec<Rc<dyn TextObject>>;

    /// Static facet of the locale subsystem type, if the type is loaded.
    fn locale_class(&self) -> Option<Rc<dyn DynObject>>;

    /// Static facet of the structured text type (content-changed event).
    fn text_class(&self) -> Option<Rc<dyn DynObject>>;

    /// Settings object holding the default typeface.
    fn text_settings(&self) -> Option<Rc<dyn DynObject>>;

    /// Typefaces from the host's shared font resources.
    fn shared_fonts(&self) -> Vec<AssetRef>;
}
