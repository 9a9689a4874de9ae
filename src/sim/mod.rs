//! In-memory host used by the test suites.
//!
//! Models the pieces of a real host the override core touches: a locale
//! singleton whose member names depend on the release, a text class with an
//! optional content-changed event, a settings object holding the default
//! typeface, and a population of text objects that can be created and
//! destroyed at any time.

mod host;
mod locale;
mod object;

pub use host::{DEFAULT_FONT_MEMBER, SimHost, SimHostBuilder, SimText, TEXT_CHANGED_EVENT, TEXT_CLASS_TYPE};
pub use locale::{BINDABLE_EVENT_TYPE, LocaleNames, SimLocale};
pub use object::{MethodFn, SimObject, SimObjectBuilder};
