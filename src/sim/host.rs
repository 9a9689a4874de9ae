//! Simulated host: text objects, class facets and text settings.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use fontswap_fonts::AssetRef;

use super::locale::{LocaleNames, SimLocale};
use super::object::{SimObject, SimObjectBuilder};
use crate::host::{Host, ObjectId, TextKind, TextObject};
use crate::schema::{DynObject, Value, ValueType};

/// Type name of the structured text class facet.
pub const TEXT_CLASS_TYPE: &str = "TMP_Text";
/// Name of the content-changed event on the text class facet.
pub const TEXT_CHANGED_EVENT: &str = "onTextChanged";
/// Name of the default typeface member on the text settings object.
pub const DEFAULT_FONT_MEMBER: &str = "m_defaultFontAsset";

/// A live text object.
pub struct SimText {
    id: ObjectId,
    kind: TextKind,
    text: RefCell<String>,
    font: RefCell<Option<AssetRef>>,
    font_sets: Cell<usize>,
    dirty: Cell<bool>,
    /// Facet raising content-changed events; structured text only
    events: Option<Rc<SimObject>>,
    echo_font_changes: bool,
    this: Weak<SimText>,
}

impl std::fmt::Debug for SimText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimText")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("text", &self.text.borrow())
            .field("font", &self.font.borrow().as_ref().map(|f| f.name().to_string()))
            .finish()
    }
}

impl SimText {
    fn notify_changed(&self) {
        let (Some(events), Some(this)) = (&self.events, self.this.upgrade()) else {
            return;
        };
        let this: Rc<dyn TextObject> = this;
        events.fire(TEXT_CHANGED_EVENT, &[Value::Text(this)]);
    }

    /// Change the content and raise the content-changed event.
    pub fn set_text(&self, text: &str) {
        *self.text.borrow_mut() = text.to_string();
        self.notify_changed();
    }

    /// Number of times a font was assigned.
    pub fn font_sets(&self) -> usize {
        self.font_sets.get()
    }

    /// Whether a font assignment is waiting for re-layout.
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }
}

impl TextObject for SimText {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn kind(&self) -> TextKind {
        self.kind
    }

    fn text(&self) -> String {
        self.text.borrow().clone()
    }

    fn font(&self) -> Option<AssetRef> {
        self.font.borrow().clone()
    }

    fn set_font(&self, font: AssetRef) {
        *self.font.borrow_mut() = Some(font);
        self.font_sets.set(self.font_sets.get() + 1);
        self.dirty.set(true);
        if self.echo_font_changes {
            self.notify_changed();
        }
    }
}

pub struct SimHostBuilder {
    locale: Option<LocaleNames>,
    language: String,
    text_event: bool,
    echo_font_changes: bool,
    shared_fonts: Vec<AssetRef>,
    default_font: Option<AssetRef>,
}

impl Default for SimHostBuilder {
    fn default() -> Self {
        Self {
            locale: Some(LocaleNames::current_release()),
            language: "en".to_string(),
            text_event: true,
            echo_font_changes: false,
            shared_fonts: Vec::new(),
            default_font: None,
        }
    }
}

impl SimHostBuilder {
    pub fn locale_names(mut self, names: LocaleNames) -> Self {
        self.locale = Some(names);
        self
    }

    /// Host that never constructs its locale subsystem.
    pub fn without_locale(mut self) -> Self {
        self.locale = None;
        self
    }

    pub fn language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    /// Text class without a content-changed event.
    pub fn without_text_event(mut self) -> Self {
        self.text_event = false;
        self
    }

    /// Raise the content-changed event on font assignment too, as text
    /// components that rebuild their mesh do.
    pub fn echo_font_changes(mut self) -> Self {
        self.echo_font_changes = true;
        self
    }

    pub fn shared_fonts(mut self, fonts: Vec<AssetRef>) -> Self {
        self.shared_fonts = fonts;
        self
    }

    pub fn default_font(mut self, font: AssetRef) -> Self {
        self.default_font = Some(font);
        self
    }

    pub fn build(self) -> Rc<SimHost> {
        let locale = self
            .locale
            .map(|names| Rc::new(SimLocale::new(names, &self.language)));

        let mut text_class = SimObjectBuilder::new(TEXT_CLASS_TYPE);
        if self.text_event {
            text_class = text_class.event(
                TEXT_CHANGED_EVENT,
                ValueType::Handler(vec![ValueType::Text]),
            );
        }

        let settings = SimObjectBuilder::new("TMP_Settings")
            .field(
                DEFAULT_FONT_MEMBER,
                ValueType::Asset,
                Value::Asset(self.default_font),
            )
            .build();

        Rc::new(SimHost {
            locale,
            text_class: text_class.build(),
            settings,
            shared_fonts: self.shared_fonts,
            texts: RefCell::new(Vec::new()),
            next_id: Cell::new(1000),
            find_calls: Cell::new(0),
            echo_font_changes: self.echo_font_changes,
        })
    }
}

/// In-memory [`Host`] for tests and demos.
pub struct SimHost {
    locale: Option<Rc<SimLocale>>,
    text_class: Rc<SimObject>,
    settings: Rc<SimObject>,
    shared_fonts: Vec<AssetRef>,
    texts: RefCell<Vec<Rc<SimText>>>,
    next_id: Cell<i64>,
    find_calls: Cell<usize>,
    echo_font_changes: bool,
}

impl std::fmt::Debug for SimHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimHost")
            .field("locale", &self.locale)
            .field("texts", &self.texts.borrow().len())
            .finish_non_exhaustive()
    }
}

impl SimHost {
    pub fn builder() -> SimHostBuilder {
        SimHostBuilder::default()
    }

    pub fn locale(&self) -> Option<Rc<SimLocale>> {
        self.locale.clone()
    }

    /// Create a live text object.
    pub fn spawn_text(&self, kind: TextKind, text: &str, font: Option<AssetRef>) -> Rc<SimText> {
        let id = ObjectId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        let events = match kind {
            TextKind::Structured => Some(Rc::clone(&self.text_class)),
            TextKind::Plain => None,
        };
        let object = Rc::new_cyclic(|this| SimText {
            id,
            kind,
            text: RefCell::new(text.to_string()),
            font: RefCell::new(font),
            font_sets: Cell::new(0),
            dirty: Cell::new(false),
            events,
            echo_font_changes: self.echo_font_changes,
            this: Weak::clone(this),
        });
        self.texts.borrow_mut().push(Rc::clone(&object));
        object
    }

    pub fn destroy_text(&self, id: ObjectId) -> bool {
        let mut texts = self.texts.borrow_mut();
        let before = texts.len();
        texts.retain(|t| t.id != id);
        texts.len() != before
    }

    /// Number of population queries served.
    pub fn find_calls(&self) -> usize {
        self.find_calls.get()
    }

    pub fn default_font(&self) -> Option<AssetRef> {
        self.settings
            .get_named(DEFAULT_FONT_MEMBER)
            .and_then(Value::into_asset)
            .flatten()
    }

    /// Handlers attached to the content-changed event.
    pub fn text_event_handlers(&self) -> usize {
        self.text_class.handler_count(TEXT_CHANGED_EVENT)
    }
}

impl Host for SimHost {
    fn find_text_objects(&self, kind: TextKind) -> Vec<Rc<dyn TextObject>> {
        self.find_calls.set(self.find_calls.get() + 1);
        self.texts
            .borrow()
            .iter()
            .filter(|t| t.kind == kind)
            .map(|t| Rc::clone(t) as Rc<dyn TextObject>)
            .collect()
    }

    fn locale_class(&self) -> Option<Rc<dyn DynObject>> {
        self.locale
            .as_ref()
            .map(|l| l.class() as Rc<dyn DynObject>)
    }

    fn text_class(&self) -> Option<Rc<dyn DynObject>> {
        Some(Rc::clone(&self.text_class) as Rc<dyn DynObject>)
    }

    fn text_settings(&self) -> Option<Rc<dyn DynObject>> {
        Some(Rc::clone(&self.settings) as Rc<dyn DynObject>)
    }

    fn shared_fonts(&self) -> Vec<AssetRef> {
        self.shared_fonts.clone()
    }
}
