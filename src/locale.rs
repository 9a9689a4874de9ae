//! Logical roles on the host's locale subsystem and text settings.
//!
//! Every accessor here is best-effort: the locale object is looked up fresh
//! on each call, member names are resolved through the [`SchemaAdapter`], and
//! a missing member is reported as [`FontSwapError::SchemaResolution`] for
//! the caller to log and skip.

use std::rc::Rc;

use fontswap_fonts::AssetRef;

use crate::error::{FontSwapError, Result};
use crate::host::Host;
use crate::schema::{
    Action, DynObject, LocaleFontMap, MemberBinding, Resolution, RoleSpec, SchemaAdapter, Shape,
    TypeMatch, Value, ValueType,
};

/// Language reported when the current-language member cannot be read.
pub const DEFAULT_LANGUAGE: &str = "en";

pub(crate) mod roles {
    use super::*;

    pub const INSTANCE: &str = "locale-instance";
    pub const CURRENT_LANGUAGE: &str = "current-language-reader";
    pub const APPLIED_LANGUAGE_READ: &str = "applied-language-reader";
    pub const APPLIED_LANGUAGE_WRITE: &str = "applied-language-writer";
    pub const FONT_MAP: &str = "locale-font-map";
    pub const APPLY_LOCALE: &str = "apply-locale";
    pub const APPLY_LOCALE_NO_ARG: &str = "apply-locale-no-arg";
    pub const UPDATED_EVENT: &str = "locale-updated-event";
    pub const UPDATED_INVOKE: &str = "locale-updated-invoke";
    pub const SUBSCRIBE: &str = "locale-update-subscribe";
    pub const DEFAULT_FONT_READ: &str = "default-font-reader";
    pub const DEFAULT_FONT_WRITE: &str = "default-font-writer";
    pub const TEXT_CHANGED: &str = "text-changed-event";

    const APPLIED: &[&str] = &["String_1", "AppliedLanguage", "CurrentAppliedLanguage"];
    const DEFAULT_FONT: &[&str] = &["m_defaultFontAsset", "defaultFontAsset"];

    /// The singleton lives on the class facet and has the class's own type.
    pub fn instance(type_name: &str) -> RoleSpec {
        RoleSpec {
            role: INSTANCE,
            candidates: &["LocaleManagerClass", "Instance"],
            shape: Shape::readable(ValueType::object(type_name.to_string())),
            type_scan: true,
        }
    }

    pub fn current_language() -> RoleSpec {
        RoleSpec {
            role: CURRENT_LANGUAGE,
            candidates: &["String_0", "CurrentLanguage", "Language", "Locale"],
            shape: Shape::readable(ValueType::Str),
            type_scan: true,
        }
    }

    // The applied language is the second string member; a type scan would
    // land on the current language instead.
    pub fn applied_language_reader() -> RoleSpec {
        RoleSpec {
            role: APPLIED_LANGUAGE_READ,
            candidates: APPLIED,
            shape: Shape::readable(ValueType::Str),
            type_scan: false,
        }
    }

    pub fn applied_language_writer() -> RoleSpec {
        RoleSpec {
            role: APPLIED_LANGUAGE_WRITE,
            candidates: APPLIED,
            shape: Shape::writable(ValueType::Str),
            type_scan: false,
        }
    }

    pub fn font_map() -> RoleSpec {
        RoleSpec {
            role: FONT_MAP,
            candidates: &["Dictionary_1"],
            shape: Shape::readable(ValueType::FontMap),
            type_scan: true,
        }
    }

    pub fn apply_locale() -> RoleSpec {
        RoleSpec {
            role: APPLY_LOCALE,
            candidates: &["method_1"],
            shape: Shape::Invocable(vec![ValueType::Str]),
            type_scan: false,
        }
    }

    pub fn apply_locale_no_arg() -> RoleSpec {
        RoleSpec {
            role: APPLY_LOCALE_NO_ARG,
            candidates: &["UpdateApplicationLanguage"],
            shape: Shape::Invocable(Vec::new()),
            type_scan: false,
        }
    }

    pub fn updated_event() -> RoleSpec {
        RoleSpec {
            role: UPDATED_EVENT,
            candidates: &["BindableEvent_0"],
            shape: Shape::Readable(TypeMatch::ObjectNameContains("BindableEvent")),
            type_scan: true,
        }
    }

    pub fn updated_invoke() -> RoleSpec {
        RoleSpec {
            role: UPDATED_INVOKE,
            candidates: &["Invoke"],
            shape: Shape::Invocable(Vec::new()),
            type_scan: false,
        }
    }

    pub fn subscribe() -> RoleSpec {
        RoleSpec {
            role: SUBSCRIBE,
            candidates: &["AddLocaleUpdateListener"],
            shape: Shape::Invocable(vec![ValueType::Action]),
            type_scan: false,
        }
    }

    pub fn default_font_reader() -> RoleSpec {
        RoleSpec {
            role: DEFAULT_FONT_READ,
            candidates: DEFAULT_FONT,
            shape: Shape::readable(ValueType::Asset),
            type_scan: false,
        }
    }

    pub fn default_font_writer() -> RoleSpec {
        RoleSpec {
            role: DEFAULT_FONT_WRITE,
            candidates: DEFAULT_FONT,
            shape: Shape::writable(ValueType::Asset),
            type_scan: false,
        }
    }

    pub fn text_changed() -> RoleSpec {
        RoleSpec {
            role: TEXT_CHANGED,
            candidates: &["onTextChanged", "OnTextChanged"],
            shape: Shape::Subscribable(TypeMatch::Exact(ValueType::Handler(vec![
                ValueType::Text,
            ]))),
            type_scan: true,
        }
    }
}

/// Typed view over the host's locale subsystem.
pub struct LocaleBridge {
    adapter: Rc<SchemaAdapter>,
    host: Rc<dyn Host>,
}

impl std::fmt::Debug for LocaleBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocaleBridge")
            .field("adapter", &self.adapter)
            .finish_non_exhaustive()
    }
}

fn bind(
    adapter: &SchemaAdapter,
    object: &dyn DynObject,
    spec: &RoleSpec,
) -> Result<MemberBinding> {
    match adapter.resolve(object, spec) {
        Resolution::Bound(binding) => Ok(binding),
        Resolution::Unbound => Err(FontSwapError::SchemaResolution {
            role: spec.role,
            type_name: object.type_info().name.clone(),
        }),
    }
}

fn unexpected(role: &'static str, member: &str, expected: &ValueType, found: &Value) -> FontSwapError {
    FontSwapError::invocation(
        role,
        crate::schema::InvokeError::ArgumentMismatch {
            member: member.to_string(),
            expected: expected.to_string(),
            found: found.kind_name().to_string(),
        },
    )
}

impl LocaleBridge {
    pub fn new(adapter: Rc<SchemaAdapter>, host: Rc<dyn Host>) -> Self {
        Self { adapter, host }
    }

    pub fn adapter(&self) -> &Rc<SchemaAdapter> {
        &self.adapter
    }

    /// The live locale singleton, if the host has constructed it.
    pub fn instance(&self) -> Option<Rc<dyn DynObject>> {
        let class = self.host.locale_class()?;
        let type_name = class.type_info().name.clone();
        let binding = self
            .adapter
            .resolve(&*class, &roles::instance(&type_name))
            .binding()?;
        match binding.read(&*class) {
            Ok(value) => value.into_object(),
            Err(e) => {
                log::debug!("Reading locale singleton failed: {}", e);
                None
            }
        }
    }

    fn require_instance(&self, role: &'static str) -> Result<Rc<dyn DynObject>> {
        self.instance()
            .ok_or_else(|| FontSwapError::SchemaResolution {
                role,
                type_name: "locale singleton".to_string(),
            })
    }

    fn read_string(&self, spec: &RoleSpec) -> Result<String> {
        let lm = self.require_instance(spec.role)?;
        let binding = bind(&self.adapter, &*lm, spec)?;
        let value = binding
            .read(&*lm)
            .map_err(|e| FontSwapError::invocation(spec.role, e))?;
        match value {
            Value::Str(s) => Ok(s),
            other => Err(unexpected(spec.role, &binding.member_name, &ValueType::Str, &other)),
        }
    }

    /// Current UI language, `"en"` when it cannot be determined.
    pub fn current_language(&self) -> String {
        match self.read_string(&roles::current_language()) {
            Ok(lang) => lang,
            Err(e) => {
                log::debug!("Current language unavailable ({}); assuming {}", e, DEFAULT_LANGUAGE);
                DEFAULT_LANGUAGE.to_string()
            }
        }
    }

    pub fn applied_language(&self) -> Result<String> {
        self.read_string(&roles::applied_language_reader())
    }

    pub fn set_applied_language(&self, lang: &str) -> Result<()> {
        let spec = roles::applied_language_writer();
        let lm = self.require_instance(spec.role)?;
        let binding = bind(&self.adapter, &*lm, &spec)?;
        binding
            .write(&*lm, Value::from(lang))
            .map_err(|e| FontSwapError::invocation(spec.role, e))
    }

    fn font_map(&self) -> Result<LocaleFontMap> {
        let spec = roles::font_map();
        let lm = self.require_instance(spec.role)?;
        let binding = bind(&self.adapter, &*lm, &spec)?;
        let value = binding
            .read(&*lm)
            .map_err(|e| FontSwapError::invocation(spec.role, e))?;
        match value {
            Value::FontMap(map) => Ok(map),
            other => Err(unexpected(
                spec.role,
                &binding.member_name,
                &ValueType::FontMap,
                &other,
            )),
        }
    }

    /// Typeface the locale subsystem maps `key` to.
    pub fn locale_font(&self, key: &str) -> Option<AssetRef> {
        match self.font_map() {
            Ok(map) => map.borrow().get(key).cloned(),
            Err(e) => {
                log::debug!("Locale font lookup for {} skipped: {}", key, e);
                None
            }
        }
    }

    /// Map `key` to `font`, returning the entry it replaced.
    pub fn set_locale_font(&self, key: &str, font: AssetRef) -> Result<Option<AssetRef>> {
        let map = self.font_map()?;
        let previous = map.borrow_mut().insert(key.to_string(), font);
        Ok(previous)
    }

    /// Put back an entry captured by [`LocaleBridge::set_locale_font`];
    /// `None` removes the key.
    pub fn restore_locale_font(&self, key: &str, previous: Option<AssetRef>) -> Result<()> {
        let map = self.font_map()?;
        let mut map = map.borrow_mut();
        match previous {
            Some(font) => {
                map.insert(key.to_string(), font);
            }
            None => {
                map.remove(key);
            }
        }
        Ok(())
    }

    /// Ask the locale subsystem to rebuild its state for `lang`, using the
    /// one-argument refresh method or the no-argument alternate.
    pub fn apply_locale_internal(&self, lang: &str) -> Result<()> {
        let lm = self.require_instance(roles::APPLY_LOCALE)?;
        let with_arg = roles::apply_locale();
        if let Some(binding) = self.adapter.resolve(&*lm, &with_arg).binding() {
            return binding
                .invoke(&*lm, &[Value::from(lang)])
                .map(|_| ())
                .map_err(|e| FontSwapError::invocation(with_arg.role, e));
        }
        let no_arg = roles::apply_locale_no_arg();
        let binding = bind(&self.adapter, &*lm, &no_arg)?;
        binding
            .invoke(&*lm, &[])
            .map(|_| ())
            .map_err(|e| FontSwapError::invocation(no_arg.role, e))
    }

    /// Fire the locale subsystem's own "locale updated" event.
    pub fn invoke_locale_updated(&self) -> Result<()> {
        let event_spec = roles::updated_event();
        let lm = self.require_instance(event_spec.role)?;
        let binding = bind(&self.adapter, &*lm, &event_spec)?;
        let event = binding
            .read(&*lm)
            .map_err(|e| FontSwapError::invocation(event_spec.role, e))?;
        let Some(event) = event.into_object() else {
            return Err(FontSwapError::SchemaResolution {
                role: event_spec.role,
                type_name: lm.type_info().name.clone(),
            });
        };
        let invoke_spec = roles::updated_invoke();
        let invoke = bind(&self.adapter, &*event, &invoke_spec)?;
        invoke
            .invoke(&*event, &[])
            .map(|_| ())
            .map_err(|e| FontSwapError::invocation(invoke_spec.role, e))
    }

    /// Register `listener` for locale changes. Returns the unsubscribe action.
    pub fn subscribe_locale_update(&self, listener: Action) -> Result<Action> {
        let spec = roles::subscribe();
        let lm = self.require_instance(spec.role)?;
        let binding = bind(&self.adapter, &*lm, &spec)?;
        let result = binding
            .invoke(&*lm, &[Value::Action(listener)])
            .map_err(|e| FontSwapError::invocation(spec.role, e))?;
        match result {
            Value::Action(unsubscribe) => Ok(unsubscribe),
            other => Err(unexpected(
                spec.role,
                &binding.member_name,
                &ValueType::Action,
                &other,
            )),
        }
    }

    /// Default typeface of the host's text settings.
    pub fn default_font(&self) -> Result<Option<AssetRef>> {
        let spec = roles::default_font_reader();
        let settings = self.host.text_settings().ok_or(FontSwapError::SchemaResolution {
            role: spec.role,
            type_name: "text settings".to_string(),
        })?;
        let binding = bind(&self.adapter, &*settings, &spec)?;
        let value = binding
            .read(&*settings)
            .map_err(|e| FontSwapError::invocation(spec.role, e))?;
        match value {
            Value::Asset(font) => Ok(font),
            other => Err(unexpected(
                spec.role,
                &binding.member_name,
                &ValueType::Asset,
                &other,
            )),
        }
    }

    pub fn set_default_font(&self, font: AssetRef) -> Result<()> {
        let spec = roles::default_font_writer();
        let settings = self.host.text_settings().ok_or(FontSwapError::SchemaResolution {
            role: spec.role,
            type_name: "text settings".to_string(),
        })?;
        let binding = bind(&self.adapter, &*settings, &spec)?;
        binding
            .write(&*settings, Value::from(font))
            .map_err(|e| FontSwapError::invocation(spec.role, e))
    }

    /// The text class facet and its content-changed event, if both exist.
    pub fn text_changed_event(&self) -> Option<(Rc<dyn DynObject>, MemberBinding)> {
        let class = self.host.text_class()?;
        let binding = self
            .adapter
            .resolve(&*class, &roles::text_changed())
            .binding()?;
        Some((class, binding))
    }
}
