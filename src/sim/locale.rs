//! Simulated locale subsystem with release-dependent member names.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use fontswap_fonts::{AssetKind, AssetRef, FontAsset};

use super::object::{SimObject, SimObjectBuilder};
use crate::schema::{Action, DynObject, LocaleFontMap, MemberInfo, TypeInfo, Value, ValueType};

/// Type name of the locale-updated event object.
pub const BINDABLE_EVENT_TYPE: &str = "BindableEvent";

/// Member names of one host release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleNames {
    pub type_name: &'static str,
    pub instance: &'static str,
    pub current: &'static str,
    pub applied: &'static str,
    pub font_map: &'static str,
    pub apply_locale: &'static str,
    pub apply_locale_no_arg: &'static str,
    pub updated_event: &'static str,
    pub subscribe: &'static str,
}

impl LocaleNames {
    /// Names as shipped by the release the adapter was written against.
    pub fn current_release() -> Self {
        Self {
            type_name: "LocaleManagerClass",
            instance: "LocaleManagerClass",
            current: "String_0",
            applied: "String_1",
            font_map: "Dictionary_1",
            apply_locale: "method_1",
            apply_locale_no_arg: "UpdateApplicationLanguage",
            updated_event: "BindableEvent_0",
            subscribe: "AddLocaleUpdateListener",
        }
    }

    /// A later release where obfuscation renamed every member. Shapes and
    /// declaration order are unchanged.
    pub fn drifted() -> Self {
        Self {
            type_name: "GClass2041",
            instance: "GClass2041_0",
            current: "string_4",
            applied: "string_5",
            font_map: "dictionary_9",
            apply_locale: "method_12",
            apply_locale_no_arg: "method_13",
            updated_event: "bindableEvent_3",
            subscribe: "method_20",
        }
    }
}

#[derive(Default)]
struct LocaleState {
    listeners: RefCell<Vec<(u64, Action)>>,
    next_listener: Cell<u64>,
    refresh_calls: RefCell<Vec<String>>,
    no_arg_refreshes: Cell<usize>,
}

impl LocaleState {
    fn notify(&self) -> usize {
        let listeners: Vec<Action> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in &listeners {
            listener();
        }
        listeners.len()
    }
}

/// The locale singleton and its class facet.
pub struct SimLocale {
    names: LocaleNames,
    instance: Rc<SimObject>,
    class: Rc<SimObject>,
    font_map: LocaleFontMap,
    state: Rc<LocaleState>,
}

impl std::fmt::Debug for SimLocale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimLocale")
            .field("names", &self.names)
            .field("language", &self.language())
            .finish_non_exhaustive()
    }
}

fn locale_type(names: &LocaleNames) -> TypeInfo {
    TypeInfo::new(
        names.type_name,
        vec![
            MemberInfo::property(names.instance, ValueType::object(names.type_name), true, false),
            MemberInfo::field(names.current, ValueType::Str),
            MemberInfo::field(names.applied, ValueType::Str),
            MemberInfo::readonly_field(names.font_map, ValueType::FontMap),
            MemberInfo::method(names.apply_locale, vec![ValueType::Str], ValueType::Unit),
            MemberInfo::method(names.apply_locale_no_arg, Vec::new(), ValueType::Unit),
            MemberInfo::readonly_field(names.updated_event, ValueType::object(BINDABLE_EVENT_TYPE)),
            MemberInfo::method(names.subscribe, vec![ValueType::Action], ValueType::Action),
        ],
    )
}

fn bindable_event(state: &Rc<LocaleState>) -> Rc<SimObject> {
    let state = Rc::clone(state);
    SimObjectBuilder::new(BINDABLE_EVENT_TYPE)
        .method("Invoke", Vec::new(), ValueType::Unit, move |_| {
            state.notify();
            Ok(Value::Unit)
        })
        .build()
}

impl SimLocale {
    pub fn new(names: LocaleNames, language: &str) -> Self {
        let info = Rc::new(locale_type(&names));
        let state = Rc::new(LocaleState::default());

        let mut fonts = HashMap::new();
        fonts.insert("en".to_string(), FontAsset::new("Bender", AssetKind::Typeface));
        fonts.insert("ru".to_string(), FontAsset::new("BenderCyr", AssetKind::Typeface));
        let font_map: LocaleFontMap = Rc::new(RefCell::new(fonts));

        let refresh_state = Rc::clone(&state);
        let no_arg_state = Rc::clone(&state);
        let subscribe_state = Rc::clone(&state);
        let instance = SimObjectBuilder::from_type_info(Rc::clone(&info))
            .with_value(names.current, Value::from(language))
            .with_value(names.applied, Value::from(language))
            .with_value(names.font_map, Value::FontMap(Rc::clone(&font_map)))
            .with_value(names.updated_event, Value::Object(bindable_event(&state)))
            .with_method(names.apply_locale, move |args| {
                let lang = args.first().and_then(Value::as_str).unwrap_or_default();
                refresh_state.refresh_calls.borrow_mut().push(lang.to_string());
                refresh_state.notify();
                Ok(Value::Unit)
            })
            .with_method(names.apply_locale_no_arg, move |_| {
                no_arg_state.no_arg_refreshes.set(no_arg_state.no_arg_refreshes.get() + 1);
                no_arg_state.notify();
                Ok(Value::Unit)
            })
            .with_method(names.subscribe, move |args| {
                let Some(Value::Action(listener)) = args.first().cloned() else {
                    return Ok(Value::Unit);
                };
                let id = subscribe_state.next_listener.get();
                subscribe_state.next_listener.set(id + 1);
                subscribe_state
                    .listeners
                    .borrow_mut()
                    .push((id, listener));
                let weak = Rc::downgrade(&subscribe_state);
                let unsubscribe: Action = Rc::new(move || {
                    if let Some(state) = weak.upgrade() {
                        state.listeners.borrow_mut().retain(|(l, _)| *l != id);
                    }
                });
                Ok(Value::Action(unsubscribe))
            })
            .build();

        let instance_dyn: Rc<dyn DynObject> = Rc::clone(&instance) as Rc<dyn DynObject>;
        let class = SimObjectBuilder::from_type_info(info)
            .with_value(names.instance, Value::Object(instance_dyn))
            .build();

        Self {
            names,
            instance,
            class,
            font_map,
            state,
        }
    }

    pub fn names(&self) -> &LocaleNames {
        &self.names
    }

    pub fn class(&self) -> Rc<SimObject> {
        Rc::clone(&self.class)
    }

    pub fn instance(&self) -> Rc<SimObject> {
        Rc::clone(&self.instance)
    }

    pub fn language(&self) -> String {
        self.read_str(self.names.current)
    }

    pub fn applied_language(&self) -> String {
        self.read_str(self.names.applied)
    }

    fn read_str(&self, name: &str) -> String {
        self.instance
            .get_named(name)
            .and_then(Value::into_string)
            .unwrap_or_default()
    }

    /// Switch the UI language and notify listeners, as the host's settings
    /// screen does.
    pub fn set_language(&self, language: &str) -> usize {
        self.instance.set_named(self.names.current, Value::from(language));
        self.state.notify()
    }

    pub fn font_map(&self) -> LocaleFontMap {
        Rc::clone(&self.font_map)
    }

    pub fn font_for(&self, key: &str) -> Option<AssetRef> {
        self.font_map.borrow().get(key).cloned()
    }

    pub fn listener_count(&self) -> usize {
        self.state.listeners.borrow().len()
    }

    /// Languages passed to the one-argument refresh method.
    pub fn refresh_calls(&self) -> Vec<String> {
        self.state.refresh_calls.borrow().clone()
    }

    pub fn no_arg_refreshes(&self) -> usize {
        self.state.no_arg_refreshes.get()
    }
}
