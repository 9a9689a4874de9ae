//! Values and value types exchanged with dynamic host objects.

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use fontswap_fonts::AssetRef;

use super::object::DynObject;
use crate::host::TextObject;

/// No-argument callback (listener, unsubscribe handle).
pub type Action = Rc<dyn Fn()>;

/// Event handler receiving the event arguments.
pub type Handler = Rc<dyn Fn(&[Value])>;

/// Locale key to typeface map, shared by reference with the host.
pub type LocaleFontMap = Rc<RefCell<HashMap<String, AssetRef>>>;

/// Declared type of a member, method parameter or event handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    Unit,
    Bool,
    Str,
    Asset,
    FontMap,
    /// Host object of the named runtime type
    Object(Cow<'static, str>),
    Text,
    Action,
    /// Handler taking the listed parameter types
    Handler(Vec<ValueType>),
}

impl ValueType {
    pub fn object(name: impl Into<Cow<'static, str>>) -> Self {
        ValueType::Object(name.into())
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Unit => f.write_str("unit"),
            ValueType::Bool => f.write_str("bool"),
            ValueType::Str => f.write_str("string"),
            ValueType::Asset => f.write_str("asset"),
            ValueType::FontMap => f.write_str("font-map"),
            ValueType::Object(name) => write!(f, "object<{name}>"),
            ValueType::Text => f.write_str("text"),
            ValueType::Action => f.write_str("action"),
            ValueType::Handler(params) => {
                f.write_str("handler(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{p}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// A value read from, written to, or passed into a host object.
#[derive(Clone)]
pub enum Value {
    Unit,
    Bool(bool),
    Str(String),
    Asset(Option<AssetRef>),
    FontMap(LocaleFontMap),
    Object(Rc<dyn DynObject>),
    Text(Rc<dyn TextObject>),
    Action(Action),
    Handler(Handler),
}

impl Value {
    /// Short description of the variant, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Asset(_) => "asset",
            Value::FontMap(_) => "font-map",
            Value::Object(_) => "object",
            Value::Text(_) => "text",
            Value::Action(_) => "action",
            Value::Handler(_) => "handler",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_string(self) -> Option<String> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_asset(self) -> Option<Option<AssetRef>> {
        match self {
            Value::Asset(a) => Some(a),
            _ => None,
        }
    }

    pub fn into_font_map(self) -> Option<LocaleFontMap> {
        match self {
            Value::FontMap(m) => Some(m),
            _ => None,
        }
    }

    pub fn into_object(self) -> Option<Rc<dyn DynObject>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn into_action(self) -> Option<Action> {
        match self {
            Value::Action(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&Rc<dyn TextObject>> {
        match self {
            Value::Text(t) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => f.write_str("Unit"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Asset(a) => write!(f, "Asset({:?})", a.as_ref().map(|a| a.name())),
            Value::FontMap(m) => write!(f, "FontMap(len={})", m.borrow().len()),
            Value::Object(o) => write!(f, "Object({})", o.type_info().name),
            Value::Text(t) => write!(f, "Text({:?})", t.id()),
            Value::Action(_) => f.write_str("Action"),
            Value::Handler(_) => f.write_str("Handler"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<AssetRef> for Value {
    fn from(asset: AssetRef) -> Self {
        Value::Asset(Some(asset))
    }
}
