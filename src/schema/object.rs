//! Runtime type descriptions and the dynamic object trait.
//!
//! A host exposes its opaque objects through [`DynObject`]: a runtime type
//! description listing members by name, kind and declared type, plus generic
//! get/set/invoke/subscribe operations addressed by member index.

use std::rc::Rc;

use thiserror::Error;

use super::value::{Handler, Value, ValueType};

/// Index of a member within its [`TypeInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberId(pub usize);

/// Token returned by an event subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Property,
    Field,
    Method,
    Event,
}

impl MemberKind {
    /// Search order when several kinds could satisfy the same role.
    pub(crate) fn rank(self) -> u8 {
        match self {
            MemberKind::Property => 0,
            MemberKind::Field => 1,
            MemberKind::Method => 2,
            MemberKind::Event => 3,
        }
    }
}

/// One member of a runtime type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub name: String,
    pub kind: MemberKind,
    /// Value type for fields/properties, return type for methods, handler
    /// type for events.
    pub ty: ValueType,
    /// Parameter types (methods only).
    pub params: Vec<ValueType>,
    pub readable: bool,
    pub writable: bool,
    /// Properties that take index parameters cannot be read as plain values.
    pub indexed: bool,
}

impl MemberInfo {
    pub fn field(name: impl Into<String>, ty: ValueType) -> Self {
        Self::value_member(name, MemberKind::Field, ty, true, true)
    }

    /// A field that can be read but not assigned (initialised once).
    pub fn readonly_field(name: impl Into<String>, ty: ValueType) -> Self {
        Self::value_member(name, MemberKind::Field, ty, true, false)
    }

    pub fn property(name: impl Into<String>, ty: ValueType, readable: bool, writable: bool) -> Self {
        Self::value_member(name, MemberKind::Property, ty, readable, writable)
    }

    pub fn indexer(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            indexed: true,
            ..Self::value_member(name, MemberKind::Property, ty, true, true)
        }
    }

    pub fn method(name: impl Into<String>, params: Vec<ValueType>, returns: ValueType) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Method,
            ty: returns,
            params,
            readable: false,
            writable: false,
            indexed: false,
        }
    }

    pub fn event(name: impl Into<String>, handler: ValueType) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Event,
            ty: handler,
            params: Vec::new(),
            readable: false,
            writable: false,
            indexed: false,
        }
    }

    fn value_member(
        name: impl Into<String>,
        kind: MemberKind,
        ty: ValueType,
        readable: bool,
        writable: bool,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            ty,
            params: Vec::new(),
            readable,
            writable,
            indexed: false,
        }
    }
}

/// Runtime description of a host type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    pub name: String,
    pub members: Vec<MemberInfo>,
}

impl TypeInfo {
    pub fn new(name: impl Into<String>, members: Vec<MemberInfo>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }

    pub fn member(&self, id: MemberId) -> Option<&MemberInfo> {
        self.members.get(id.0)
    }

    /// Members paired with their ids, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (MemberId, &MemberInfo)> {
        self.members
            .iter()
            .enumerate()
            .map(|(idx, m)| (MemberId(idx), m))
    }
}

/// Failure raised while using a member of a host object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvokeError {
    #[error("type {type_name} has no member #{member}")]
    NoSuchMember { type_name: String, member: usize },

    #[error("{type_name}.{member} is not readable")]
    NotReadable { type_name: String, member: String },

    #[error("{type_name}.{member} is not writable")]
    NotWritable { type_name: String, member: String },

    #[error("{type_name}.{member} is a {actual:?}, not usable this way")]
    WrongKind {
        type_name: String,
        member: String,
        actual: MemberKind,
    },

    #[error("{member} expected {expected}, got {found}")]
    ArgumentMismatch {
        member: String,
        expected: String,
        found: String,
    },

    #[error("binding resolved on {expected} used with an object of type {found}")]
    ForeignType { expected: String, found: String },

    #[error("host raised: {0}")]
    Raised(String),
}

/// An opaque host object whose layout is only known at runtime.
pub trait DynObject {
    /// The runtime type of this object. Must stay the same for the object's
    /// lifetime.
    fn type_info(&self) -> Rc<TypeInfo>;

    /// Read a field or property.
    fn get(&self, member: MemberId) -> Result<Value, InvokeError>;

    /// Assign a field or property.
    fn set(&self, member: MemberId, value: Value) -> Result<(), InvokeError>;

    /// Call a method.
    fn invoke(&self, member: MemberId, args: &[Value]) -> Result<Value, InvokeError>;

    /// Attach a handler to an event.
    fn subscribe(&self, member: MemberId, handler: Handler) -> Result<SubscriptionId, InvokeError>;

    /// Detach a handler previously attached with [`DynObject::subscribe`].
    fn unsubscribe(&self, member: MemberId, id: SubscriptionId) -> Result<(), InvokeError>;
}
