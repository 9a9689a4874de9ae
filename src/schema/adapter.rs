//! Capability resolution against host objects with drifting member names.
//!
//! A role (e.g. "current-locale-reader") is described by a [`RoleSpec`]: an
//! ordered list of candidate member names and the [`Shape`] the member must
//! have. Resolution tries the names first, then (if the role allows it) the
//! first member of the right shape regardless of name. Successful bindings
//! are memoized per (runtime type, role) for the life of the adapter.
//! Failures are not memoized.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::object::{DynObject, InvokeError, MemberId, MemberInfo, MemberKind, SubscriptionId};
use super::value::{Handler, Value, ValueType};

/// How a member's declared type is matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeMatch {
    Exact(ValueType),
    /// Any object type whose name contains the pattern (ASCII case-insensitive)
    ObjectNameContains(&'static str),
}

impl TypeMatch {
    pub fn matches(&self, ty: &ValueType) -> bool {
        match self {
            TypeMatch::Exact(expected) => expected == ty,
            TypeMatch::ObjectNameContains(pattern) => match ty {
                ValueType::Object(name) => name
                    .to_ascii_lowercase()
                    .contains(&pattern.to_ascii_lowercase()),
                _ => false,
            },
        }
    }
}

/// The shape a member must have to serve a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// Readable, non-indexed field or property
    Readable(TypeMatch),
    /// Writable, non-indexed field or property
    Writable(TypeMatch),
    /// Method with exactly these parameter types
    Invocable(Vec<ValueType>),
    /// Event whose handler type matches
    Subscribable(TypeMatch),
}

impl Shape {
    pub fn readable(ty: ValueType) -> Self {
        Shape::Readable(TypeMatch::Exact(ty))
    }

    pub fn writable(ty: ValueType) -> Self {
        Shape::Writable(TypeMatch::Exact(ty))
    }

    pub fn is_satisfied_by(&self, member: &MemberInfo) -> bool {
        let is_value = matches!(member.kind, MemberKind::Property | MemberKind::Field);
        match self {
            Shape::Readable(ty) => {
                is_value && member.readable && !member.indexed && ty.matches(&member.ty)
            }
            Shape::Writable(ty) => {
                is_value && member.writable && !member.indexed && ty.matches(&member.ty)
            }
            Shape::Invocable(params) => {
                member.kind == MemberKind::Method && member.params == *params
            }
            Shape::Subscribable(ty) => member.kind == MemberKind::Event && ty.matches(&member.ty),
        }
    }
}

/// Description of one logical role to resolve.
#[derive(Debug, Clone)]
pub struct RoleSpec {
    /// Cache key; one binding per (type, role)
    pub role: &'static str,
    /// Names tried in order before any type-based search
    pub candidates: &'static [&'static str],
    pub shape: Shape,
    /// Whether to fall back to the first member of the right shape when no
    /// candidate name matches
    pub type_scan: bool,
}

/// Which phase of the search produced a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedBy {
    Name,
    Shape,
}

/// A resolved member on a specific runtime type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberBinding {
    pub role: &'static str,
    pub type_name: String,
    pub member: MemberId,
    pub member_name: String,
    pub kind: MemberKind,
    pub matched_by: MatchedBy,
}

impl MemberBinding {
    fn check_type(&self, object: &dyn DynObject) -> Result<(), InvokeError> {
        let info = object.type_info();
        if info.name == self.type_name {
            Ok(())
        } else {
            Err(InvokeError::ForeignType {
                expected: self.type_name.clone(),
                found: info.name.clone(),
            })
        }
    }

    pub fn read(&self, object: &dyn DynObject) -> Result<Value, InvokeError> {
        self.check_type(object)?;
        object.get(self.member)
    }

    pub fn write(&self, object: &dyn DynObject, value: Value) -> Result<(), InvokeError> {
        self.check_type(object)?;
        object.set(self.member, value)
    }

    pub fn invoke(&self, object: &dyn DynObject, args: &[Value]) -> Result<Value, InvokeError> {
        self.check_type(object)?;
        object.invoke(self.member, args)
    }

    pub fn subscribe(
        &self,
        object: &dyn DynObject,
        handler: Handler,
    ) -> Result<SubscriptionId, InvokeError> {
        self.check_type(object)?;
        object.subscribe(self.member, handler)
    }

    pub fn unsubscribe(&self, object: &dyn DynObject, id: SubscriptionId) -> Result<(), InvokeError> {
        self.check_type(object)?;
        object.unsubscribe(self.member, id)
    }
}

/// Outcome of a resolution. `Unbound` is a normal result, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Bound(MemberBinding),
    Unbound,
}

impl Resolution {
    pub fn binding(self) -> Option<MemberBinding> {
        match self {
            Resolution::Bound(binding) => Some(binding),
            Resolution::Unbound => None,
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self, Resolution::Bound(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BindingKey {
    type_name: String,
    role: &'static str,
}

/// Memoizing resolver of role bindings.
#[derive(Debug, Default)]
pub struct SchemaAdapter {
    bindings: RefCell<HashMap<BindingKey, MemberBinding>>,
    scans: Cell<u64>,
}

impl SchemaAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `spec` against the runtime type of `object`.
    pub fn resolve(&self, object: &dyn DynObject, spec: &RoleSpec) -> Resolution {
        let info = object.type_info();
        let key = BindingKey {
            type_name: info.name.clone(),
            role: spec.role,
        };

        if let Some(binding) = self.bindings.borrow().get(&key) {
            return Resolution::Bound(binding.clone());
        }

        self.scans.set(self.scans.get() + 1);

        let mut ordered: Vec<_> = info.iter().collect();
        ordered.sort_by_key(|(_, m)| m.kind.rank());

        let by_name = spec.candidates.iter().find_map(|name| {
            ordered
                .iter()
                .find(|(_, m)| m.name == *name && spec.shape.is_satisfied_by(m))
                .map(|(id, m)| (*id, *m, MatchedBy::Name))
        });

        let found = by_name.or_else(|| {
            if !spec.type_scan {
                return None;
            }
            ordered
                .iter()
                .find(|(_, m)| spec.shape.is_satisfied_by(m))
                .map(|(id, m)| (*id, *m, MatchedBy::Shape))
        });

        let Some((member, info_member, matched_by)) = found else {
            log::debug!("No member on {} satisfies role {}", info.name, spec.role);
            return Resolution::Unbound;
        };

        let binding = MemberBinding {
            role: spec.role,
            type_name: info.name.clone(),
            member,
            member_name: info_member.name.clone(),
            kind: info_member.kind,
            matched_by,
        };
        log::debug!(
            "Resolved role {} on {} to {:?} {} (by {:?})",
            spec.role,
            info.name,
            binding.kind,
            binding.member_name,
            matched_by
        );
        self.bindings.borrow_mut().insert(key, binding.clone());
        Resolution::Bound(binding)
    }

    /// Number of full member scans performed (cache misses).
    pub fn scan_count(&self) -> u64 {
        self.scans.get()
    }

    /// Number of memoized bindings.
    pub fn cached_bindings(&self) -> usize {
        self.bindings.borrow().len()
    }
}
