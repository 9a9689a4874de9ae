//! Dynamic object model and the capability-resolution adapter.

mod adapter;
mod object;
mod value;

pub use adapter::{
    MatchedBy, MemberBinding, Resolution, RoleSpec, SchemaAdapter, Shape, TypeMatch,
};
pub use object::{DynObject, InvokeError, MemberId, MemberInfo, MemberKind, SubscriptionId, TypeInfo};
pub use value::{Action, Handler, LocaleFontMap, Value, ValueType};
