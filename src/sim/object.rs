//! A dynamic object whose members are defined at runtime.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::schema::{
    DynObject, Handler, InvokeError, MemberId, MemberInfo, MemberKind, SubscriptionId, TypeInfo,
    Value, ValueType,
};

/// Body of a simulated method.
pub type MethodFn = Rc<dyn Fn(&[Value]) -> Result<Value, InvokeError>>;

enum Slot {
    Value(RefCell<Value>),
    Method(MethodFn),
    Event(RefCell<Vec<(SubscriptionId, Handler)>>),
}

impl Slot {
    fn for_member(member: &MemberInfo) -> Self {
        match member.kind {
            MemberKind::Field | MemberKind::Property => Slot::Value(RefCell::new(Value::Unit)),
            MemberKind::Method => {
                let name = member.name.clone();
                Slot::Method(Rc::new(move |_| {
                    Err(InvokeError::Raised(format!("{name} is not implemented")))
                }))
            }
            MemberKind::Event => Slot::Event(RefCell::new(Vec::new())),
        }
    }
}

fn value_fits(ty: &ValueType, value: &Value) -> bool {
    matches!(
        (ty, value),
        (ValueType::Unit, Value::Unit)
            | (ValueType::Bool, Value::Bool(_))
            | (ValueType::Str, Value::Str(_))
            | (ValueType::Asset, Value::Asset(_))
            | (ValueType::FontMap, Value::FontMap(_))
            | (ValueType::Object(_), Value::Object(_))
            | (ValueType::Text, Value::Text(_))
            | (ValueType::Action, Value::Action(_))
            | (ValueType::Handler(_), Value::Handler(_))
    )
}

/// In-memory [`DynObject`].
pub struct SimObject {
    info: Rc<TypeInfo>,
    slots: Vec<Slot>,
    next_subscription: Cell<u64>,
}

impl std::fmt::Debug for SimObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimObject")
            .field("type", &self.info.name)
            .field("members", &self.info.members.len())
            .finish()
    }
}

impl SimObject {
    fn member(&self, id: MemberId) -> Result<(&MemberInfo, &Slot), InvokeError> {
        match (self.info.member(id), self.slots.get(id.0)) {
            (Some(info), Some(slot)) => Ok((info, slot)),
            _ => Err(InvokeError::NoSuchMember {
                type_name: self.info.name.clone(),
                member: id.0,
            }),
        }
    }

    fn wrong_kind(&self, info: &MemberInfo) -> InvokeError {
        InvokeError::WrongKind {
            type_name: self.info.name.clone(),
            member: info.name.clone(),
            actual: info.kind,
        }
    }

    fn id_of(&self, name: &str) -> Option<MemberId> {
        self.info
            .iter()
            .find(|(_, m)| m.name == name)
            .map(|(id, _)| id)
    }

    /// Read a value member by name, bypassing access flags.
    pub fn get_named(&self, name: &str) -> Option<Value> {
        let id = self.id_of(name)?;
        match self.slots.get(id.0)? {
            Slot::Value(value) => Some(value.borrow().clone()),
            _ => None,
        }
    }

    /// Assign a value member by name, bypassing access flags.
    pub fn set_named(&self, name: &str, value: Value) -> bool {
        let Some(id) = self.id_of(name) else {
            return false;
        };
        match self.slots.get(id.0) {
            Some(Slot::Value(slot)) => {
                *slot.borrow_mut() = value;
                true
            }
            _ => false,
        }
    }

    /// Raise an event by name. Handlers run on a snapshot of the handler
    /// list, so they may subscribe or unsubscribe while running.
    pub fn fire(&self, event: &str, args: &[Value]) -> usize {
        let slot = self.id_of(event).and_then(|id| self.slots.get(id.0));
        let handlers: Vec<Handler> = match slot {
            Some(Slot::Event(handlers)) => {
                handlers.borrow().iter().map(|(_, h)| Rc::clone(h)).collect()
            }
            _ => return 0,
        };
        for handler in &handlers {
            handler(args);
        }
        handlers.len()
    }

    /// Number of handlers attached to an event.
    pub fn handler_count(&self, event: &str) -> usize {
        match self.id_of(event).and_then(|id| self.slots.get(id.0)) {
            Some(Slot::Event(handlers)) => handlers.borrow().len(),
            _ => 0,
        }
    }
}

impl DynObject for SimObject {
    fn type_info(&self) -> Rc<TypeInfo> {
        Rc::clone(&self.info)
    }

    fn get(&self, member: MemberId) -> Result<Value, InvokeError> {
        let (info, slot) = self.member(member)?;
        match slot {
            Slot::Value(value) if info.readable && !info.indexed => Ok(value.borrow().clone()),
            Slot::Value(_) => Err(InvokeError::NotReadable {
                type_name: self.info.name.clone(),
                member: info.name.clone(),
            }),
            _ => Err(self.wrong_kind(info)),
        }
    }

    fn set(&self, member: MemberId, value: Value) -> Result<(), InvokeError> {
        let (info, slot) = self.member(member)?;
        let Slot::Value(slot) = slot else {
            return Err(self.wrong_kind(info));
        };
        if !info.writable || info.indexed {
            return Err(InvokeError::NotWritable {
                type_name: self.info.name.clone(),
                member: info.name.clone(),
            });
        }
        if !value_fits(&info.ty, &value) {
            return Err(InvokeError::ArgumentMismatch {
                member: info.name.clone(),
                expected: info.ty.to_string(),
                found: value.kind_name().to_string(),
            });
        }
        *slot.borrow_mut() = value;
        Ok(())
    }

    fn invoke(&self, member: MemberId, args: &[Value]) -> Result<Value, InvokeError> {
        let (info, slot) = self.member(member)?;
        let Slot::Method(body) = slot else {
            return Err(self.wrong_kind(info));
        };
        let arity_ok = args.len() == info.params.len();
        if let Some((expected, found)) = info
            .params
            .iter()
            .zip(args)
            .find(|(ty, arg)| !value_fits(ty, arg))
            .map(|(ty, arg)| (ty.to_string(), arg.kind_name().to_string()))
            .or_else(|| (!arity_ok).then(|| (info.params.len().to_string(), args.len().to_string())))
        {
            return Err(InvokeError::ArgumentMismatch {
                member: info.name.clone(),
                expected,
                found,
            });
        }
        body(args)
    }

    fn subscribe(&self, member: MemberId, handler: Handler) -> Result<SubscriptionId, InvokeError> {
        let (info, slot) = self.member(member)?;
        let Slot::Event(handlers) = slot else {
            return Err(self.wrong_kind(info));
        };
        let id = SubscriptionId(self.next_subscription.get());
        self.next_subscription.set(id.0 + 1);
        handlers.borrow_mut().push((id, handler));
        Ok(id)
    }

    fn unsubscribe(&self, member: MemberId, id: SubscriptionId) -> Result<(), InvokeError> {
        let (info, slot) = self.member(member)?;
        let Slot::Event(handlers) = slot else {
            return Err(self.wrong_kind(info));
        };
        handlers.borrow_mut().retain(|(sub, _)| *sub != id);
        Ok(())
    }
}

/// Builder for [`SimObject`]; members are declared in call order.
pub struct SimObjectBuilder {
    name: String,
    info: Option<Rc<TypeInfo>>,
    members: Vec<MemberInfo>,
    slots: Vec<Slot>,
}

impl SimObjectBuilder {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            name: type_name.into(),
            info: None,
            members: Vec::new(),
            slots: Vec::new(),
        }
    }

    /// Instance of an existing type. Value members start as `Unit`, methods
    /// raise until given a body with [`SimObjectBuilder::with_method`].
    pub fn from_type_info(info: impl Into<Rc<TypeInfo>>) -> Self {
        let info = info.into();
        Self {
            name: info.name.clone(),
            slots: info.members.iter().map(Slot::for_member).collect(),
            members: Vec::new(),
            info: Some(info),
        }
    }

    fn push(mut self, member: MemberInfo, slot: Slot) -> Self {
        self.members.push(member);
        self.slots.push(slot);
        self
    }

    pub fn field(self, name: &str, ty: ValueType, value: Value) -> Self {
        self.push(MemberInfo::field(name, ty), Slot::Value(RefCell::new(value)))
    }

    pub fn readonly_field(self, name: &str, ty: ValueType, value: Value) -> Self {
        self.push(MemberInfo::readonly_field(name, ty), Slot::Value(RefCell::new(value)))
    }

    pub fn property(
        self,
        name: &str,
        ty: ValueType,
        readable: bool,
        writable: bool,
        value: Value,
    ) -> Self {
        self.push(
            MemberInfo::property(name, ty, readable, writable),
            Slot::Value(RefCell::new(value)),
        )
    }

    pub fn method(
        self,
        name: &str,
        params: Vec<ValueType>,
        returns: ValueType,
        body: impl Fn(&[Value]) -> Result<Value, InvokeError> + 'static,
    ) -> Self {
        self.push(
            MemberInfo::method(name, params, returns),
            Slot::Method(Rc::new(body)),
        )
    }

    pub fn event(self, name: &str, handler: ValueType) -> Self {
        self.push(MemberInfo::event(name, handler), Slot::Event(RefCell::new(Vec::new())))
    }

    /// Set the initial value of a member declared by the shared type.
    pub fn with_value(mut self, name: &str, value: Value) -> Self {
        if let Some(idx) = self.declared_index(name)
            && let Some(Slot::Value(slot)) = self.slots.get_mut(idx)
        {
            *slot.get_mut() = value;
        }
        self
    }

    /// Give a body to a method declared by the shared type.
    pub fn with_method(
        mut self,
        name: &str,
        body: impl Fn(&[Value]) -> Result<Value, InvokeError> + 'static,
    ) -> Self {
        if let Some(idx) = self.declared_index(name)
            && matches!(self.slots.get(idx), Some(Slot::Method(_)))
        {
            self.slots[idx] = Slot::Method(Rc::new(body));
        }
        self
    }

    fn declared_index(&self, name: &str) -> Option<usize> {
        match &self.info {
            Some(info) => info.members.iter().position(|m| m.name == name),
            None => self.members.iter().position(|m| m.name == name),
        }
    }

    pub fn build(self) -> Rc<SimObject> {
        let info = self
            .info
            .unwrap_or_else(|| Rc::new(TypeInfo::new(self.name, self.members)));
        Rc::new(SimObject {
            info,
            slots: self.slots,
            next_subscription: Cell::new(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_with_access_flags() {
        let obj = SimObjectBuilder::new("Thing")
            .field("name", ValueType::Str, Value::from("a"))
            .readonly_field("fixed", ValueType::Str, Value::from("b"))
            .build();

        obj.set(MemberId(0), Value::from("c")).unwrap();
        assert_eq!(obj.get(MemberId(0)).unwrap().as_str(), Some("c"));
        assert!(matches!(
            obj.set(MemberId(1), Value::from("d")),
            Err(InvokeError::NotWritable { .. })
        ));
        assert!(matches!(
            obj.set(MemberId(0), Value::Bool(true)),
            Err(InvokeError::ArgumentMismatch { .. })
        ));
        assert!(matches!(obj.get(MemberId(9)), Err(InvokeError::NoSuchMember { .. })));
    }

    #[test]
    fn test_invoke_checks_arguments() {
        let obj = SimObjectBuilder::new("Thing")
            .method("echo", vec![ValueType::Str], ValueType::Str, |args| {
                Ok(args[0].clone())
            })
            .build();

        assert_eq!(
            obj.invoke(MemberId(0), &[Value::from("hi")]).unwrap().as_str(),
            Some("hi")
        );
        assert!(obj.invoke(MemberId(0), &[]).is_err());
        assert!(obj.invoke(MemberId(0), &[Value::Unit]).is_err());
    }

    #[test]
    fn test_events_fire_snapshot() {
        let obj = SimObjectBuilder::new("Thing")
            .event("changed", ValueType::Handler(vec![ValueType::Str]))
            .build();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let id = obj
            .subscribe(MemberId(0), Rc::new(move |_| counter.set(counter.get() + 1)))
            .unwrap();

        assert_eq!(obj.fire("changed", &[Value::from("x")]), 1);
        obj.unsubscribe(MemberId(0), id).unwrap();
        assert_eq!(obj.fire("changed", &[Value::from("x")]), 0);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_shared_type_instances() {
        let info = Rc::new(TypeInfo::new(
            "Shared",
            vec![
                MemberInfo::field("value", ValueType::Str),
                MemberInfo::method("run", vec![], ValueType::Unit),
            ],
        ));
        let a = SimObjectBuilder::from_type_info(Rc::clone(&info))
            .with_value("value", Value::from("a"))
            .build();
        let b = SimObjectBuilder::from_type_info(info).build();

        assert_eq!(a.get_named("value").and_then(Value::into_string).as_deref(), Some("a"));
        assert!(matches!(b.get_named("value"), Some(Value::Unit)));
        assert!(matches!(b.invoke(MemberId(1), &[]), Err(InvokeError::Raised(_))));
        assert!(Rc::ptr_eq(&a.type_info(), &b.type_info()));
    }
}
