//! Runtime values for the Heron interpreter.
//!
//! `Value` is the closed taxonomy the evaluator dispatches on. Primitives
//! are inline and have value semantics; aggregates (lists, arrays,
//! instance field maps) are shared handles with reference semantics.
//! Every variant is `Send + Sync` so reduce workers can share values
//! read-only.
//!
//! Heap values are only constructible through the factory methods here;
//! the [`Heap`]/[`Shared`] wrappers have crate-private constructors.

use std::fmt;

use rustc_hash::FxHashMap;

use heron_ir::{Name, ParamRange, SharedArena, StmtRange};

use crate::errors::{index_out_of_bounds, type_mismatch, unsupported_operation, EvalResult};
use crate::program::{ClassId, EnumId, InterfaceId, ModuleId, PrimitiveType, TypeRef};
use crate::shared::{Heap, Shared};

/// Snapshot of free-variable bindings captured by a closure.
pub type CapturedScope = FxHashMap<Name, Value>;

/// Runtime value.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Void,
    Int(i64),
    Float(f64),
    Bool(bool),
    Char(char),
    /// Immutable string.
    Str(Heap<String>),
    /// Growable ordered sequence, reference semantics.
    List(Shared<Vec<Value>>),
    /// Fixed-length sequence, reference semantics.
    Array(Shared<Vec<Value>>),
    /// Callable closure, possibly bound to a receiver.
    Function(FunctionValue),
    /// Class instance; identity equality.
    Instance(InstanceValue),
    /// Interface view over a class instance; identity equality of the
    /// underlying instance.
    Interface(InterfaceValue),
    /// Instantiated module.
    Module(ModuleValue),
    /// Enum member; `(descriptor, member)` equality.
    EnumMember(EnumMemberValue),
    /// First-class type, usable with `is` / `as` / `new`.
    Type(TypeRef),
    /// Erased wrapper; only `is` / `as` look inside.
    Any(Heap<Value>),
}

/// A closure: code plus captured environment plus optional receiver.
#[derive(Clone)]
pub struct FunctionValue {
    /// Declared name; `Name::EMPTY` for anonymous functions.
    pub name: Name,
    pub params: ParamRange,
    /// Declared return type name; `Name::EMPTY` = unannotated.
    pub ret_ty: Name,
    pub body: StmtRange,
    /// The arena the body was parsed into. Calls resolve body ids against
    /// this arena, never the caller's.
    pub arena: SharedArena,
    /// Module the function was defined in; governs type-name resolution
    /// inside the body.
    pub module: ModuleId,
    /// Bound receiver for methods extracted from an instance or module.
    pub receiver: Option<Box<Value>>,
    /// Free variables snapshotted at closure creation.
    pub captured: Heap<CapturedScope>,
}

impl FunctionValue {
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Rebind to a receiver, keeping code and captures.
    pub fn bind(&self, receiver: Value) -> FunctionValue {
        FunctionValue {
            receiver: Some(Box::new(receiver)),
            ..self.clone()
        }
    }
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionValue")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("body", &self.body)
            .field("bound", &self.receiver.is_some())
            .finish_non_exhaustive()
    }
}

/// Insertion-ordered field storage for instances and modules.
#[derive(Clone, Debug, Default)]
pub struct FieldMap {
    entries: Vec<(Name, Value)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: Name) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    pub fn has(&self, name: Name) -> bool {
        self.entries.iter().any(|(n, _)| *n == name)
    }

    /// Replace an existing field. Returns `false` if the field is absent.
    #[must_use]
    pub fn set(&mut self, name: Name, value: Value) -> bool {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Replace an existing field, or append a new one.
    pub fn set_or_add(&mut self, name: Name, value: Value) {
        if !self.set(name, value.clone()) {
            self.entries.push((name, value));
        }
    }

    /// Field names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = Name> + '_ {
        self.entries.iter().map(|(n, _)| *n)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A class instance.
#[derive(Clone, Debug)]
pub struct InstanceValue {
    pub class: ClassId,
    pub fields: Shared<FieldMap>,
}

impl InstanceValue {
    pub fn new(class: ClassId) -> Self {
        InstanceValue {
            class,
            fields: Shared::new(FieldMap::new()),
        }
    }

    /// Object identity.
    pub fn ptr_eq(&self, other: &InstanceValue) -> bool {
        self.fields.ptr_eq(&other.fields)
    }
}

/// An interface view over an instance.
#[derive(Clone, Debug)]
pub struct InterfaceValue {
    pub interface: InterfaceId,
    pub instance: InstanceValue,
}

/// An instantiated module.
#[derive(Clone, Debug)]
pub struct ModuleValue {
    pub module: ModuleId,
    pub fields: Shared<FieldMap>,
}

impl ModuleValue {
    pub fn new(module: ModuleId) -> Self {
        ModuleValue {
            module,
            fields: Shared::new(FieldMap::new()),
        }
    }
}

/// An enum member.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnumMemberValue {
    pub enum_id: EnumId,
    pub member: Name,
}

// Factory methods

impl Value {
    #[inline]
    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(Heap::new(s.into()))
    }

    #[inline]
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Shared::new(items))
    }

    #[inline]
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Shared::new(items))
    }

    #[inline]
    pub fn any(inner: Value) -> Self {
        Value::Any(Heap::new(inner))
    }

    #[inline]
    pub fn interface(interface: InterfaceId, instance: InstanceValue) -> Self {
        Value::Interface(InterfaceValue {
            interface,
            instance,
        })
    }

    #[inline]
    pub fn enum_member(enum_id: EnumId, member: Name) -> Self {
        Value::EnumMember(EnumMemberValue { enum_id, member })
    }
}

// Capabilities

impl Value {
    /// Kind name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Void => "void",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Char(_) => "char",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Array(_) => "array",
            Value::Function(_) => "function",
            Value::Instance(_) => "instance",
            Value::Interface(_) => "interface instance",
            Value::Module(_) => "module instance",
            Value::EnumMember(_) => "enum member",
            Value::Type(_) => "type",
            Value::Any(_) => "any",
        }
    }

    /// The primitive type this value belongs to, if any. Descriptor-backed
    /// values (instances, interface views, modules, enum members) answer
    /// through [`Value::type_of`] instead.
    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        match self {
            Value::Null => Some(PrimitiveType::Null),
            Value::Void => Some(PrimitiveType::Void),
            Value::Int(_) => Some(PrimitiveType::Int),
            Value::Float(_) => Some(PrimitiveType::Float),
            Value::Bool(_) => Some(PrimitiveType::Bool),
            Value::Char(_) => Some(PrimitiveType::Char),
            Value::Str(_) => Some(PrimitiveType::Str),
            Value::List(_) => Some(PrimitiveType::List),
            Value::Array(_) => Some(PrimitiveType::Array),
            Value::Function(_) => Some(PrimitiveType::Function),
            Value::Type(_) => Some(PrimitiveType::Type),
            Value::Any(_) => Some(PrimitiveType::Any),
            Value::Instance(_)
            | Value::Interface(_)
            | Value::Module(_)
            | Value::EnumMember(_) => None,
        }
    }

    /// First-class type of this value.
    pub fn type_of(&self) -> TypeRef {
        match self {
            Value::Instance(inst) => TypeRef::Class(inst.class),
            Value::Interface(iface) => TypeRef::Interface(iface.interface),
            Value::Module(m) => TypeRef::Module(m.module),
            Value::EnumMember(m) => TypeRef::Enum(m.enum_id),
            other => {
                // Every non-descriptor variant has a primitive type.
                TypeRef::Primitive(other.primitive_type().unwrap_or(PrimitiveType::Any))
            }
        }
    }

    /// Look through an `Any` wrapper.
    pub fn unwrap_any(&self) -> &Value {
        match self {
            Value::Any(inner) => inner,
            other => other,
        }
    }

    /// Raw field read on a field-bearing value (instances and modules).
    /// Method binding is the evaluator's job.
    pub fn get_field(&self, name: Name) -> Option<Value> {
        match self {
            Value::Instance(inst) => inst.fields.read().get(name).cloned(),
            Value::Interface(iface) => iface.instance.fields.read().get(name).cloned(),
            Value::Module(m) => m.fields.read().get(name).cloned(),
            _ => None,
        }
    }

    /// Replace an existing field. `Some(false)` = value is field-bearing
    /// but the field is absent; `None` = value has no fields at all.
    pub fn set_field(&self, name: Name, value: Value) -> Option<bool> {
        match self {
            Value::Instance(inst) => Some(inst.fields.write().set(name, value)),
            Value::Interface(iface) => Some(iface.instance.fields.write().set(name, value)),
            Value::Module(m) => Some(m.fields.write().set(name, value)),
            _ => None,
        }
    }

    /// Sequence element read: lists, arrays and strings.
    pub fn get_at_index(&self, index: &Value) -> EvalResult {
        let idx = match index {
            Value::Int(n) => *n,
            other => return Err(type_mismatch("int index", other.type_name())),
        };
        match self {
            Value::List(items) | Value::Array(items) => {
                let items = items.read();
                usize::try_from(idx)
                    .ok()
                    .and_then(|i| items.get(i).cloned())
                    .ok_or_else(|| index_out_of_bounds(idx, items.len()))
            }
            Value::Str(s) => usize::try_from(idx)
                .ok()
                .and_then(|i| s.chars().nth(i))
                .map(Value::Char)
                .ok_or_else(|| index_out_of_bounds(idx, s.chars().count())),
            other => Err(unsupported_operation("[]", other.type_name())),
        }
    }

    /// Sequence element write: lists and arrays, in bounds only.
    pub fn set_at_index(&self, index: &Value, value: Value) -> EvalResult<()> {
        let idx = match index {
            Value::Int(n) => *n,
            other => return Err(type_mismatch("int index", other.type_name())),
        };
        match self {
            Value::List(items) | Value::Array(items) => {
                let mut items = items.write();
                let len = items.len();
                match usize::try_from(idx).ok().and_then(|i| items.get_mut(i)) {
                    Some(slot) => {
                        *slot = value;
                        Ok(())
                    }
                    None => Err(index_out_of_bounds(idx, len)),
                }
            }
            other => Err(unsupported_operation("[]=", other.type_name())),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            // Equality looks through erased wrappers on either side.
            (Value::Any(a), b) => (**a).eq(b),
            (a, Value::Any(b)) => a.eq(b),
            (Value::Null, Value::Null) | (Value::Void, Value::Void) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            // IEEE 754: NaN != NaN, -0.0 == 0.0.
            (Value::Float(a), Value::Float(b)) => {
                a.partial_cmp(b) == Some(std::cmp::Ordering::Equal)
            }
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a.ptr_eq(b) || **a == **b,
            (Value::List(a), Value::List(b)) | (Value::Array(a), Value::Array(b)) => {
                a.ptr_eq(b) || *a.read() == *b.read()
            }
            (Value::Function(a), Value::Function(b)) => {
                a.captured.ptr_eq(&b.captured) && a.body == b.body
            }
            (Value::Instance(a), Value::Instance(b)) => a.ptr_eq(b),
            (Value::Interface(a), Value::Interface(b)) => a.instance.ptr_eq(&b.instance),
            (Value::Module(a), Value::Module(b)) => a.fields.ptr_eq(&b.fields),
            (Value::EnumMember(a), Value::EnumMember(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_has_reference_semantics() {
        let a = Value::list(vec![Value::Int(1)]);
        let b = a.clone();
        if let Value::List(items) = &b {
            items.write().push(Value::Int(2));
        }
        if let Value::List(items) = &a {
            assert_eq!(items.read().len(), 2);
        } else {
            unreachable!();
        }
    }

    #[test]
    fn instance_equality_is_identity() {
        let a = InstanceValue::new(ClassId::new(0));
        let b = InstanceValue::new(ClassId::new(0));
        assert_eq!(Value::Instance(a.clone()), Value::Instance(a.clone()));
        assert_ne!(Value::Instance(a), Value::Instance(b));
    }

    #[test]
    fn enum_member_equality_is_structural() {
        let red = Value::enum_member(EnumId::new(0), Name::from_raw(1));
        let red2 = Value::enum_member(EnumId::new(0), Name::from_raw(1));
        let blue = Value::enum_member(EnumId::new(0), Name::from_raw(2));
        assert_eq!(red, red2);
        assert_ne!(red, blue);
    }

    #[test]
    fn nan_is_not_equal_to_itself() {
        assert_ne!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_eq!(Value::Float(0.0), Value::Float(-0.0));
    }

    #[test]
    fn list_deep_equality() {
        let a = Value::list(vec![Value::Int(1), Value::string("x")]);
        let b = Value::list(vec![Value::Int(1), Value::string("x")]);
        assert_eq!(a, b);
    }

    #[test]
    fn any_equality_unwraps() {
        assert_eq!(Value::any(Value::Int(3)), Value::Int(3));
        assert_eq!(Value::Int(3), Value::any(Value::Int(3)));
    }

    #[test]
    fn index_read_and_write() {
        let list = Value::list(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(list.get_at_index(&Value::Int(1)).unwrap(), Value::Int(2));
        list.set_at_index(&Value::Int(0), Value::Int(9)).unwrap();
        assert_eq!(list.get_at_index(&Value::Int(0)).unwrap(), Value::Int(9));
        assert!(list.get_at_index(&Value::Int(5)).is_err());
        assert!(list.set_at_index(&Value::Int(5), Value::Null).is_err());
        assert!(list.get_at_index(&Value::Int(-1)).is_err());
    }

    #[test]
    fn string_index_yields_chars() {
        let s = Value::string("hej");
        assert_eq!(s.get_at_index(&Value::Int(1)).unwrap(), Value::Char('e'));
        assert!(s.get_at_index(&Value::Int(3)).is_err());
    }

    #[test]
    fn field_map_is_insertion_ordered() {
        let mut fields = FieldMap::new();
        fields.set_or_add(Name::from_raw(3), Value::Int(1));
        fields.set_or_add(Name::from_raw(1), Value::Int(2));
        fields.set_or_add(Name::from_raw(2), Value::Int(3));
        let names: Vec<_> = fields.names().collect();
        assert_eq!(
            names,
            vec![Name::from_raw(3), Name::from_raw(1), Name::from_raw(2)]
        );
    }

    #[test]
    fn field_map_set_requires_presence() {
        let mut fields = FieldMap::new();
        assert!(!fields.set(Name::from_raw(1), Value::Int(1)));
        fields.set_or_add(Name::from_raw(1), Value::Int(1));
        assert!(fields.set(Name::from_raw(1), Value::Int(2)));
        assert_eq!(fields.get(Name::from_raw(1)), Some(&Value::Int(2)));
    }
}
