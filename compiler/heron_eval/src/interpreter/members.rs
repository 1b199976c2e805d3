//! Member access and object construction.
//!
//! Field reads hit the instance's field map first; a miss falls through
//! to the descriptor's method table, where methods come back as callables
//! bound to the receiver. Interface views only expose the interface's
//! method set.

use heron_ir::Name;

use crate::environment::Frame;
use crate::errors::{arity_mismatch, no_such_field, unsupported_operation, EvalResult};
use crate::program::{FieldDef, FunDef, ModuleId, TypeRef};
use crate::shared::Heap;
use crate::value::{
    CapturedScope, FunctionValue, InstanceValue, ModuleValue, Value,
};

use super::Interpreter;

impl<'a> Interpreter<'a> {
    /// Member probe: `Ok(None)` means the member does not exist (callers
    /// decide whether that is an error).
    pub(crate) fn try_get_member(
        &mut self,
        value: &Value,
        name: Name,
    ) -> EvalResult<Option<Value>> {
        Ok(match value {
            Value::Instance(inst) => {
                if let Some(v) = inst.fields.read().get(name).cloned() {
                    Some(v)
                } else {
                    let class = self.program.class(inst.class);
                    class
                        .find_method(name)
                        .map(|def| self.bind_function(def, class.module, value.clone()))
                }
            }
            Value::Interface(iface) => {
                let idef = self.program.interface(iface.interface);
                if !idef.has_method(name) {
                    None
                } else {
                    let class = self.program.class(iface.instance.class);
                    class.find_method(name).map(|def| {
                        self.bind_function(
                            def,
                            class.module,
                            Value::Instance(iface.instance.clone()),
                        )
                    })
                }
            }
            Value::Module(m) => {
                if let Some(v) = m.fields.read().get(name).cloned() {
                    Some(v)
                } else {
                    let def = self.program.module(m.module);
                    def.find_method(name)
                        .map(|fd| self.bind_function(fd, m.module, value.clone()))
                }
            }
            // Enum members are reached through the enum's type value:
            // `Color.Red`.
            Value::Type(TypeRef::Enum(e)) => {
                let def = self.program.enum_def(*e);
                if def.has_member(name) {
                    Some(Value::enum_member(*e, name))
                } else {
                    None
                }
            }
            _ => None,
        })
    }

    /// Field-or-method read; methods return bound to the receiver.
    pub(crate) fn get_member(&mut self, value: &Value, name: Name) -> EvalResult {
        match self.try_get_member(value, name)? {
            Some(v) => Ok(v),
            None => Err(no_such_field(
                self.interner.lookup(name),
                &self.describe(value),
            )),
        }
    }

    /// Strict field write for assignment: the field must already exist.
    pub(crate) fn set_member(&mut self, value: &Value, name: Name, v: Value) -> EvalResult<()> {
        match value.set_field(name, v) {
            Some(true) => Ok(()),
            Some(false) => Err(no_such_field(
                self.interner.lookup(name),
                &self.describe(value),
            )),
            None => Err(unsupported_operation(".field =", value.type_name())),
        }
    }

    /// Wrap a descriptor method as a callable bound to `receiver`.
    pub(crate) fn bind_function(
        &self,
        def: &FunDef,
        module: ModuleId,
        receiver: Value,
    ) -> Value {
        Value::Function(FunctionValue {
            name: def.name,
            params: def.params,
            ret_ty: def.ret_ty,
            body: def.body,
            arena: self.program.module(module).arena.clone(),
            module,
            receiver: Some(Box::new(receiver)),
            captured: Heap::new(CapturedScope::default()),
        })
    }

    /// Construct a value of type `t` (the `new` operator).
    pub(crate) fn instantiate(&mut self, t: TypeRef, args: &[Value]) -> EvalResult {
        match t {
            TypeRef::Class(c) => {
                let class = self.program.class(c);
                let instance = InstanceValue::new(c);
                self.init_fields(
                    &class.fields,
                    class.module,
                    Value::Instance(instance.clone()),
                )?;
                if let Some(ctor) = class.find_method(self.names.constructor) {
                    let bound =
                        self.bind_function(ctor, class.module, Value::Instance(instance.clone()));
                    self.apply(&bound, args, None)?;
                } else if !args.is_empty() {
                    return Err(arity_mismatch(
                        self.interner.lookup(class.name),
                        0,
                        args.len(),
                    ));
                }
                Ok(Value::Instance(instance))
            }
            TypeRef::Module(m) => {
                if !args.is_empty() {
                    let name = self.program.module(m).name;
                    return Err(arity_mismatch(self.interner.lookup(name), 0, args.len()));
                }
                let module = self.program.module(m);
                let value = ModuleValue::new(m);
                self.init_fields(&module.fields, m, Value::Module(value.clone()))?;
                Ok(Value::Module(value))
            }
            _ => Err(unsupported_operation(
                "new",
                &self.program.type_name(t, self.interner),
            )),
        }
    }

    /// Evaluate field initializers in declaration order, with the fresh
    /// object as the receiver so later initializers can read earlier
    /// fields. Fields are set-or-add: first write creates the slot.
    fn init_fields(
        &mut self,
        fields: &[FieldDef],
        module: ModuleId,
        receiver: Value,
    ) -> EvalResult<()> {
        let arena = self.program.module(module).arena.clone();
        let mut frame = Frame::new(module);
        frame.receiver = Some(receiver.clone());
        self.in_arena(arena, |i| {
            i.with_frame(frame, |i| {
                for field in fields {
                    let v = if field.init.is_valid() {
                        i.eval_expr(field.init)?
                    } else {
                        Value::Null
                    };
                    match &receiver {
                        Value::Instance(inst) => inst.fields.write().set_or_add(field.name, v),
                        Value::Module(m) => m.fields.write().set_or_add(field.name, v),
                        _ => unreachable!("field init receiver is an instance or module"),
                    }
                }
                Ok(())
            })
        })
    }

    /// Human description of a value for member errors.
    fn describe(&self, value: &Value) -> String {
        match value {
            Value::Instance(inst) => {
                format!(
                    "instance of `{}`",
                    self.interner.lookup(self.program.class(inst.class).name)
                )
            }
            Value::Interface(iface) => format!(
                "interface `{}`",
                self.interner
                    .lookup(self.program.interface(iface.interface).name)
            ),
            Value::Module(m) => format!(
                "module `{}`",
                self.interner.lookup(self.program.module(m.module).name)
            ),
            Value::Type(t) => format!("type `{}`", self.program.type_name(*t, self.interner)),
            other => other.type_name().to_string(),
        }
    }
}
