//! Program descriptors: modules, classes, interfaces, enums.
//!
//! Descriptors are stored in per-kind arenas on [`Program`] and reference
//! each other by typed ids, never by owning pointers. Resolution is
//! two-pass: first every descriptor is registered, then [`Program::resolve`]
//! wires the id links (interface implementations, module imports). After
//! resolution the program is immutable and safe to share across reduce
//! workers.

use std::fmt;

use rustc_hash::FxHashMap;

use heron_ir::{ExprId, Name, ParamRange, SharedArena, StmtRange, StringInterner};

use crate::errors::{not_a_type, EvalResult};
use crate::value::Value;

macro_rules! define_desc_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub const fn new(index: u32) -> Self {
                $name(index)
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

define_desc_id! {
    /// Index into [`Program`]'s class table.
    ClassId
}
define_desc_id! {
    /// Index into [`Program`]'s interface table.
    InterfaceId
}
define_desc_id! {
    /// Index into [`Program`]'s enum table.
    EnumId
}
define_desc_id! {
    /// Index into [`Program`]'s module table.
    ModuleId
}

/// Built-in primitive types registered on the global module.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum PrimitiveType {
    Null,
    Void,
    Int,
    Float,
    Bool,
    Char,
    Str,
    List,
    Array,
    Function,
    Any,
    Type,
}

impl PrimitiveType {
    /// The surface name the type is registered under.
    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveType::Null => "Null",
            PrimitiveType::Void => "Void",
            PrimitiveType::Int => "Int",
            PrimitiveType::Float => "Float",
            PrimitiveType::Bool => "Bool",
            PrimitiveType::Char => "Char",
            PrimitiveType::Str => "String",
            PrimitiveType::List => "List",
            PrimitiveType::Array => "Array",
            PrimitiveType::Function => "Function",
            PrimitiveType::Any => "Any",
            PrimitiveType::Type => "Type",
        }
    }

    const ALL: [PrimitiveType; 12] = [
        PrimitiveType::Null,
        PrimitiveType::Void,
        PrimitiveType::Int,
        PrimitiveType::Float,
        PrimitiveType::Bool,
        PrimitiveType::Char,
        PrimitiveType::Str,
        PrimitiveType::List,
        PrimitiveType::Array,
        PrimitiveType::Function,
        PrimitiveType::Any,
        PrimitiveType::Type,
    ];
}

/// First-class runtime reference to a type descriptor.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeRef {
    Primitive(PrimitiveType),
    Class(ClassId),
    Interface(InterfaceId),
    Enum(EnumId),
    Module(ModuleId),
}

/// A function or method definition.
#[derive(Clone, Debug)]
pub struct FunDef {
    pub name: Name,
    pub params: ParamRange,
    /// Declared return type name; `Name::EMPTY` = unannotated.
    pub ret_ty: Name,
    pub body: StmtRange,
}

/// A declared field with an optional initializer expression.
#[derive(Clone, Copy, Debug)]
pub struct FieldDef {
    pub name: Name,
    /// `ExprId::INVALID` = initialize to null.
    pub init: ExprId,
}

/// A method signature in an interface.
#[derive(Clone, Copy, Debug)]
pub struct FunSig {
    pub name: Name,
    pub arity: usize,
}

/// A class descriptor.
#[derive(Clone, Debug)]
pub struct ClassDef {
    pub name: Name,
    pub module: ModuleId,
    /// Interface names as declared; resolved into `implements` by
    /// [`Program::resolve`].
    pub implements_names: Vec<Name>,
    /// Wired interface ids (empty until resolution).
    pub implements: Vec<InterfaceId>,
    pub fields: Vec<FieldDef>,
    pub methods: Vec<FunDef>,
}

impl ClassDef {
    pub fn find_method(&self, name: Name) -> Option<&FunDef> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn has_field(&self, name: Name) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }
}

/// An interface descriptor: a method set, nothing more.
#[derive(Clone, Debug)]
pub struct InterfaceDef {
    pub name: Name,
    pub module: ModuleId,
    pub methods: Vec<FunSig>,
}

impl InterfaceDef {
    pub fn has_method(&self, name: Name) -> bool {
        self.methods.iter().any(|m| m.name == name)
    }
}

/// An enum descriptor: an ordered list of member names.
#[derive(Clone, Debug)]
pub struct EnumDef {
    pub name: Name,
    pub module: ModuleId,
    pub members: Vec<Name>,
}

impl EnumDef {
    pub fn has_member(&self, name: Name) -> bool {
        self.members.contains(&name)
    }
}

/// A module descriptor.
#[derive(Clone)]
pub struct ModuleDef {
    pub name: Name,
    /// Imported module names as declared; resolved into `imports` by the
    /// loader before [`Program::resolve`] runs.
    pub import_names: Vec<Name>,
    /// Wired module ids (empty until resolution).
    pub imports: Vec<ModuleId>,
    pub fields: Vec<FieldDef>,
    pub methods: Vec<FunDef>,
    /// Types declared in this module, by name.
    pub types: FxHashMap<Name, TypeRef>,
    /// The arena all of this module's bodies live in.
    pub arena: SharedArena,
}

impl ModuleDef {
    pub fn new(name: Name, arena: SharedArena) -> Self {
        ModuleDef {
            name,
            import_names: Vec::new(),
            imports: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            types: FxHashMap::default(),
            arena,
        }
    }

    pub fn find_method(&self, name: Name) -> Option<&FunDef> {
        self.methods.iter().find(|m| m.name == name)
    }
}

impl fmt::Debug for ModuleDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDef")
            .field("name", &self.name)
            .field("imports", &self.imports)
            .field("types", &self.types.len())
            .finish_non_exhaustive()
    }
}

/// The resolved set of modules and type descriptors for one program.
pub struct Program {
    modules: Vec<ModuleDef>,
    classes: Vec<ClassDef>,
    interfaces: Vec<InterfaceDef>,
    enums: Vec<EnumDef>,
    /// The distinguished module holding built-in types.
    global: ModuleId,
}

impl Program {
    /// Create a program with the global module and its built-in types.
    pub fn new(interner: &StringInterner) -> Self {
        let global_name = interner.intern("global");
        let mut global = ModuleDef::new(global_name, SharedArena::default());
        for prim in PrimitiveType::ALL {
            global
                .types
                .insert(interner.intern(prim.name()), TypeRef::Primitive(prim));
        }
        Program {
            modules: vec![global],
            classes: Vec::new(),
            interfaces: Vec::new(),
            enums: Vec::new(),
            global: ModuleId::new(0),
        }
    }

    pub fn global_module(&self) -> ModuleId {
        self.global
    }

    // Registration (first pass)

    pub fn add_module(&mut self, module: ModuleDef) -> ModuleId {
        let id = ModuleId::new(self.modules.len() as u32);
        self.modules.push(module);
        id
    }

    pub fn add_class(&mut self, class: ClassDef) -> ClassId {
        let id = ClassId::new(self.classes.len() as u32);
        let module = class.module;
        let name = class.name;
        self.classes.push(class);
        self.modules[module.index()]
            .types
            .insert(name, TypeRef::Class(id));
        id
    }

    pub fn add_interface(&mut self, interface: InterfaceDef) -> InterfaceId {
        let id = InterfaceId::new(self.interfaces.len() as u32);
        let module = interface.module;
        let name = interface.name;
        self.interfaces.push(interface);
        self.modules[module.index()]
            .types
            .insert(name, TypeRef::Interface(id));
        id
    }

    pub fn add_enum(&mut self, en: EnumDef) -> EnumId {
        let id = EnumId::new(self.enums.len() as u32);
        let module = en.module;
        let name = en.name;
        self.enums.push(en);
        self.modules[module.index()]
            .types
            .insert(name, TypeRef::Enum(id));
        id
    }

    /// Wire inter-descriptor links (second pass).
    ///
    /// Every `implements` name on every class must resolve to an interface
    /// visible from the class's module.
    pub fn resolve(&mut self, interner: &StringInterner) -> EvalResult<()> {
        for idx in 0..self.classes.len() {
            let module = self.classes[idx].module;
            let names = self.classes[idx].implements_names.clone();
            let mut wired = Vec::with_capacity(names.len());
            for name in names {
                match self.lookup_type(module, name) {
                    Some(TypeRef::Interface(i)) => wired.push(i),
                    _ => return Err(not_a_type(interner.lookup(name))),
                }
            }
            self.classes[idx].implements = wired;
        }
        Ok(())
    }

    // Accessors

    pub fn module(&self, id: ModuleId) -> &ModuleDef {
        &self.modules[id.index()]
    }

    pub fn module_mut(&mut self, id: ModuleId) -> &mut ModuleDef {
        &mut self.modules[id.index()]
    }

    pub fn class(&self, id: ClassId) -> &ClassDef {
        &self.classes[id.index()]
    }

    pub fn interface(&self, id: InterfaceId) -> &InterfaceDef {
        &self.interfaces[id.index()]
    }

    pub fn enum_def(&self, id: EnumId) -> &EnumDef {
        &self.enums[id.index()]
    }

    /// Find a module by name.
    pub fn find_module(&self, name: Name) -> Option<ModuleId> {
        self.modules
            .iter()
            .position(|m| m.name == name)
            .map(|idx| ModuleId::new(idx as u32))
    }

    /// Resolve a type name as seen from `module`: the module's own table,
    /// then its imports, then the global module.
    pub fn lookup_type(&self, module: ModuleId, name: Name) -> Option<TypeRef> {
        let def = self.module(module);
        if let Some(&t) = def.types.get(&name) {
            return Some(t);
        }
        for &import in &def.imports {
            if let Some(&t) = self.module(import).types.get(&name) {
                return Some(t);
            }
        }
        self.module(self.global).types.get(&name).copied()
    }

    /// The display name of a type.
    pub fn type_name(&self, t: TypeRef, interner: &StringInterner) -> String {
        match t {
            TypeRef::Primitive(p) => p.name().to_string(),
            TypeRef::Class(id) => interner.lookup(self.class(id).name).to_string(),
            TypeRef::Interface(id) => interner.lookup(self.interface(id).name).to_string(),
            TypeRef::Enum(id) => interner.lookup(self.enum_def(id).name).to_string(),
            TypeRef::Module(id) => interner.lookup(self.module(id).name).to_string(),
        }
    }

    /// Whether a class implements an interface.
    pub fn class_implements(&self, class: ClassId, interface: InterfaceId) -> bool {
        self.class(class).implements.contains(&interface)
    }

    /// Runtime type-compatibility test behind the `is` operator.
    ///
    /// Callers unwrap `Any` before asking.
    pub fn is_compatible(&self, t: TypeRef, value: &Value) -> bool {
        match t {
            TypeRef::Primitive(PrimitiveType::Any) => true,
            TypeRef::Primitive(p) => value.primitive_type() == Some(p),
            TypeRef::Class(c) => match value {
                Value::Instance(inst) => inst.class == c,
                Value::Interface(iface) => iface.instance.class == c,
                _ => false,
            },
            TypeRef::Interface(i) => match value {
                Value::Instance(inst) => self.class_implements(inst.class, i),
                Value::Interface(iface) => {
                    iface.interface == i || self.class_implements(iface.instance.class, i)
                }
                _ => false,
            },
            TypeRef::Enum(e) => matches!(value, Value::EnumMember(m) if m.enum_id == e),
            TypeRef::Module(m) => matches!(value, Value::Module(v) if v.module == m),
        }
    }

    /// Runtime cast behind the `as` operator. `None` means incompatible;
    /// the operator maps that to `null`.
    pub fn cast(&self, t: TypeRef, value: Value) -> Option<Value> {
        // `as Any` wraps; everything else looks through an existing wrapper.
        if t == TypeRef::Primitive(PrimitiveType::Any) {
            return Some(Value::any(value));
        }
        let value = match value {
            Value::Any(inner) => (*inner).clone(),
            other => other,
        };
        match t {
            TypeRef::Interface(i) => match value {
                Value::Instance(inst) if self.class_implements(inst.class, i) => {
                    Some(Value::interface(i, inst))
                }
                Value::Interface(iface)
                    if iface.interface == i || self.class_implements(iface.instance.class, i) =>
                {
                    Some(Value::interface(i, iface.instance))
                }
                _ => None,
            },
            TypeRef::Class(c) => match value {
                Value::Instance(ref inst) if inst.class == c => Some(value),
                // Casting an interface view back to its concrete class
                // recovers the underlying instance.
                Value::Interface(iface) if iface.instance.class == c => {
                    Some(Value::Instance(iface.instance))
                }
                _ => None,
            },
            _ => {
                if self.is_compatible(t, &value) {
                    Some(value)
                } else {
                    None
                }
            }
        }
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("modules", &self.modules.len())
            .field("classes", &self.classes.len())
            .field("interfaces", &self.interfaces.len())
            .field("enums", &self.enums.len())
            .finish()
    }
}
