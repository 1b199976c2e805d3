//! Module loading and program entry points.
//!
//! Parsing is an external collaborator behind the [`ModuleParser`]
//! trait; this module owns everything after the parse: locating module
//! files on the configured search paths, loading imports recursively
//! with cycle detection, registering descriptors, two-pass resolution,
//! and driving the `Meta`/`Main` entry points.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use heron_ir::{ExprId, Name, SharedArena, StringInterner};

use crate::config::EvalConfig;
use crate::errors::{
    circular_module_dependency, module_not_found, no_entry_point, EvalResult,
};
use crate::interpreter::Interpreter;
use crate::program::{
    ClassDef, EnumDef, FieldDef, FunDef, FunSig, InterfaceDef, ModuleDef, ModuleId, Program,
    TypeRef,
};
use crate::value::Value;

/// A parsed expression: its arena plus the root id.
#[derive(Clone)]
pub struct ParsedExpr {
    pub arena: SharedArena,
    pub root: ExprId,
}

/// A parsed class declaration.
#[derive(Clone)]
pub struct ParsedClass {
    pub name: Name,
    pub implements: Vec<Name>,
    pub fields: Vec<FieldDef>,
    pub methods: Vec<FunDef>,
}

/// A parsed interface declaration.
#[derive(Clone)]
pub struct ParsedInterface {
    pub name: Name,
    pub methods: Vec<FunSig>,
}

/// A parsed enum declaration.
#[derive(Clone)]
pub struct ParsedEnum {
    pub name: Name,
    pub members: Vec<Name>,
}

/// A parsed module: declarations plus the arena their bodies live in.
#[derive(Clone)]
pub struct ParsedModule {
    pub name: Name,
    pub imports: Vec<Name>,
    pub fields: Vec<FieldDef>,
    pub functions: Vec<FunDef>,
    pub classes: Vec<ParsedClass>,
    pub interfaces: Vec<ParsedInterface>,
    pub enums: Vec<ParsedEnum>,
    pub arena: SharedArena,
}

/// The external parser interface.
///
/// Implementations produce exactly the AST of `heron_ir`; the evaluator
/// never sees source text.
pub trait ModuleParser {
    fn parse_expression(&self, interner: &StringInterner, text: &str) -> EvalResult<ParsedExpr>;
    fn parse_module(&self, interner: &StringInterner, text: &str) -> EvalResult<ParsedModule>;
}

/// Maps module names to file paths using the configured search list.
pub struct ModuleLocator<'c> {
    config: &'c EvalConfig,
}

impl<'c> ModuleLocator<'c> {
    pub fn new(config: &'c EvalConfig) -> Self {
        ModuleLocator { config }
    }

    /// First `input_path` directory containing `name + extension` wins;
    /// directories are tried in order, extensions within a directory in
    /// order.
    pub fn locate(&self, name: &str) -> EvalResult<PathBuf> {
        for dir in &self.config.input_paths {
            for ext in &self.config.extensions {
                let candidate = dir.join(format!("{name}{ext}"));
                if candidate.is_file() {
                    return Ok(candidate);
                }
            }
        }
        Err(module_not_found(name))
    }
}

/// Loads a root module and its transitive imports into a [`Program`].
pub struct Loader<'p> {
    parser: &'p dyn ModuleParser,
    interner: &'p StringInterner,
    config: &'p EvalConfig,
}

impl<'p> Loader<'p> {
    pub fn new(
        parser: &'p dyn ModuleParser,
        interner: &'p StringInterner,
        config: &'p EvalConfig,
    ) -> Self {
        Loader {
            parser,
            interner,
            config,
        }
    }

    /// Load `root_path` and everything it imports, then resolve. Returns
    /// the program and the root module's id.
    pub fn load_program(&self, root_path: &Path) -> EvalResult<(Program, ModuleId)> {
        let mut program = Program::new(self.interner);
        let mut loaded = FxHashMap::default();
        let mut loading = Vec::new();
        let root = self.load_file(&mut program, &mut loaded, &mut loading, root_path)?;
        program.resolve(self.interner)?;
        Ok((program, root))
    }

    fn load_file(
        &self,
        program: &mut Program,
        loaded: &mut FxHashMap<Name, ModuleId>,
        loading: &mut Vec<Name>,
        path: &Path,
    ) -> EvalResult<ModuleId> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            module_not_found(&path.display().to_string()).with_context(e.to_string())
        })?;
        let parsed = self.parser.parse_module(self.interner, &text)?;
        self.register(program, loaded, loading, parsed)
    }

    fn register(
        &self,
        program: &mut Program,
        loaded: &mut FxHashMap<Name, ModuleId>,
        loading: &mut Vec<Name>,
        parsed: ParsedModule,
    ) -> EvalResult<ModuleId> {
        if let Some(&id) = loaded.get(&parsed.name) {
            return Ok(id);
        }
        if loading.contains(&parsed.name) {
            return Err(circular_module_dependency(&self.render_cycle(loading, parsed.name)));
        }
        loading.push(parsed.name);

        // Imports load depth-first, so a dependency is always registered
        // before its importer.
        let mut import_ids = Vec::with_capacity(parsed.imports.len());
        for &import in &parsed.imports {
            if let Some(&id) = loaded.get(&import) {
                import_ids.push(id);
                continue;
            }
            if loading.contains(&import) {
                return Err(circular_module_dependency(&self.render_cycle(loading, import)));
            }
            let path = ModuleLocator::new(self.config).locate(self.interner.lookup(import))?;
            import_ids.push(self.load_file(program, loaded, loading, &path)?);
        }
        loading.pop();

        let mut def = ModuleDef::new(parsed.name, parsed.arena);
        def.import_names = parsed.imports;
        def.imports = import_ids;
        def.fields = parsed.fields;
        def.methods = parsed.functions;
        let id = program.add_module(def);

        for class in parsed.classes {
            program.add_class(ClassDef {
                name: class.name,
                module: id,
                implements_names: class.implements,
                implements: Vec::new(),
                fields: class.fields,
                methods: class.methods,
            });
        }
        for interface in parsed.interfaces {
            program.add_interface(InterfaceDef {
                name: interface.name,
                module: id,
                methods: interface.methods,
            });
        }
        for en in parsed.enums {
            program.add_enum(EnumDef {
                name: en.name,
                module: id,
                members: en.members,
            });
        }

        loaded.insert(parsed.name, id);
        tracing::debug!(module = self.interner.lookup(parsed.name), "module loaded");
        Ok(id)
    }

    fn render_cycle(&self, loading: &[Name], repeat: Name) -> String {
        let mut chain: Vec<&str> = loading.iter().map(|&n| self.interner.lookup(n)).collect();
        chain.push(self.interner.lookup(repeat));
        chain.join(" -> ")
    }
}

/// Load a module file, instantiate it, run its `Meta` method if present,
/// then its `Main` method. Missing `Main` is a failure.
pub fn run_file(
    parser: &dyn ModuleParser,
    interner: &StringInterner,
    config: &EvalConfig,
    path: &Path,
) -> EvalResult {
    let started = std::time::Instant::now();
    let loader = Loader::new(parser, interner, config);
    let (program, root) = loader.load_program(path)?;

    let mut interp = Interpreter::with_module(interner, &program, config.clone(), root);
    let module_value = interp.instantiate(TypeRef::Module(root), &[])?;

    let meta_name = interp.names.meta;
    if let Some(meta @ Value::Function(_)) = interp.try_get_member(&module_value, meta_name)? {
        interp.apply(&meta, &[], None)?;
    }

    let main_name = interp.names.main;
    let result = match interp.try_get_member(&module_value, main_name)? {
        Some(main @ Value::Function(_)) => interp.apply(&main, &[], None)?,
        _ => {
            return Err(no_entry_point(
                interner.lookup(program.module(root).name),
            ))
        }
    };

    if config.show_timing {
        tracing::info!(elapsed_ms = started.elapsed().as_millis() as u64, "run complete");
    }
    Ok(result)
}

/// Parse and evaluate a single expression against an existing program.
pub fn eval_string(
    parser: &dyn ModuleParser,
    interner: &StringInterner,
    program: &Program,
    config: &EvalConfig,
    text: &str,
) -> EvalResult {
    let parsed = parser.parse_expression(interner, text)?;
    let mut interp = Interpreter::new(interner, program, config.clone());
    interp.eval(&parsed.arena, parsed.root)
}
