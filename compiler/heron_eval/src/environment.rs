//! Lexical scopes, call frames and the machine state.
//!
//! A [`Scope`] is one lexical block's bindings. A [`Frame`] is one call
//! activation: its own scope stack, receiver and module; a called
//! function never sees its caller's locals. The [`Machine`] owns the
//! frame stack, the return flag, and the configuration.

use std::sync::Arc;

use heron_ir::Name;

use crate::config::EvalConfig;
use crate::program::ModuleId;
use crate::shared::Heap;
use crate::value::{CapturedScope, Value};

/// A single scope of insertion-ordered variable bindings.
///
/// Scopes are small and short-lived; a linear vector beats a hash map
/// here and keeps declaration order for free.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    bindings: Vec<(Name, Value)>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new binding. Returns `false` if the name is already
    /// declared in this scope.
    #[must_use]
    pub fn declare(&mut self, name: Name, value: Value) -> bool {
        if self.has(name) {
            return false;
        }
        self.bindings.push((name, value));
        true
    }

    pub fn lookup(&self, name: Name) -> Option<&Value> {
        self.bindings
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    /// Replace an existing binding. Returns `false` if the name is absent.
    #[must_use]
    pub fn assign(&mut self, name: Name, value: Value) -> bool {
        match self.bindings.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn has(&self, name: Name) -> bool {
        self.bindings.iter().any(|(n, _)| *n == name)
    }

    /// Bound names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = Name> + '_ {
        self.bindings.iter().map(|(n, _)| *n)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// One call activation.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Name of the active function; `Name::EMPTY` for the top-level frame
    /// and anonymous functions.
    pub function: Name,
    /// Receiver the active function is bound to, if any.
    pub receiver: Option<Value>,
    /// Module whose type table governs name resolution in this frame.
    pub module: ModuleId,
    /// Lexical scopes, outermost first. Never empty.
    scopes: Vec<Scope>,
    /// Closure captures, consulted after the scopes. Read-only.
    pub captured: Option<Heap<CapturedScope>>,
}

impl Frame {
    pub fn new(module: ModuleId) -> Self {
        Frame {
            function: Name::EMPTY,
            receiver: None,
            module,
            scopes: vec![Scope::new()],
            captured: None,
        }
    }

    pub fn for_call(
        function: Name,
        module: ModuleId,
        receiver: Option<Value>,
        captured: Heap<CapturedScope>,
    ) -> Self {
        Frame {
            function,
            receiver,
            module,
            scopes: vec![Scope::new()],
            captured: Some(captured),
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::new());
    }

    /// Pop the innermost scope. The base scope is never popped.
    pub fn pop_scope(&mut self) {
        debug_assert!(self.scopes.len() > 1, "popping a frame's base scope");
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    fn innermost(&mut self) -> &mut Scope {
        self.scopes.last_mut().expect("frame scope stack is empty")
    }

    /// Declare in the innermost scope.
    #[must_use]
    pub fn declare(&mut self, name: Name, value: Value) -> bool {
        self.innermost().declare(name, value)
    }

    /// Look up through the scopes (innermost first), then the captures.
    pub fn lookup(&self, name: Name) -> Option<Value> {
        for scope in self.scopes.iter().rev() {
            if let Some(v) = scope.lookup(name) {
                return Some(v.clone());
            }
        }
        self.captured.as_ref().and_then(|c| c.get(&name).cloned())
    }

    /// Assign through the scopes. Captures are a read-only snapshot and
    /// never assigned through.
    #[must_use]
    pub fn assign(&mut self, name: Name, value: Value) -> bool {
        for scope in self.scopes.iter_mut().rev() {
            if scope.assign(name, value.clone()) {
                return true;
            }
        }
        false
    }

    pub fn has_var(&self, name: Name) -> bool {
        self.scopes.iter().any(|s| s.has(name))
            || self
                .captured
                .as_ref()
                .is_some_and(|c| c.contains_key(&name))
    }

    /// Whether the frame's receiver has a field named `name`.
    pub fn has_field(&self, name: Name) -> bool {
        self.receiver
            .as_ref()
            .is_some_and(|r| r.get_field(name).is_some())
    }

    /// Read a field of the frame's receiver.
    pub fn get_field(&self, name: Name) -> Option<Value> {
        self.receiver.as_ref().and_then(|r| r.get_field(name))
    }

    /// Replace an existing field of the frame's receiver. Returns `false`
    /// when there is no receiver or no such field.
    #[must_use]
    pub fn set_field(&self, name: Name, value: Value) -> bool {
        self.receiver
            .as_ref()
            .and_then(|r| r.set_field(name, value))
            == Some(true)
    }
}

/// The virtual machine state: frame stack, return flag, configuration.
pub struct Machine {
    /// Call activations; the top-level frame is always present.
    frames: Vec<Frame>,
    return_value: Option<Value>,
    returning: bool,
    config: Arc<EvalConfig>,
}

impl Machine {
    pub fn new(config: EvalConfig, module: ModuleId) -> Self {
        Machine {
            frames: vec![Frame::new(module)],
            return_value: None,
            returning: false,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn frame(&self) -> &Frame {
        self.frames.last().expect("machine frame stack is empty")
    }

    pub fn frame_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("machine frame stack is empty")
    }

    pub fn frame_depth(&self) -> usize {
        self.frames.len()
    }

    pub fn scope_depth(&self) -> usize {
        self.frame().scope_depth()
    }

    pub fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Pop the current frame. The top-level frame is never popped.
    pub fn pop_frame(&mut self) {
        debug_assert!(self.frames.len() > 1, "popping the top-level frame");
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub fn push_scope(&mut self) {
        self.frame_mut().push_scope();
    }

    pub fn pop_scope(&mut self) {
        self.frame_mut().pop_scope();
    }

    /// Declare a variable in the current scope.
    #[must_use]
    pub fn add_var(&mut self, name: Name, value: Value) -> bool {
        self.frame_mut().declare(name, value)
    }

    /// Assign an existing variable in the current frame.
    #[must_use]
    pub fn set_var(&mut self, name: Name, value: Value) -> bool {
        self.frame_mut().assign(name, value)
    }

    /// Read a variable visible in the current frame.
    pub fn get_var(&self, name: Name) -> Option<Value> {
        self.frame().lookup(name)
    }

    pub fn has_var(&self, name: Name) -> bool {
        self.frame().has_var(name)
    }

    /// Record a return value and raise the return flag.
    pub fn return_value(&mut self, value: Value) {
        self.return_value = Some(value);
        self.returning = true;
    }

    /// Consume a pending return, clearing the flag.
    pub fn take_return(&mut self) -> Option<Value> {
        self.returning = false;
        self.return_value.take()
    }

    /// `true` while an unconsumed return is propagating.
    pub fn should_exit_scope(&self) -> bool {
        self.returning
    }

    /// Fork for a parallel worker: a fresh frame stack rooted at the same
    /// module, sharing only the configuration handle. Descriptors,
    /// interner and arenas are shared by the caller; aggregate values
    /// reached from both sides must not be mutated by the worker.
    pub fn fork(&self) -> Machine {
        Machine {
            frames: vec![Frame::new(self.frame().module)],
            return_value: None,
            returning: false,
            config: Arc::clone(&self.config),
        }
    }
}
