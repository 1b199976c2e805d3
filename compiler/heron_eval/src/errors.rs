//! Evaluation errors.
//!
//! Failures carry an [`EvalErrorKind`], a human message, a context chain
//! accumulated while unwinding, and (at top-level entry points) a captured
//! call-stack backtrace. The free functions below are the single import
//! point for error creation; evaluator code never constructs messages
//! inline.

use std::fmt;

use crate::diagnostics::EvalBacktrace;

/// The closed taxonomy of evaluation failures.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum EvalErrorKind {
    Parse,
    NameNotFound,
    NameAlreadyDefined,
    NotAssignable,
    NoSuchField,
    NullDereference,
    NotAType,
    TypeMismatch,
    IncompatibleTypes,
    UnsupportedOperation,
    DivisionByZero,
    ArityMismatch,
    NotCallable,
    IndexOutOfBounds,
    NoEntryPoint,
    ModuleNotFound,
    CircularModuleDependency,
    Internal,
}

impl EvalErrorKind {
    pub const fn label(self) -> &'static str {
        match self {
            EvalErrorKind::Parse => "parse error",
            EvalErrorKind::NameNotFound => "name not found",
            EvalErrorKind::NameAlreadyDefined => "name already defined",
            EvalErrorKind::NotAssignable => "not assignable",
            EvalErrorKind::NoSuchField => "no such field",
            EvalErrorKind::NullDereference => "null dereference",
            EvalErrorKind::NotAType => "not a type",
            EvalErrorKind::TypeMismatch => "type mismatch",
            EvalErrorKind::IncompatibleTypes => "incompatible types",
            EvalErrorKind::UnsupportedOperation => "unsupported operation",
            EvalErrorKind::DivisionByZero => "division by zero",
            EvalErrorKind::ArityMismatch => "arity mismatch",
            EvalErrorKind::NotCallable => "not callable",
            EvalErrorKind::IndexOutOfBounds => "index out of bounds",
            EvalErrorKind::NoEntryPoint => "no entry point",
            EvalErrorKind::ModuleNotFound => "module not found",
            EvalErrorKind::CircularModuleDependency => "circular module dependency",
            EvalErrorKind::Internal => "internal invariant violation",
        }
    }
}

/// An evaluation failure.
#[derive(Clone, Debug)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub message: String,
    /// Outermost-last chain of "while evaluating ..." notes.
    pub context: Vec<String>,
    /// Call-stack snapshot, attached at top-level entry points.
    pub backtrace: Option<EvalBacktrace>,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind, message: impl Into<String>) -> Self {
        EvalError {
            kind,
            message: message.into(),
            context: Vec::new(),
            backtrace: None,
        }
    }

    /// Append a context note (kept in unwind order).
    #[must_use]
    pub fn with_context(mut self, note: impl Into<String>) -> Self {
        self.context.push(note.into());
        self
    }

    /// Attach a backtrace; the first attachment wins.
    #[must_use]
    pub fn with_backtrace(mut self, backtrace: EvalBacktrace) -> Self {
        if self.backtrace.is_none() && !backtrace.is_empty() {
            self.backtrace = Some(backtrace);
        }
        self
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.message)?;
        for note in &self.context {
            write!(f, "\n  while evaluating {note}")?;
        }
        if let Some(bt) = &self.backtrace {
            write!(f, "\n{bt}")?;
        }
        Ok(())
    }
}

impl std::error::Error for EvalError {}

/// Result alias used throughout the evaluator.
pub type EvalResult<T = crate::Value> = Result<T, EvalError>;

// Error constructors

pub fn parse_error(message: impl Into<String>) -> EvalError {
    EvalError::new(EvalErrorKind::Parse, message)
}

pub fn name_not_found(name: &str) -> EvalError {
    EvalError::new(EvalErrorKind::NameNotFound, format!("unknown name `{name}`"))
}

pub fn name_already_defined(name: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::NameAlreadyDefined,
        format!("`{name}` is already declared in this scope"),
    )
}

pub fn not_assignable(what: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::NotAssignable,
        format!("cannot assign to {what}"),
    )
}

pub fn no_such_field(field: &str, on: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::NoSuchField,
        format!("no field `{field}` on {on}"),
    )
}

pub fn null_dereference(field: &str, receiver: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::NullDereference,
        format!("accessed `{field}` on null value `{receiver}`"),
    )
}

pub fn not_a_type(found: &str) -> EvalError {
    EvalError::new(EvalErrorKind::NotAType, format!("`{found}` is not a type"))
}

pub fn type_mismatch(expected: &str, found: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::TypeMismatch,
        format!("expected {expected}, found {found}"),
    )
}

pub fn incompatible_types(op: &str, left: &str, right: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::IncompatibleTypes,
        format!("`{op}` is not defined between {left} and {right}"),
    )
}

pub fn unsupported_operation(op: &str, on: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::UnsupportedOperation,
        format!("`{op}` is not supported on {on}"),
    )
}

pub fn division_by_zero() -> EvalError {
    EvalError::new(EvalErrorKind::DivisionByZero, "integer division by zero")
}

pub fn arity_mismatch(name: &str, expected: usize, found: usize) -> EvalError {
    EvalError::new(
        EvalErrorKind::ArityMismatch,
        format!("`{name}` takes {expected} argument(s), {found} given"),
    )
}

pub fn not_callable(found: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::NotCallable,
        format!("{found} is not callable"),
    )
}

pub fn index_out_of_bounds(index: i64, len: usize) -> EvalError {
    EvalError::new(
        EvalErrorKind::IndexOutOfBounds,
        format!("index {index} out of bounds for length {len}"),
    )
}

pub fn no_entry_point(module: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::NoEntryPoint,
        format!("module `{module}` has no Main method"),
    )
}

pub fn module_not_found(name: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::ModuleNotFound,
        format!("module `{name}` not found on any input path"),
    )
}

pub fn circular_module_dependency(chain: &str) -> EvalError {
    EvalError::new(
        EvalErrorKind::CircularModuleDependency,
        format!("module dependency cycle: {chain}"),
    )
}

pub fn internal(message: impl Into<String>) -> EvalError {
    EvalError::new(EvalErrorKind::Internal, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let err = name_not_found("x");
        let text = err.to_string();
        assert!(text.contains("name not found"));
        assert!(text.contains("`x`"));
    }

    #[test]
    fn context_chain_renders_in_order() {
        let err = division_by_zero()
            .with_context("`1 / 0`")
            .with_context("`f()`");
        let text = err.to_string();
        let inner = text.find("`1 / 0`").unwrap();
        let outer = text.find("`f()`").unwrap();
        assert!(inner < outer);
    }

    #[test]
    fn first_backtrace_wins() {
        use crate::diagnostics::{CallFrame, CallStack};
        use heron_ir::StringInterner;

        let interner = StringInterner::new();
        let mut stack = CallStack::new();
        stack.push(CallFrame {
            name: interner.intern("f"),
            call_span: None,
        });
        let first = stack.capture(&interner);
        stack.push(CallFrame {
            name: interner.intern("g"),
            call_span: None,
        });
        let second = stack.capture(&interner);

        let err = division_by_zero()
            .with_backtrace(first)
            .with_backtrace(second);
        assert_eq!(err.backtrace.as_ref().map(EvalBacktrace::len), Some(1));
    }
}
