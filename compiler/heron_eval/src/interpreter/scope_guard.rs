//! RAII guards for scope and frame lifecycle.
//!
//! Every push of a scope or frame goes through a guard whose `Drop`
//! performs the matching pop. Release happens on normal exit, on `?`
//! propagation, and during panic unwinding, so the machine's LIFO
//! invariants hold on every exit path.

use std::ops::{Deref, DerefMut};

use super::Interpreter;
use crate::environment::Frame;

/// Guard that pops one scope on drop.
pub struct ScopedInterpreter<'g, 'a> {
    interpreter: &'g mut Interpreter<'a>,
}

impl Drop for ScopedInterpreter<'_, '_> {
    fn drop(&mut self) {
        self.interpreter.machine.pop_scope();
    }
}

impl<'a> Deref for ScopedInterpreter<'_, 'a> {
    type Target = Interpreter<'a>;

    fn deref(&self) -> &Self::Target {
        self.interpreter
    }
}

impl DerefMut for ScopedInterpreter<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.interpreter
    }
}

/// Guard that pops one frame on drop.
pub struct FramedInterpreter<'g, 'a> {
    interpreter: &'g mut Interpreter<'a>,
}

impl Drop for FramedInterpreter<'_, '_> {
    fn drop(&mut self) {
        self.interpreter.machine.pop_frame();
    }
}

impl<'a> Deref for FramedInterpreter<'_, 'a> {
    type Target = Interpreter<'a>;

    fn deref(&self) -> &Self::Target {
        self.interpreter
    }
}

impl DerefMut for FramedInterpreter<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.interpreter
    }
}

impl<'a> Interpreter<'a> {
    /// Push a scope; the returned guard pops it on drop.
    pub fn scoped(&mut self) -> ScopedInterpreter<'_, 'a> {
        self.machine.push_scope();
        ScopedInterpreter { interpreter: self }
    }

    /// Push a frame; the returned guard pops it on drop.
    pub fn framed(&mut self, frame: Frame) -> FramedInterpreter<'_, 'a> {
        self.machine.push_frame(frame);
        FramedInterpreter { interpreter: self }
    }

    /// Run `f` inside a fresh scope, popped on every exit path.
    pub fn with_scope<T>(
        &mut self,
        f: impl FnOnce(&mut ScopedInterpreter<'_, 'a>) -> T,
    ) -> T {
        let mut scoped = self.scoped();
        f(&mut scoped)
    }

    /// Run `f` inside a pushed frame, popped on every exit path.
    pub fn with_frame<T>(
        &mut self,
        frame: Frame,
        f: impl FnOnce(&mut FramedInterpreter<'_, 'a>) -> T,
    ) -> T {
        let mut framed = self.framed(frame);
        f(&mut framed)
    }
}
