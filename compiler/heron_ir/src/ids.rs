//! Typed indices and ranges for the flat AST.
//!
//! Expressions and statements are stored in contiguous arena vectors and
//! referenced by `u32` indices instead of `Box`es. Child lists (call
//! arguments, tuple elements, block bodies, parameter lists) are flattened
//! into side tables and referenced by `(start, len)` ranges.

use std::fmt;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Invalid sentinel, used for optional children.
            pub const INVALID: $name = $name(u32::MAX);

            #[inline]
            pub const fn new(index: u32) -> Self {
                $name(index)
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub const fn is_valid(self) -> bool {
                self.0 != u32::MAX
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, concat!(stringify!($name), "({})"), self.0)
                } else {
                    write!(f, concat!(stringify!($name), "::INVALID"))
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::INVALID
            }
        }
    };
}

define_id! {
    /// Index into the expression arena.
    ExprId
}

define_id! {
    /// Index into the statement arena.
    StmtId
}

macro_rules! define_range {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
        pub struct $name {
            pub start: u32,
            pub len: u16,
        }

        impl $name {
            pub const EMPTY: $name = $name { start: 0, len: 0 };

            #[inline]
            pub const fn new(start: u32, len: u16) -> Self {
                $name { start, len }
            }

            #[inline]
            pub const fn len(self) -> usize {
                self.len as usize
            }

            #[inline]
            pub const fn is_empty(self) -> bool {
                self.len == 0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(
                    f,
                    concat!(stringify!($name), "({}..{})"),
                    self.start,
                    self.start + u32::from(self.len)
                )
            }
        }
    };
}

define_range! {
    /// Range into the arena's flattened expression lists.
    ExprRange
}

define_range! {
    /// Range into the arena's flattened statement lists.
    StmtRange
}

define_range! {
    /// Range into the arena's parameter table.
    ParamRange
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_sentinel() {
        assert!(!ExprId::INVALID.is_valid());
        assert!(ExprId::new(0).is_valid());
        assert_eq!(ExprId::default(), ExprId::INVALID);
    }

    #[test]
    fn empty_range() {
        assert!(ExprRange::EMPTY.is_empty());
        assert_eq!(ExprRange::new(4, 3).len(), 3);
    }
}
