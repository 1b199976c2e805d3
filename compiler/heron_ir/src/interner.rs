//! String interner for identifier storage.
//!
//! Provides O(1) interning and lookup with thread-safe concurrent access.
//! Interned strings live for the lifetime of the process; the interner is
//! expected to be created once and shared.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::Name;

struct InternTable {
    /// Map from string content to index.
    map: FxHashMap<&'static str, u32>,
    /// Storage for string contents, indexed by `Name::index()`.
    strings: Vec<&'static str>,
}

impl InternTable {
    fn with_empty() -> Self {
        // Pre-intern the empty string at index 0 so Name::EMPTY resolves.
        let empty: &'static str = "";
        let mut map = FxHashMap::default();
        map.insert(empty, 0);
        InternTable {
            map,
            strings: vec![empty],
        }
    }
}

/// Thread-safe string interner.
///
/// Interned strings are leaked into process-lifetime storage, which keeps
/// `lookup` allocation-free and lets `&'static str` keys double as storage.
pub struct StringInterner {
    table: RwLock<InternTable>,
}

impl StringInterner {
    pub fn new() -> Self {
        StringInterner {
            table: RwLock::new(InternTable::with_empty()),
        }
    }

    /// Intern a string, returning its `Name`.
    ///
    /// Interning the same content twice yields the same `Name`.
    pub fn intern(&self, s: &str) -> Name {
        if let Some(&idx) = self.table.read().map.get(s) {
            return Name::from_raw(idx);
        }
        let mut table = self.table.write();
        // Re-check under the write lock: another thread may have won the race.
        if let Some(&idx) = table.map.get(s) {
            return Name::from_raw(idx);
        }
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let idx = u32::try_from(table.strings.len()).expect("interner capacity exceeded");
        table.strings.push(leaked);
        table.map.insert(leaked, idx);
        Name::from_raw(idx)
    }

    /// Resolve a `Name` back to its textual form.
    ///
    /// # Panics
    ///
    /// Panics if `name` did not come from this interner.
    pub fn lookup(&self, name: Name) -> &'static str {
        self.table.read().strings[name.index()]
    }

    /// Number of interned strings (including the pre-interned empty string).
    pub fn len(&self) -> usize {
        self.table.read().strings.len()
    }

    pub fn is_empty(&self) -> bool {
        // Index 0 is always occupied by the empty string.
        false
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to a [`StringInterner`].
///
/// The interner must be shared between the evaluator and any parallel
/// workers it forks, so the canonical way to own one is through this
/// `Arc` wrapper.
#[derive(Clone, Default)]
pub struct SharedInterner(Arc<StringInterner>);

impl SharedInterner {
    pub fn new() -> Self {
        SharedInterner(Arc::new(StringInterner::new()))
    }
}

impl std::ops::Deref for SharedInterner {
    type Target = StringInterner;

    fn deref(&self) -> &StringInterner {
        &self.0
    }
}
