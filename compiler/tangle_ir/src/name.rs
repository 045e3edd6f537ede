//! Interned grammar names.
//!
//! Token types, non-terminals and context names are interned once when a
//! grammar is built. Comparing two [`Name`]s is a `u32` comparison, which
//! keeps stack-signature hashing and rule lookup cheap on the hot path.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

/// Interned grammar symbol.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Name(u32);

impl Name {
    /// Raw index into the owning interner.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

/// Single-threaded string interner owned by a grammar.
#[derive(Clone, Debug, Default)]
pub struct NameInterner {
    map: FxHashMap<Arc<str>, Name>,
    strings: Vec<Arc<str>>,
}

impl NameInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `text`, returning the existing name when already present.
    pub fn intern(&mut self, text: &str) -> Name {
        if let Some(&name) = self.map.get(text) {
            return name;
        }
        let name = Name(self.strings.len() as u32);
        let shared: Arc<str> = Arc::from(text);
        self.strings.push(Arc::clone(&shared));
        self.map.insert(shared, name);
        name
    }

    /// Look up an already-interned string without inserting.
    pub fn get(&self, text: &str) -> Option<Name> {
        self.map.get(text).copied()
    }

    /// Resolve a name to its text.
    ///
    /// Names from a different interner resolve to the empty string.
    pub fn lookup(&self, name: Name) -> &str {
        self.strings.get(name.index()).map_or("", |s| s)
    }

    /// Resolve a name to a shared handle, for storing in graph nodes.
    pub fn shared(&self, name: Name) -> Arc<str> {
        self.strings
            .get(name.index())
            .map_or_else(|| Arc::from(""), Arc::clone)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
