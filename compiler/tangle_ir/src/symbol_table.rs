//! Scope-aware symbol table.
//!
//! Declarations are keyed by `(scope, name)`. Scopes are dot-separated
//! paths (`module.fn.block`); lookup walks from the given scope through its
//! dotted parents up to [`GLOBAL_SCOPE`]. References are stored per name,
//! independent of scope, for find-usages style consumers.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::{NodeId, Span};

/// Root scope every lookup ends at.
pub const GLOBAL_SCOPE: &str = "global";

/// Declaration failure.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SymbolError {
    #[error("`{name}` is already declared in scope `{scope}` at {previous}")]
    AlreadyDeclared {
        scope: Arc<str>,
        name: Arc<str>,
        previous: Span,
    },
}

/// A declared symbol.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Declaration {
    pub name: Arc<str>,
    pub scope: Arc<str>,
    /// Free-form kind tag supplied by the semantic action (`"fn"`, `"var"`, ...).
    pub kind: Arc<str>,
    pub span: Span,
    /// Graph node that declared the symbol, when known.
    pub node: Option<NodeId>,
}

/// A use of a symbol.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reference {
    /// Scope the reference occurred in.
    pub scope: Arc<str>,
    pub span: Span,
    pub node: Option<NodeId>,
}

#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SymbolTable {
    scopes: FxHashMap<Arc<str>, FxHashMap<Arc<str>, Declaration>>,
    references: FxHashMap<Arc<str>, Vec<Reference>>,
    declared: usize,
}

/// Normalise the empty scope to [`GLOBAL_SCOPE`].
fn normalize(scope: &str) -> &str {
    if scope.is_empty() {
        GLOBAL_SCOPE
    } else {
        scope
    }
}

/// Parent of a dotted scope path; `None` for the global scope.
pub fn parent_scope(scope: &str) -> Option<&str> {
    let scope = normalize(scope);
    if scope == GLOBAL_SCOPE {
        return None;
    }
    match scope.rfind('.') {
        Some(i) => Some(&scope[..i]),
        None => Some(GLOBAL_SCOPE),
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a declaration of `name` in `scope`.
    pub fn declare(
        &mut self,
        scope: &str,
        name: &str,
        kind: &str,
        span: Span,
        node: Option<NodeId>,
    ) -> Result<(), SymbolError> {
        let scope = normalize(scope);
        let entries = self.scopes.entry(Arc::from(scope)).or_default();
        if let Some(previous) = entries.get(name) {
            return Err(SymbolError::AlreadyDeclared {
                scope: Arc::clone(&previous.scope),
                name: Arc::clone(&previous.name),
                previous: previous.span,
            });
        }
        let name: Arc<str> = Arc::from(name);
        entries.insert(
            Arc::clone(&name),
            Declaration {
                name,
                scope: Arc::from(scope),
                kind: Arc::from(kind),
                span,
                node,
            },
        );
        self.declared += 1;
        Ok(())
    }

    /// Resolve `name` starting at `scope` and walking outward to the global scope.
    pub fn lookup(&self, scope: &str, name: &str) -> Option<&Declaration> {
        let mut current = Some(normalize(scope));
        while let Some(s) = current {
            if let Some(decl) = self.scopes.get(s).and_then(|entries| entries.get(name)) {
                return Some(decl);
            }
            current = parent_scope(s);
        }
        None
    }

    /// Declaration in exactly `scope`, without walking parents.
    pub fn get(&self, scope: &str, name: &str) -> Option<&Declaration> {
        self.scopes
            .get(normalize(scope))
            .and_then(|entries| entries.get(name))
    }

    pub fn add_reference(&mut self, name: &str, reference: Reference) {
        self.references
            .entry(Arc::from(name))
            .or_default()
            .push(reference);
    }

    /// References recorded for `name`, in insertion order.
    pub fn references(&self, name: &str) -> &[Reference] {
        self.references.get(name).map_or(&[], Vec::as_slice)
    }

    /// Declarations made directly in `scope`, ordered by source position.
    pub fn declarations_in(&self, scope: &str) -> Vec<&Declaration> {
        let mut decls: Vec<&Declaration> = self
            .scopes
            .get(normalize(scope))
            .map(|entries| entries.values().collect())
            .unwrap_or_default();
        decls.sort_by_key(|d| (d.span.start, d.span.end));
        decls
    }

    /// Total number of declarations across all scopes.
    pub fn len(&self) -> usize {
        self.declared
    }

    pub fn is_empty(&self) -> bool {
        self.declared == 0
    }
}
