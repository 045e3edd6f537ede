//! Parser result.

use tangle_ir::{ContextStack, SemanticGraph, SymbolTable};

use crate::error::ParseError;

/// Counters gathered during one parse.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Path expansions (one per path per reduction round).
    pub steps: usize,
    /// Most valid paths alive after any token.
    pub peak_paths: usize,
    /// Paths folded into an equivalent, higher-scoring path.
    pub merged: usize,
    /// Paths dropped by the `max_paths` ceiling.
    pub pruned: usize,
    /// Derivations that covered the whole input.
    pub completed: usize,
    /// Semantic actions that returned an error.
    pub action_failures: usize,
}

/// Everything a parse produced.
///
/// On success `graph` holds the derivation root (an ambiguous root when
/// several derivations completed). On failure it holds the nodes of the
/// best path that was still alive, without a root.
#[derive(Clone, Debug)]
pub struct ParseOutput {
    pub success: bool,
    pub graph: SemanticGraph,
    pub errors: Vec<ParseError>,
    /// Declarations and references recorded by semantic actions.
    pub symbols: SymbolTable,
    /// Parser context stack as left by semantic actions.
    pub contexts: ContextStack,
    pub stats: ParseStats,
}
