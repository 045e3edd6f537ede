//! Tokenizer result.

use tangle_ir::{ContextStack, Token};

use crate::error::LexError;

/// Counters gathered during one tokenize call.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LexStats {
    pub steps: usize,
    /// Most live paths seen after any single step.
    pub peak_paths: usize,
    /// Paths folded into an equivalent representative.
    pub merged: usize,
    /// Paths dropped by the `max_paths` ceiling.
    pub pruned: usize,
    /// Distinct token streams that reached the end of input.
    pub completed: usize,
}

/// Everything a tokenize call produced.
///
/// On failure `tokens` holds the stream of the path that got furthest, so
/// callers can still inspect what was recognised.
#[derive(Clone, Debug)]
pub struct LexOutput<'src> {
    pub success: bool,
    /// Best completed token stream.
    pub tokens: Vec<Token<'src>>,
    /// Other completed streams, best first.
    pub alternatives: Vec<Vec<Token<'src>>>,
    pub errors: Vec<LexError>,
    /// Lexer contexts still open at the end of `tokens`.
    pub contexts: ContextStack,
    pub stats: LexStats,
}

impl LexOutput<'_> {
    /// Did more than one token stream cover the whole input?
    pub fn is_ambiguous(&self) -> bool {
        !self.alternatives.is_empty()
    }
}
