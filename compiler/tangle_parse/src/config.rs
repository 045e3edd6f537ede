//! Parser configuration.

use tangle_ir::ContextMatch;

/// Knobs for [`Parser`](crate::Parser).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ParserConfig {
    /// Valid paths kept after each token.
    pub max_paths: usize,
    /// Score multiplier applied on every shift.
    pub shift_factor: f64,
    /// Score multiplier applied on every reduction.
    pub reduce_factor: f64,
    /// Path expansions allowed per token. The parse gives up after
    /// `step_limit_factor * (tokens + 1)` expansions.
    pub step_limit_factor: usize,
    /// Consecutive reduction rounds that neither shift, complete nor shrink
    /// a stack before the parse gives up.
    pub stall_limit: usize,
    /// How a production's declared context is matched against the stack.
    pub context_match: ContextMatch,
}

impl ParserConfig {
    pub const fn new() -> Self {
        ParserConfig {
            max_paths: 10,
            shift_factor: 0.95,
            reduce_factor: 1.1,
            step_limit_factor: 256,
            stall_limit: 32,
            context_match: ContextMatch::Anywhere,
        }
    }

    #[must_use]
    pub const fn with_max_paths(mut self, max_paths: usize) -> Self {
        self.max_paths = max_paths;
        self
    }

    #[must_use]
    pub fn with_scoring(mut self, shift_factor: f64, reduce_factor: f64) -> Self {
        self.shift_factor = shift_factor;
        self.reduce_factor = reduce_factor;
        self
    }

    #[must_use]
    pub const fn with_step_limit_factor(mut self, factor: usize) -> Self {
        self.step_limit_factor = factor;
        self
    }

    #[must_use]
    pub const fn with_stall_limit(mut self, rounds: usize) -> Self {
        self.stall_limit = rounds;
        self
    }

    #[must_use]
    pub const fn with_context_match(mut self, mode: ContextMatch) -> Self {
        self.context_match = mode;
        self
    }

    /// Expansion budget for `tokens` input tokens.
    pub fn step_limit(&self, tokens: usize) -> usize {
        self.step_limit_factor.saturating_mul(tokens.saturating_add(1))
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::new()
    }
}
