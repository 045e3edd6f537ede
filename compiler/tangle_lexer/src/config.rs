//! Tokenizer configuration.

use tangle_ir::ContextMatch;

/// Knobs for [`CompiledLexer::tokenize`](crate::CompiledLexer::tokenize).
#[derive(Copy, Clone, Debug)]
pub struct LexerConfig {
    /// Live paths kept after each step. Extra paths are pruned by score.
    pub max_paths: usize,
    /// Step budget per input byte. The scan gives up after
    /// `step_limit_factor * (len + 1)` steps.
    pub step_limit_factor: usize,
    /// Consecutive steps without any path advancing before the scan gives up.
    pub stall_limit: usize,
    /// How a rule's declared context is matched against a path's stack.
    pub context_match: ContextMatch,
}

impl LexerConfig {
    pub const fn new() -> Self {
        LexerConfig {
            max_paths: 64,
            step_limit_factor: 4,
            stall_limit: 8,
            context_match: ContextMatch::Anywhere,
        }
    }

    #[must_use]
    pub const fn with_max_paths(mut self, max_paths: usize) -> Self {
        self.max_paths = max_paths;
        self
    }

    #[must_use]
    pub const fn with_step_limit_factor(mut self, factor: usize) -> Self {
        self.step_limit_factor = factor;
        self
    }

    #[must_use]
    pub const fn with_stall_limit(mut self, steps: usize) -> Self {
        self.stall_limit = steps;
        self
    }

    #[must_use]
    pub const fn with_context_match(mut self, mode: ContextMatch) -> Self {
        self.context_match = mode;
        self
    }

    /// Step budget for an input of `len` bytes.
    pub fn step_limit(&self, len: usize) -> usize {
        self.step_limit_factor.saturating_mul(len.saturating_add(1))
    }
}

impl Default for LexerConfig {
    fn default() -> Self {
        Self::new()
    }
}

