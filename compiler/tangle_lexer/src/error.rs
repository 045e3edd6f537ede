//! Tokenizer error types.
//!
//! A [`LexError`] locates the failure (`span`), says what went wrong
//! (`kind`) and records the lexer context stack of the path that got
//! furthest (`context`). Errors are collected in
//! [`LexOutput`](crate::LexOutput), never returned as `Err`.

use tangle_ir::Span;

#[derive(Clone, Debug, Eq, PartialEq, Hash, thiserror::Error)]
#[error("{kind} at offset {}", span.start)]
pub struct LexError {
    /// Where the furthest path died. Zero-width for dead ends.
    pub span: Span,
    pub kind: LexErrorKind,
    /// Dot-joined context path of that path, empty at top level.
    pub context: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, thiserror::Error)]
pub enum LexErrorKind {
    // === Dead ends ===
    /// Every path reached a position where no applicable rule matches.
    #[error("no token rule matches")]
    NoMatch,

    // === Runaway guards ===
    /// More steps than the configured budget.
    #[error("tokenizer exceeded its step limit of {limit}")]
    StepLimit { limit: usize },
    /// No path advanced for `steps` consecutive steps.
    #[error("tokenizer made no progress for {steps} steps")]
    NoProgress { steps: usize },
}

impl LexErrorKind {
    /// Is this a runaway guard rather than a genuine rejection?
    pub fn is_stuck(&self) -> bool {
        matches!(
            self,
            LexErrorKind::StepLimit { .. } | LexErrorKind::NoProgress { .. }
        )
    }
}

impl LexError {
    #[cold]
    pub fn no_match(offset: u32, context: String) -> Self {
        LexError {
            span: Span::point(offset),
            kind: LexErrorKind::NoMatch,
            context,
        }
    }

    #[cold]
    pub fn step_limit(offset: u32, limit: usize, context: String) -> Self {
        LexError {
            span: Span::point(offset),
            kind: LexErrorKind::StepLimit { limit },
            context,
        }
    }

    #[cold]
    pub fn no_progress(offset: u32, steps: usize, context: String) -> Self {
        LexError {
            span: Span::point(offset),
            kind: LexErrorKind::NoProgress { steps },
            context,
        }
    }

    /// Absolute byte offset of the failure.
    pub fn offset(&self) -> u32 {
        self.span.start
    }
}
