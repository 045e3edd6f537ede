//! Parse error types.
//!
//! Errors are collected in [`ParseOutput`](crate::ParseOutput) next to the
//! `success` flag. A stuck parse is kept distinct from a genuine rejection so
//! callers can tell "the grammar says no" from "the parser gave up".

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message} (token {token_index}, offset {offset})")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Index of the token no path could get past, or the token count when
    /// the input ran out first.
    pub token_index: usize,
    /// Absolute byte offset of that point.
    pub offset: u32,
    pub message: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ParseErrorKind {
    /// Every path died before a derivation completed.
    #[error("no derivation")]
    NoDerivation,
    /// A runaway guard fired.
    #[error("parser stuck ({0})")]
    Stuck(StuckReason),
    #[error("empty input")]
    EmptyInput,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum StuckReason {
    #[error("step limit exceeded")]
    StepLimit,
    #[error("no forward progress")]
    NoProgress,
}

impl ParseError {
    #[cold]
    pub fn new(kind: ParseErrorKind, token_index: usize, offset: u32, message: impl Into<String>) -> Self {
        ParseError {
            kind,
            token_index,
            offset,
            message: message.into(),
        }
    }

    pub fn is_stuck(&self) -> bool {
        matches!(self.kind, ParseErrorKind::Stuck(_))
    }
}
