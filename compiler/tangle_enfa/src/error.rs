//! Pattern compilation errors.

use std::fmt;
use std::sync::Arc;

use tangle_lexer_core::PatternLexError;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuildErrorKind {
    #[error("unclosed group")]
    UnclosedGroup,
    #[error("unmatched group end")]
    UnmatchedGroupEnd,
    #[error("empty character class")]
    EmptyClass,
    #[error("character class range is out of order")]
    InvalidClassRange,
    #[error("repetition minimum exceeds maximum")]
    MalformedRepetition,
    #[error("repetition bound {bound} exceeds the limit of {limit}")]
    RepetitionTooLarge { bound: u32, limit: u32 },
    #[error("quantifier has nothing to repeat")]
    NothingToRepeat,
    #[error("unsupported construct: {0}")]
    UnsupportedConstruct(&'static str),
    #[error("back-reference to an undefined group")]
    InvalidBackReference,
    #[error("invalid code point {0:#X}")]
    InvalidCodePoint(u32),
    #[error(transparent)]
    Lex(PatternLexError),
}

/// Failure to compile one pattern.
///
/// Carries the terminal (token rule) name and the pattern text matched so
/// far, so a grammar author can find the offending rule.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub struct BuildError {
    pub terminal: Arc<str>,
    /// Pattern text before `position`.
    pub matched: String,
    pub position: u32,
    pub kind: BuildErrorKind,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pattern for `{}`: {} at offset {} (after {:?})",
            self.terminal, self.kind, self.position, self.matched
        )
    }
}
