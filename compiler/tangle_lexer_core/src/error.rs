//! Pattern lexing errors.
//!
//! These are hard failures: scanning stops and no partial token is emitted
//! for the construct at `position`.

use tangle_ir::ViewError;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PatternLexError {
    #[error("unterminated character class starting at {position}")]
    UnterminatedClass { position: u32 },
    #[error("unterminated property escape starting at {position}")]
    UnterminatedProperty { position: u32 },
    #[error("trailing backslash at {position}")]
    TrailingBackslash { position: u32 },
    #[error("unterminated group name starting at {position}")]
    UnterminatedGroupName { position: u32 },
    #[error("empty group name at {position}")]
    EmptyGroupName { position: u32 },
    #[error(transparent)]
    View(#[from] ViewError),
}

impl PatternLexError {
    /// Pattern offset the error points at, when it has one.
    pub fn position(&self) -> Option<u32> {
        match *self {
            PatternLexError::UnterminatedClass { position }
            | PatternLexError::UnterminatedProperty { position }
            | PatternLexError::TrailingBackslash { position }
            | PatternLexError::UnterminatedGroupName { position }
            | PatternLexError::EmptyGroupName { position } => Some(position),
            PatternLexError::View(_) => None,
        }
    }
}
