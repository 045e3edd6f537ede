//! Source tokens handed from the lexer to the parser.
//!
//! A token borrows its text from the input buffer; it never owns bytes.
//! Tokens reaching the parser are always resolved to a single type.

use bitflags::bitflags;

use crate::{Name, Span, View};

bitflags! {
    /// Per-token metadata flags set by the source lexer.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct TokenFlags: u8 {
        /// A skipped (trivia) token preceded this token.
        const TRIVIA_BEFORE = 1 << 0;
        /// Another surviving lexical path produced a different token here.
        const AMBIGUOUS = 1 << 1;
        /// This token pushed a lexer context.
        const PUSHED_CONTEXT = 1 << 2;
        /// This token popped a lexer context.
        const POPPED_CONTEXT = 1 << 3;
    }
}

const _: () = assert!(std::mem::size_of::<TokenFlags>() == 1);

/// A resolved token: type, text view and flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Token<'src> {
    /// Token type (the token rule's interned name).
    pub kind: Name,
    /// Matched text, borrowed from the input buffer.
    pub text: View<'src>,
    pub flags: TokenFlags,
}

impl<'src> Token<'src> {
    pub fn new(kind: Name, text: View<'src>) -> Self {
        Token {
            kind,
            text,
            flags: TokenFlags::empty(),
        }
    }

    /// Absolute byte span of the token text.
    #[inline]
    pub fn span(&self) -> Span {
        self.text.span()
    }

    /// Absolute start offset.
    #[inline]
    pub fn start(&self) -> u32 {
        self.text.offset()
    }

    #[must_use]
    pub fn with_flags(mut self, flags: TokenFlags) -> Self {
        self.flags |= flags;
        self
    }
}
