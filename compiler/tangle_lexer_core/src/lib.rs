//! Two-phase pattern lexer.
//!
//! Phase 1 ([`scan`]) walks a pattern byte by byte and emits
//! [`PatternToken`]s. Where the same offset admits several readings (braced
//! versus short hex escapes, multi-digit back-references) the token records
//! the alternatives instead of guessing.
//!
//! Phase 2 ([`disambiguate`]) resolves each token to one reading under a
//! [`DisambiguationStrategy`] and emits a flat [`ParsedState`] stream that
//! the ENFA builder consumes. Unresolved tokens never leave this crate.
//!
//! This crate only borrows [`tangle_ir::View`]; it knows nothing about
//! grammars or automata.

mod cursor;
mod disambiguate;
mod error;
mod scanner;
mod token;

pub use disambiguate::{disambiguate, DisambiguationStrategy};
pub use error::PatternLexError;
pub use scanner::{scan, PatternScanner};
pub use token::{
    Anchor, ClassEscape, ClassItem, ClassSet, GroupKind, ParsedState, PatternKind, PatternToken,
    Quantifier,
};

use tangle_ir::View;

/// Run both phases over `pattern`.
pub fn lex_pattern(
    pattern: View<'_>,
    strategy: DisambiguationStrategy,
) -> Result<Vec<ParsedState<'_>>, PatternLexError> {
    let tokens = scan(pattern)?;
    disambiguate(pattern, &tokens, strategy)
}
