//! Extended NFA for tangle patterns.
//!
//! A pattern compiles once into an [`Enfa`]: a flat arena of typed
//! [`State`]s joined by typed [`Transition`]s. The automaton is immutable
//! and shared read-only by every match against it.
//!
//! # Pipeline
//!
//! ```text
//! pattern text → tangle_lexer_core::lex_pattern → ParsedState stream
//!              → builder (frame stack) → Enfa → Matcher
//! ```
//!
//! # Design Philosophy
//!
//! - **No backtracking**: matching is a priority-ordered thread simulation.
//!   Constructs that need backtracking control (atomic groups, possessive
//!   quantifiers, recursion) are rejected at build time.
//! - **Typed transitions**: every matching rule is a variant of
//!   [`TransitionKind`] carrying its own payload; the matcher is one
//!   exhaustive `match`.
//! - **Pluggable properties**: `\p{..}` and POSIX classes are answered by a
//!   [`PropertyProvider`].

mod automaton;
mod builder;
mod error;
mod matcher;
mod property;
mod state;

pub use automaton::{CompileOptions, Enfa};
pub use error::{BuildError, BuildErrorKind};
pub use matcher::{Match, Matcher};
pub use property::{PropertyProvider, StdPropertyProvider};
pub use state::{
    CharSet, GroupBalance, GroupInfo, GroupingKind, PropertyRef, State, StateId, StateKind,
    Transition, TransitionKind,
};
