//! Multi-path parser for tangle grammars.
//!
//! The parser keeps several candidate derivations (paths) alive at once.
//! Paths share one node arena and hold only index stacks into it, so
//! branching a path copies a few ids rather than a tree. Equivalent paths
//! merge, the path set is capped by score, and every derivation that
//! covers the whole input is kept: two or more become the packed children
//! of an ambiguous root.
//!
//! ```text
//! &[Token] → Parser::parse → ParseOutput { graph, symbols, contexts, errors }
//! ```
//!
//! # Design Philosophy
//!
//! - **Errors are data**: dead ends and runaway guards are reported in
//!   [`ParseOutput::errors`] next to a `success` flag, never as `Err`.
//! - **Actions can't break a parse**: a failing semantic action is logged
//!   and its queued edits are dropped; the path carries on.
//! - **Shared parse state**: the symbol table and context stack belong to
//!   the parse call, not to individual paths.

mod actions;
mod config;
mod error;
mod output;
mod parser;
mod path;

pub use config::ParserConfig;
pub use error::{ParseError, ParseErrorKind, StuckReason};
pub use output::{ParseOutput, ParseStats};
pub use parser::Parser;
