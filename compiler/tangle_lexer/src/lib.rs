//! Source tokenizer for tangle grammars.
//!
//! [`CompiledLexer`] compiles a grammar's token rules once (literals stay
//! bytes, regex rules become ENFAs) and then tokenizes any number of inputs.
//!
//! # Path-parallel scanning
//!
//! Instead of committing to one rule per position, the tokenizer keeps a set
//! of candidate paths. Each path forks once per rule that matches at its
//! position, so keyword/identifier style conflicts produce separate token
//! streams rather than an early decision. Equivalent paths merge, the set is
//! capped, and the best complete stream wins:
//!
//! ```text
//! View → CompiledLexer::tokenize → LexOutput { tokens, alternatives, errors }
//! ```
//!
//! Token rules may be restricted to a lexer context and may push or pop
//! contexts, which lets string bodies or embedded languages use their own
//! rules. Every path owns its context stack.

mod config;
mod error;
mod output;
mod path;
mod rules;
mod tokenize;

pub use config::LexerConfig;
pub use error::{LexError, LexErrorKind};
pub use output::{LexOutput, LexStats};
pub use rules::{CompiledLexer, CompiledRule, RuleMatch};
