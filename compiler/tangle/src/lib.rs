//! Tangle: ambiguity-tolerant lexing and parsing.
//!
//! An [`Engine`] binds a [`Grammar`] to compiled token rules and runs the
//! whole pipeline over a [`SourceBuffer`]:
//!
//! ```text
//! SourceBuffer → View → CompiledLexer (path-parallel) → Vec<Token>
//!              → Parser (multi-path GLR) → SemanticGraph + SymbolTable
//! ```
//!
//! Each stage keeps competing interpretations alive instead of committing
//! early. Token rule conflicts fork lexer paths; shift/reduce and
//! reduce/reduce conflicts fork parser paths; complete derivations that
//! survive to the end become packed children of an ambiguous root.
//!
//! The stage crates are re-exported as modules for callers that need more
//! than the facade.

use std::sync::Once;

mod config;
mod engine;
mod error;

pub use config::EngineConfig;
pub use engine::{compile_pattern, Engine, EngineOutput};
pub use error::EngineError;

pub use tangle_enfa as enfa;
pub use tangle_ir as ir;
pub use tangle_lexer as lexer;
pub use tangle_lexer_core as pattern;
pub use tangle_parse as parse;

pub use tangle_enfa::{BuildError, CompileOptions, Enfa};
pub use tangle_ir::{
    Associativity, ContextMatch, ContextStack, Grammar, GrammarBuilder, GrammarError,
    ProductionSpec, SemanticGraph, SourceBuffer, Span, SymbolTable, Token, TokenSpec, View,
};
pub use tangle_lexer::{LexOutput, LexerConfig};
pub use tangle_lexer_core::DisambiguationStrategy;
pub use tangle_parse::{ParseOutput, ParserConfig};

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing when `RUST_LOG` is unset. Safe to call more than once.
///
/// ```text
/// RUST_LOG=tangle_parse=debug    # parse summaries, merges, stuck guards
/// RUST_LOG=tangle_lexer=trace    # every lexer path fork
/// ```
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
