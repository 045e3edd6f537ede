//! Engine configuration.

use tangle_enfa::CompileOptions;
use tangle_lexer::LexerConfig;
use tangle_parse::ParserConfig;

/// Settings for every stage an [`Engine`](crate::Engine) runs.
#[derive(Copy, Clone, Debug)]
pub struct EngineConfig {
    /// Pattern compilation for regex token rules.
    pub compile: CompileOptions,
    pub lexer: LexerConfig,
    pub parser: ParserConfig,
}

impl EngineConfig {
    pub const fn new() -> Self {
        EngineConfig {
            compile: CompileOptions::new(),
            lexer: LexerConfig::new(),
            parser: ParserConfig::new(),
        }
    }

    #[must_use]
    pub const fn with_compile_options(mut self, compile: CompileOptions) -> Self {
        self.compile = compile;
        self
    }

    #[must_use]
    pub const fn with_lexer(mut self, lexer: LexerConfig) -> Self {
        self.lexer = lexer;
        self
    }

    #[must_use]
    pub const fn with_parser(mut self, parser: ParserConfig) -> Self {
        self.parser = parser;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
