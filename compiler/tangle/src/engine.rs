//! Grammar-bound pipeline: source buffer → tokens → semantic graph.

use std::sync::Arc;

use tangle_enfa::{Enfa, PropertyProvider};
use tangle_ir::{EncodingIssue, Grammar, GrammarBuilder, SemanticGraph, SourceBuffer};
use tangle_lexer::{CompiledLexer, LexOutput};
use tangle_parse::{ParseOutput, Parser};

use crate::config::EngineConfig;
use crate::error::EngineError;

/// A grammar with its token rules compiled, ready to process inputs.
///
/// Building an engine is the expensive part; `process` can be called any
/// number of times, from any number of threads.
#[derive(Debug)]
pub struct Engine {
    grammar: Grammar,
    lexer: CompiledLexer,
    config: EngineConfig,
}

/// Result of running both stages over one input.
#[derive(Clone, Debug)]
pub struct EngineOutput<'src> {
    /// Encoding problems found in the input buffer.
    pub encoding_issues: Vec<EncodingIssue>,
    pub lex: LexOutput<'src>,
    /// `None` when lexing failed and parsing was skipped.
    pub parse: Option<ParseOutput>,
}

impl EngineOutput<'_> {
    /// Did both stages succeed?
    pub fn success(&self) -> bool {
        self.lex.success && self.parse.as_ref().is_some_and(|p| p.success)
    }

    /// The semantic graph, if parsing ran.
    pub fn graph(&self) -> Option<&SemanticGraph> {
        self.parse.as_ref().map(|p| &p.graph)
    }

    /// Human-readable messages for every lex and parse error, in stage order.
    pub fn diagnostics(&self) -> Vec<String> {
        let lex = self.lex.errors.iter().map(ToString::to_string);
        let parse = self
            .parse
            .iter()
            .flat_map(|p| p.errors.iter().map(ToString::to_string));
        lex.chain(parse).collect()
    }
}

impl Engine {
    /// Compile `grammar`'s token rules.
    pub fn new(grammar: Grammar, config: EngineConfig) -> Result<Self, EngineError> {
        let lexer = CompiledLexer::with_options(&grammar, &config.compile)?;
        tracing::debug!(
            tokens = grammar.token_rules().len(),
            productions = grammar.productions().len(),
            "engine ready"
        );
        Ok(Engine {
            grammar,
            lexer,
            config,
        })
    }

    /// Validate `builder` and compile the resulting grammar.
    pub fn from_builder(builder: GrammarBuilder, config: EngineConfig) -> Result<Self, EngineError> {
        Self::new(builder.build()?, config)
    }

    /// Answer `\p{..}` and POSIX classes with `provider` instead of the
    /// standard `char` classification.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn PropertyProvider + Send + Sync>) -> Self {
        self.lexer = self.lexer.with_provider(provider);
        self
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn lexer(&self) -> &CompiledLexer {
        &self.lexer
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Tokenize `source` without parsing.
    ///
    /// A leading UTF-8 byte order mark is skipped; offsets stay relative to
    /// the start of the buffer.
    pub fn lex<'src>(&self, source: &'src SourceBuffer) -> LexOutput<'src> {
        self.lexer.tokenize(source.content(), &self.config.lexer)
    }

    /// Lex `source`, then parse the best token stream.
    ///
    /// Contexts still open at the end of lexing seed the parser's context
    /// stack.
    pub fn process<'src>(&self, source: &'src SourceBuffer) -> EngineOutput<'src> {
        let encoding_issues = source.encoding_issues().to_vec();
        if !encoding_issues.is_empty() {
            tracing::debug!(issues = encoding_issues.len(), "input has encoding issues");
        }
        let lex = self.lex(source);
        let parse = if lex.success {
            let output = Parser::new(&self.grammar, &lex.tokens, self.config.parser)
                .with_contexts(lex.contexts.clone())
                .parse();
            Some(output)
        } else {
            tracing::debug!(errors = lex.errors.len(), "lexing failed, parse skipped");
            None
        };
        EngineOutput {
            encoding_issues,
            lex,
            parse,
        }
    }
}

/// Compile a single pattern outside any grammar.
pub fn compile_pattern(name: &str, pattern: &str) -> Result<Enfa, EngineError> {
    let enfa = Enfa::compile(name, pattern)?;
    tracing::debug!(name, states = enfa.len(), "pattern compiled");
    Ok(enfa)
}
