//! Compiled token rules.
//!
//! Every grammar [`TokenRule`] is compiled once: literal rules keep their
//! bytes, regex rules become an [`Enfa`]. At a given position each
//! applicable rule offers at most one candidate, its longest match.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;
use tangle_enfa::{BuildError, CompileOptions, Enfa, PropertyProvider, StdPropertyProvider};
use tangle_ir::{ContextMatch, ContextStack, Grammar, Name, TokenPattern, TokenRule};

use crate::config::LexerConfig;
use crate::output::LexOutput;
use crate::tokenize::Tokenizer;

#[derive(Clone, Debug)]
enum RuleMatcher {
    Literal(Arc<str>),
    Pattern(Enfa),
}

/// A token rule ready to match.
#[derive(Clone, Debug)]
pub struct CompiledRule {
    pub name: Name,
    pub context: Option<Arc<str>>,
    pub priority: i32,
    pub skip: bool,
    pub push_context: Option<Arc<str>>,
    pub pop_context: bool,
    matcher: RuleMatcher,
}

impl CompiledRule {
    fn compile(
        rule: &TokenRule,
        display_name: &str,
        options: &CompileOptions,
    ) -> Result<Self, BuildError> {
        let matcher = match &rule.pattern {
            TokenPattern::Literal(text) => RuleMatcher::Literal(Arc::clone(text)),
            TokenPattern::Regex(pattern) => {
                RuleMatcher::Pattern(Enfa::compile_with(display_name, pattern, options)?)
            }
        };
        Ok(CompiledRule {
            name: rule.name,
            context: rule.context.clone(),
            priority: rule.priority,
            skip: rule.skip,
            push_context: rule.push_context.clone(),
            pop_context: rule.pop_context,
            matcher,
        })
    }

    /// Does a zero-width match still do something?
    ///
    /// Only context switches may match the empty string; any other empty
    /// match would leave the path where it was.
    pub fn switches_context(&self) -> bool {
        self.push_context.is_some() || self.pop_context
    }

    /// Length of this rule's longest match at `pos`.
    fn longest_at(&self, bytes: &[u8], pos: usize, provider: &dyn PropertyProvider) -> Option<usize> {
        match &self.matcher {
            RuleMatcher::Literal(text) => bytes
                .get(pos..)
                .is_some_and(|rest| rest.starts_with(text.as_bytes()))
                .then_some(text.len()),
            RuleMatcher::Pattern(enfa) => enfa
                .matcher_with(provider)
                .longest_match_at(bytes, pos)
                .map(|m| m.len()),
        }
    }

    /// The compiled automaton for regex rules.
    pub fn enfa(&self) -> Option<&Enfa> {
        match &self.matcher {
            RuleMatcher::Pattern(enfa) => Some(enfa),
            RuleMatcher::Literal(_) => None,
        }
    }
}

/// One candidate token at a position.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RuleMatch {
    /// Index into [`CompiledLexer::rules`].
    pub rule: usize,
    pub len: usize,
}

/// Token rules of a grammar, compiled and ready to tokenize with.
#[derive(Clone)]
pub struct CompiledLexer {
    rules: Vec<CompiledRule>,
    provider: Arc<dyn PropertyProvider + Send + Sync>,
}

impl fmt::Debug for CompiledLexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledLexer")
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl CompiledLexer {
    /// Compile every token rule of `grammar` with default pattern options.
    pub fn new(grammar: &Grammar) -> Result<Self, BuildError> {
        Self::with_options(grammar, &CompileOptions::default())
    }

    /// Compile every token rule, stopping at the first pattern that fails.
    pub fn with_options(grammar: &Grammar, options: &CompileOptions) -> Result<Self, BuildError> {
        let rules = grammar
            .token_rules()
            .iter()
            .map(|rule| CompiledRule::compile(rule, grammar.name(rule.name), options))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(rules = rules.len(), "token rules compiled");
        Ok(CompiledLexer {
            rules,
            provider: Arc::new(StdPropertyProvider),
        })
    }

    /// Answer `\p{..}` and POSIX classes with `provider`.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn PropertyProvider + Send + Sync>) -> Self {
        self.provider = provider;
        self
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn rule(&self, index: usize) -> Option<&CompiledRule> {
        self.rules.get(index)
    }

    /// Every applicable rule's longest match at `pos`, in rule order.
    ///
    /// Empty matches are kept only for rules that switch context.
    pub fn matches_at(
        &self,
        bytes: &[u8],
        pos: usize,
        contexts: &ContextStack,
        mode: ContextMatch,
    ) -> SmallVec<[RuleMatch; 4]> {
        let provider: &dyn PropertyProvider = &*self.provider;
        self.rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| contexts.is_active(rule.context.as_deref(), mode))
            .filter_map(|(index, rule)| {
                let len = rule.longest_at(bytes, pos, provider)?;
                (len > 0 || rule.switches_context()).then_some(RuleMatch { rule: index, len })
            })
            .collect()
    }

    /// Tokenize `view` with path-parallel scanning.
    pub fn tokenize<'src>(
        &self,
        view: tangle_ir::View<'src>,
        config: &LexerConfig,
    ) -> LexOutput<'src> {
        Tokenizer::new(self, view, config).run()
    }
}
