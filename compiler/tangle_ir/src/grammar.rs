//! Grammar rule tables.
//!
//! A [`Grammar`] is the already-validated rule table the lexer and parser
//! consume: an ordered list of token rules and an ordered list of
//! productions, with every symbol interned. Textual grammar notation is not
//! handled here; callers assemble grammars through [`GrammarBuilder`].

use std::fmt;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::graph::{ActionError, GraphBuilder, GraphNode};
use crate::{ContextStack, Name, NameInterner, Token};

/// Callback run after a reduction.
///
/// Receives the new node, its children in order, and a builder that queues
/// edits. An `Err` is logged and the queued edits are dropped.
pub type SemanticAction = Arc<
    dyn Fn(&GraphNode, &[&GraphNode], &mut GraphBuilder<'_>) -> Result<(), ActionError>
        + Send
        + Sync,
>;

/// Guard consulted before a production is used to shift or reduce.
pub type Precondition = Arc<dyn Fn(&PreconditionInput<'_>) -> bool + Send + Sync>;

/// Which parser action a precondition is being asked about.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ActionKind {
    Shift,
    Reduce,
}

/// Parser state exposed to a [`Precondition`].
#[derive(Clone, Copy, Debug)]
pub struct PreconditionInput<'a> {
    pub action: ActionKind,
    /// Symbols on the path's stack, bottom first.
    pub stack: &'a [Name],
    /// Token about to be shifted, or the next token for a reduce.
    pub lookahead: Option<Token<'a>>,
    pub contexts: &'a ContextStack,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenPattern {
    /// Exact byte match.
    Literal(Arc<str>),
    /// Pattern compiled to an ENFA.
    Regex(Arc<str>),
}

/// A lexical rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenRule {
    pub name: Name,
    pub pattern: TokenPattern,
    /// Lexer context the rule is restricted to.
    pub context: Option<Arc<str>>,
    /// Higher wins when paths are ranked.
    pub priority: i32,
    /// Matched but never emitted (whitespace, comments).
    pub skip: bool,
    /// Context pushed after the token is matched.
    pub push_context: Option<Arc<str>>,
    /// Pop the innermost context after the token is matched.
    pub pop_context: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    Right,
    #[default]
    NonAssoc,
}

/// A production `lhs ::= rhs...`.
#[derive(Clone)]
pub struct Production {
    pub lhs: Name,
    pub rhs: SmallVec<[Name; 4]>,
    pub context: Option<Arc<str>>,
    pub precedence: Option<u16>,
    pub associativity: Associativity,
    pub action: Option<SemanticAction>,
    pub precondition: Option<Precondition>,
}

impl fmt::Debug for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Production")
            .field("lhs", &self.lhs)
            .field("rhs", &self.rhs)
            .field("context", &self.context)
            .field("precedence", &self.precedence)
            .field("associativity", &self.associativity)
            .field("action", &self.action.is_some())
            .field("precondition", &self.precondition.is_some())
            .finish()
    }
}

/// Grammar validation failure.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GrammarError {
    #[error("production for `{lhs}` has an empty right-hand side")]
    EmptyRightHandSide { lhs: String },
    #[error("token rule `{name}` is defined more than once")]
    DuplicateToken { name: String },
    #[error("token rule `{name}` has an empty pattern")]
    EmptyPattern { name: String },
    #[error("`{name}` is a token and cannot be the left-hand side of a production")]
    TokenAsRule { name: String },
    #[error("symbol `{symbol}` used by `{lhs}` is neither a token nor a rule")]
    UndefinedSymbol { symbol: String, lhs: String },
    #[error("start symbol `{name}` has no production")]
    UnknownStart { name: String },
}

type RuleIndex = FxHashMap<Name, SmallVec<[u32; 4]>>;

/// What may come right after a rule's node in some derivation.
#[derive(Clone, Debug, Default)]
struct Follow {
    tokens: FxHashSet<Name>,
    /// End of input.
    end: bool,
}

/// A validated rule table.
#[derive(Clone, Debug)]
pub struct Grammar {
    names: NameInterner,
    token_rules: Vec<TokenRule>,
    productions: Vec<Production>,
    start: Option<Name>,
    tokens: FxHashSet<Name>,
    /// Productions whose right-hand side mentions the symbol.
    containing: RuleIndex,
    /// Productions whose right-hand side ends with the symbol.
    ending_with: RuleIndex,
    goal: Option<Name>,
    follow: FxHashMap<Name, Follow>,
}

impl Grammar {
    pub fn builder() -> GrammarBuilder {
        GrammarBuilder::new()
    }

    pub fn names(&self) -> &NameInterner {
        &self.names
    }

    /// Resolve a symbol to its text.
    pub fn name(&self, name: Name) -> &str {
        self.names.lookup(name)
    }

    /// Find an interned symbol by text.
    pub fn symbol(&self, text: &str) -> Option<Name> {
        self.names.get(text)
    }

    pub fn token_rules(&self) -> &[TokenRule] {
        &self.token_rules
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn production(&self, index: usize) -> Option<&Production> {
        self.productions.get(index)
    }

    pub fn start(&self) -> Option<Name> {
        self.start
    }

    /// The symbol a complete parse reduces to: the start symbol, or the
    /// first production's left-hand side.
    pub fn goal(&self) -> Option<Name> {
        self.goal
    }

    pub fn is_token(&self, name: Name) -> bool {
        self.tokens.contains(&name)
    }

    /// Can `next` come right after a `rule` node? `None` asks about the end
    /// of input. Always false for tokens.
    pub fn can_follow(&self, rule: Name, next: Option<Name>) -> bool {
        self.follow.get(&rule).is_some_and(|f| match next {
            Some(token) => f.tokens.contains(&token),
            None => f.end,
        })
    }

    /// Indices of productions whose right-hand side contains `symbol`.
    pub fn productions_containing(&self, symbol: Name) -> &[u32] {
        self.containing.get(&symbol).map_or(&[], |v| v.as_slice())
    }

    /// Indices of productions whose right-hand side ends with `symbol`.
    pub fn productions_ending_with(&self, symbol: Name) -> &[u32] {
        self.ending_with.get(&symbol).map_or(&[], |v| v.as_slice())
    }
}

/// Unvalidated token rule description.
#[derive(Clone, Debug)]
pub struct TokenSpec {
    name: String,
    pattern: TokenPattern,
    context: Option<Arc<str>>,
    priority: i32,
    skip: bool,
    push_context: Option<Arc<str>>,
    pop_context: bool,
}

impl TokenSpec {
    pub fn literal(name: &str, text: &str) -> Self {
        Self::with_pattern(name, TokenPattern::Literal(Arc::from(text)))
    }

    pub fn regex(name: &str, pattern: &str) -> Self {
        Self::with_pattern(name, TokenPattern::Regex(Arc::from(pattern)))
    }

    fn with_pattern(name: &str, pattern: TokenPattern) -> Self {
        TokenSpec {
            name: name.to_owned(),
            pattern,
            context: None,
            priority: 0,
            skip: false,
            push_context: None,
            pop_context: false,
        }
    }

    #[must_use]
    pub fn in_context(mut self, context: &str) -> Self {
        self.context = Some(Arc::from(context));
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn skip(mut self) -> Self {
        self.skip = true;
        self
    }

    #[must_use]
    pub fn pushes(mut self, context: &str) -> Self {
        self.push_context = Some(Arc::from(context));
        self
    }

    #[must_use]
    pub fn pops(mut self) -> Self {
        self.pop_context = true;
        self
    }
}

/// Unvalidated production description.
#[derive(Clone)]
pub struct ProductionSpec {
    lhs: String,
    rhs: Vec<String>,
    context: Option<Arc<str>>,
    precedence: Option<u16>,
    associativity: Associativity,
    action: Option<SemanticAction>,
    precondition: Option<Precondition>,
}

impl ProductionSpec {
    pub fn new(lhs: &str, rhs: &[&str]) -> Self {
        ProductionSpec {
            lhs: lhs.to_owned(),
            rhs: rhs.iter().map(|s| (*s).to_owned()).collect(),
            context: None,
            precedence: None,
            associativity: Associativity::NonAssoc,
            action: None,
            precondition: None,
        }
    }

    #[must_use]
    pub fn in_context(mut self, context: &str) -> Self {
        self.context = Some(Arc::from(context));
        self
    }

    #[must_use]
    pub fn precedence(mut self, level: u16, associativity: Associativity) -> Self {
        self.precedence = Some(level);
        self.associativity = associativity;
        self
    }

    #[must_use]
    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&GraphNode, &[&GraphNode], &mut GraphBuilder<'_>) -> Result<(), ActionError>
            + Send
            + Sync
            + 'static,
    {
        self.action = Some(Arc::new(action));
        self
    }

    #[must_use]
    pub fn precondition<F>(mut self, precondition: F) -> Self
    where
        F: Fn(&PreconditionInput<'_>) -> bool + Send + Sync + 'static,
    {
        self.precondition = Some(Arc::new(precondition));
        self
    }
}

/// Assembles and validates a [`Grammar`].
#[derive(Clone, Default)]
pub struct GrammarBuilder {
    tokens: Vec<TokenSpec>,
    productions: Vec<ProductionSpec>,
    start: Option<String>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn token(mut self, spec: TokenSpec) -> Self {
        self.tokens.push(spec);
        self
    }

    /// Shorthand for a literal token rule.
    #[must_use]
    pub fn literal(self, name: &str, text: &str) -> Self {
        self.token(TokenSpec::literal(name, text))
    }

    /// Shorthand for a pattern token rule.
    #[must_use]
    pub fn regex(self, name: &str, pattern: &str) -> Self {
        self.token(TokenSpec::regex(name, pattern))
    }

    #[must_use]
    pub fn production(mut self, spec: ProductionSpec) -> Self {
        self.productions.push(spec);
        self
    }

    /// Shorthand for a plain production.
    #[must_use]
    pub fn rule(self, lhs: &str, rhs: &[&str]) -> Self {
        self.production(ProductionSpec::new(lhs, rhs))
    }

    #[must_use]
    pub fn start(mut self, symbol: &str) -> Self {
        self.start = Some(symbol.to_owned());
        self
    }

    pub fn build(self) -> Result<Grammar, GrammarError> {
        let mut names = NameInterner::new();
        let mut tokens = FxHashSet::default();
        let mut token_rules = Vec::with_capacity(self.tokens.len());

        for spec in self.tokens {
            let empty = match &spec.pattern {
                TokenPattern::Literal(s) | TokenPattern::Regex(s) => s.is_empty(),
            };
            if empty {
                return Err(GrammarError::EmptyPattern { name: spec.name });
            }
            let name = names.intern(&spec.name);
            if !tokens.insert(name) {
                return Err(GrammarError::DuplicateToken { name: spec.name });
            }
            token_rules.push(TokenRule {
                name,
                pattern: spec.pattern,
                context: spec.context,
                priority: spec.priority,
                skip: spec.skip,
                push_context: spec.push_context,
                pop_context: spec.pop_context,
            });
        }

        let mut lhs_set = FxHashSet::default();
        for spec in &self.productions {
            if spec.rhs.is_empty() {
                return Err(GrammarError::EmptyRightHandSide {
                    lhs: spec.lhs.clone(),
                });
            }
            let lhs = names.intern(&spec.lhs);
            if tokens.contains(&lhs) {
                return Err(GrammarError::TokenAsRule {
                    name: spec.lhs.clone(),
                });
            }
            lhs_set.insert(lhs);
        }

        let mut productions = Vec::with_capacity(self.productions.len());
        let mut containing = RuleIndex::default();
        let mut ending_with = RuleIndex::default();
        for (index, spec) in self.productions.into_iter().enumerate() {
            let index = index as u32;
            let mut rhs = SmallVec::with_capacity(spec.rhs.len());
            for symbol in &spec.rhs {
                let name = match names.get(symbol) {
                    Some(n) if tokens.contains(&n) || lhs_set.contains(&n) => n,
                    _ => {
                        return Err(GrammarError::UndefinedSymbol {
                            symbol: symbol.clone(),
                            lhs: spec.lhs,
                        })
                    }
                };
                let entry = containing.entry(name).or_default();
                if entry.last() != Some(&index) {
                    entry.push(index);
                }
                rhs.push(name);
            }
            if let Some(&last) = rhs.last() {
                ending_with.entry(last).or_default().push(index);
            }
            productions.push(Production {
                lhs: names.intern(&spec.lhs),
                rhs,
                context: spec.context,
                precedence: spec.precedence,
                associativity: spec.associativity,
                action: spec.action,
                precondition: spec.precondition,
            });
        }

        let start = match self.start {
            Some(text) => match names.get(&text) {
                Some(n) if lhs_set.contains(&n) => Some(n),
                _ => return Err(GrammarError::UnknownStart { name: text }),
            },
            None => None,
        };
        let goal = start.or_else(|| productions.first().map(|p| p.lhs));
        let first = first_sets(&productions, &tokens);
        let follow = follow_sets(&productions, &tokens, &first, goal);

        tracing::debug!(
            tokens = token_rules.len(),
            productions = productions.len(),
            "grammar built"
        );

        Ok(Grammar {
            names,
            token_rules,
            productions,
            start,
            tokens,
            containing,
            ending_with,
            goal,
            follow,
        })
    }
}

// ─── Lookahead sets ───

/// Tokens each rule's derivations can start with. No right-hand side is
/// empty, so only the first symbol of each production matters.
fn first_sets(
    productions: &[Production],
    tokens: &FxHashSet<Name>,
) -> FxHashMap<Name, FxHashSet<Name>> {
    let mut first: FxHashMap<Name, FxHashSet<Name>> = FxHashMap::default();
    let mut changed = true;
    while changed {
        changed = false;
        for production in productions {
            let Some(&head) = production.rhs.first() else {
                continue;
            };
            let starts = starting_tokens(head, tokens, &first);
            let entry = first.entry(production.lhs).or_default();
            for token in starts {
                changed |= entry.insert(token);
            }
        }
    }
    first
}

fn follow_sets(
    productions: &[Production],
    tokens: &FxHashSet<Name>,
    first: &FxHashMap<Name, FxHashSet<Name>>,
    goal: Option<Name>,
) -> FxHashMap<Name, Follow> {
    let mut follow: FxHashMap<Name, Follow> = FxHashMap::default();
    if let Some(goal) = goal {
        follow.entry(goal).or_default().end = true;
    }
    let mut changed = true;
    while changed {
        changed = false;
        for production in productions {
            for (i, &symbol) in production.rhs.iter().enumerate() {
                if tokens.contains(&symbol) {
                    continue;
                }
                let (next, end) = match production.rhs.get(i + 1) {
                    Some(&next) => (starting_tokens(next, tokens, first), false),
                    None => follow.get(&production.lhs).map_or((Vec::new(), false), |f| {
                        (f.tokens.iter().copied().collect(), f.end)
                    }),
                };
                let entry = follow.entry(symbol).or_default();
                if end && !entry.end {
                    entry.end = true;
                    changed = true;
                }
                for token in next {
                    changed |= entry.tokens.insert(token);
                }
            }
        }
    }
    follow
}

fn starting_tokens(
    symbol: Name,
    tokens: &FxHashSet<Name>,
    first: &FxHashMap<Name, FxHashSet<Name>>,
) -> Vec<Name> {
    if tokens.contains(&symbol) {
        vec![symbol]
    } else {
        first
            .get(&symbol)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests;
