//! Multi-path parser driver.
//!
//! # Algorithm
//!
//! For each input token the current generation of paths is expanded in
//! reduction rounds. In every round each path may:
//!
//! - **shift** the token, when some applicable production has the token's
//!   type at position `k`, the top `k` stack symbols equal that
//!   production's first `k` symbols, and the production itself fits on the
//!   rest of the stack (score × `shift_factor`);
//! - **reduce** by every applicable production whose right-hand side matches
//!   the top of its stack, whose left-hand side fits on what remains and
//!   can be followed by the lookahead token (or by the end of input)
//!   (score × `reduce_factor`). Reduced paths join the next round so they
//!   can reduce again or shift.
//!
//! A path that can do neither dies. Shifted paths form the next generation,
//! which is merged on (cursor, state, stack symbols) and capped at
//! `max_paths`. After the last token only reductions run, and every path
//! left holding exactly one goal node is harvested as a derivation before
//! merging, so distinct derivations of the same input all survive.
//!
//! Stacks are persistent frame chains (see `path.rs`) and viability
//! answers are cached per (stack, symbol), so the work per token does not
//! grow with stack depth.

use std::collections::hash_map::Entry;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tangle_ir::{
    ActionKind, Associativity, ContextStack, Grammar, GraphNode, Name, NodeId, PreconditionInput,
    Production, SemanticGraph, Span, SymbolTable, Token,
};
use tangle_stack::ensure_sufficient_stack;

use crate::config::ParserConfig;
use crate::error::{ParseError, ParseErrorKind, StuckReason};
use crate::output::{ParseOutput, ParseStats};
use crate::path::{FrameId, Frames, MergeKey, ParsePath, PathState};

/// Parses one token stream against a grammar.
pub struct Parser<'g, 't, 'src> {
    grammar: &'g Grammar,
    tokens: &'t [Token<'src>],
    config: ParserConfig,
    contexts: ContextStack,
}

impl<'g, 't, 'src> Parser<'g, 't, 'src> {
    pub fn new(grammar: &'g Grammar, tokens: &'t [Token<'src>], config: ParserConfig) -> Self {
        Parser {
            grammar,
            tokens,
            config,
            contexts: ContextStack::new(),
        }
    }

    /// Start from an existing context stack, e.g. the one the lexer ended
    /// in.
    #[must_use]
    pub fn with_contexts(mut self, contexts: ContextStack) -> Self {
        self.contexts = contexts;
        self
    }

    pub fn parse(self) -> ParseOutput {
        let run = Run {
            grammar: self.grammar,
            tokens: self.tokens,
            config: self.config,
            goal: self.grammar.goal(),
            arena: SemanticGraph::new(),
            frames: Frames::new(),
            viable: FxHashMap::default(),
            terminals: vec![None; self.tokens.len()],
            symbols: SymbolTable::new(),
            contexts: self.contexts,
            stats: ParseStats::default(),
            step_limit: self.config.step_limit(self.tokens.len()),
            next_id: 1,
        };
        run.parse()
    }
}

/// Mutable state of one parse. Symbol table and context stack are shared by
/// every path.
pub(crate) struct Run<'g, 't, 'src> {
    pub(crate) grammar: &'g Grammar,
    tokens: &'t [Token<'src>],
    config: ParserConfig,
    goal: Option<Name>,
    /// Nodes of every path, shared.
    pub(crate) arena: SemanticGraph,
    /// Stack entries of every path, shared.
    frames: Frames,
    /// Settled answers of `can_hold`.
    viable: FxHashMap<(Option<FrameId>, Name), bool>,
    /// Terminal node per token, created on first shift.
    terminals: Vec<Option<NodeId>>,
    pub(crate) symbols: SymbolTable,
    pub(crate) contexts: ContextStack,
    pub(crate) stats: ParseStats,
    step_limit: usize,
    next_id: u32,
}

/// Paths produced by expanding one generation.
struct Expansion {
    shifted: Vec<ParsePath>,
    completed: Vec<ParsePath>,
}

impl<'g, 't, 'src> Run<'g, 't, 'src> {
    fn parse(mut self) -> ParseOutput {
        if self.tokens.is_empty() {
            let error = ParseError::new(ParseErrorKind::EmptyInput, 0, 0, "nothing to parse");
            return self.fail(error, &[]);
        }

        let mut paths = vec![ParsePath::root()];
        for cursor in 0..=self.tokens.len() {
            let lookahead = self.tokens.get(cursor).copied();
            let expansion = match self.expand(paths.clone(), cursor, lookahead) {
                Ok(expansion) => expansion,
                Err(reason) => {
                    let error = self.stuck(reason, cursor);
                    return self.fail(error, &paths);
                }
            };

            if lookahead.is_none() {
                return self.finish(expansion.completed, &paths);
            }

            let next = self.merge(expansion.shifted, cursor + 1);
            let next = self.prune(next);
            self.stats.peak_paths = self.stats.peak_paths.max(next.len());
            tracing::trace!(cursor, paths = next.len(), "parser step");
            if next.is_empty() {
                let error = self.no_derivation(cursor);
                return self.fail(error, &paths);
            }
            paths = next;
        }
        // The loop returns at the end-of-input cursor.
        let error = self.no_derivation(self.tokens.len());
        self.fail(error, &paths)
    }

    /// Run reduction rounds over `paths` at `cursor`.
    fn expand(
        &mut self,
        paths: Vec<ParsePath>,
        cursor: usize,
        lookahead: Option<Token<'src>>,
    ) -> Result<Expansion, StuckReason> {
        let mut expansion = Expansion {
            shifted: Vec::new(),
            completed: Vec::new(),
        };
        let mut round = paths;
        let mut stalled = 0;

        while !round.is_empty() {
            let mut reduced = Vec::new();
            let mut progressed = false;

            for path in &round {
                if self.stats.steps >= self.step_limit {
                    return Err(StuckReason::StepLimit);
                }
                self.stats.steps += 1;

                let shift = lookahead.and_then(|token| self.shift_precedence(path, token));
                let reductions = self.reductions(path, lookahead);
                let (shift, reductions) = resolve_conflicts(self.grammar, shift, reductions);

                if shift {
                    if let Some(token) = lookahead {
                        expansion.shifted.push(self.shift(path, token, cursor));
                        progressed = true;
                    }
                }
                for index in reductions {
                    let Some((next, shrank)) = self.reduce(path, index, lookahead) else {
                        continue;
                    };
                    progressed |= shrank;
                    if lookahead.is_none() && next.is_complete(&self.frames, self.goal) {
                        let mut done = next.clone();
                        done.state = PathState::Complete;
                        expansion.completed.push(done);
                        progressed = true;
                    }
                    reduced.push(next);
                }
            }

            let reduced = self.merge(reduced, cursor);
            round = self.prune(reduced);
            if progressed {
                stalled = 0;
            } else {
                stalled += 1;
                if stalled >= self.config.stall_limit {
                    return Err(StuckReason::NoProgress);
                }
            }
        }
        Ok(expansion)
    }

    // ─── Shift ───

    /// Best precedence among the productions that let `path` shift `token`,
    /// or `None` when it cannot shift.
    fn shift_precedence(&mut self, path: &ParsePath, token: Token<'src>) -> Option<Option<u16>> {
        let grammar = self.grammar;
        let mut best: Option<Option<u16>> = None;
        for &index in grammar.productions_containing(token.kind) {
            let Some(production) = grammar.production(index as usize) else {
                continue;
            };
            let mut viable = false;
            for (k, &symbol) in production.rhs.iter().enumerate() {
                if symbol == token.kind
                    && self.frames.ends_with(path.top, &production.rhs[..k])
                    && self.can_hold(self.frames.pop(path.top, k), production.lhs)
                {
                    viable = true;
                    break;
                }
            }
            if viable && self.applicable(production, path, ActionKind::Shift, Some(token)) {
                best = Some(best.flatten().max(production.precedence));
            }
        }
        best
    }

    fn shift(&mut self, path: &ParsePath, token: Token<'src>, cursor: usize) -> ParsePath {
        let node = match self.terminals[cursor] {
            Some(node) => node,
            None => {
                let name = self.grammar.names().shared(token.kind);
                let value: Arc<str> = Arc::from(token.text.to_owned_string());
                let node = self
                    .arena
                    .add(GraphNode::terminal(token.kind, name, value, token.span()));
                self.terminals[cursor] = Some(node);
                node
            }
        };
        let id = self.fresh_id();
        path.shifted(
            &mut self.frames,
            id,
            node,
            token.kind,
            self.config.shift_factor,
        )
    }

    // ─── Reduce ───

    /// Productions whose right-hand side matches the top of `path`'s stack
    /// and whose left-hand side may precede `lookahead`.
    fn reductions(
        &mut self,
        path: &ParsePath,
        lookahead: Option<Token<'src>>,
    ) -> SmallVec<[u32; 4]> {
        let Some(top) = self.frames.symbol(path.top) else {
            return SmallVec::new();
        };
        let grammar = self.grammar;
        let next = lookahead.map(|t| t.kind);
        let mut found = SmallVec::new();
        for &index in grammar.productions_ending_with(top) {
            let Some(p) = grammar.production(index as usize) else {
                continue;
            };
            if grammar.can_follow(p.lhs, next)
                && self.frames.ends_with(path.top, &p.rhs)
                && self.applicable(p, path, ActionKind::Reduce, lookahead)
                && self.can_hold(self.frames.pop(path.top, p.rhs.len()), p.lhs)
            {
                found.push(index);
            }
        }
        found
    }

    /// Can `symbol` sit on top of the stack `below` in some derivation?
    ///
    /// True when `below` is empty and `symbol` is the goal, or when some
    /// production has `symbol` at position `k`, `below` ends with that
    /// production's first `k` symbols, and the production's left-hand side
    /// can in turn sit on what remains.
    fn can_hold(&mut self, below: Option<FrameId>, symbol: Name) -> bool {
        if let Some(&known) = self.viable.get(&(below, symbol)) {
            return known;
        }
        let mut visited = FxHashSet::default();
        let holds = self.can_hold_inner(below, symbol, &mut visited);
        // A full search from here is exact, including a negative answer.
        self.viable.insert((below, symbol), holds);
        holds
    }

    fn can_hold_inner(
        &mut self,
        below: Option<FrameId>,
        symbol: Name,
        visited: &mut FxHashSet<(Option<FrameId>, Name)>,
    ) -> bool {
        if below.is_none() && self.goal == Some(symbol) {
            return true;
        }
        if let Some(&known) = self.viable.get(&(below, symbol)) {
            return known;
        }
        if !visited.insert((below, symbol)) {
            return false;
        }
        let grammar = self.grammar;
        let holds = ensure_sufficient_stack(|| {
            for &index in grammar.productions_containing(symbol) {
                let Some(p) = grammar.production(index as usize) else {
                    continue;
                };
                for (k, &s) in p.rhs.iter().enumerate() {
                    if s == symbol
                        && self.frames.ends_with(below, &p.rhs[..k])
                        && self.can_hold_inner(self.frames.pop(below, k), p.lhs, visited)
                    {
                        return true;
                    }
                }
            }
            false
        });
        // A miss here may come from a cut cycle, so only hits are cached.
        if holds {
            self.viable.insert((below, symbol), true);
        }
        holds
    }

    /// Reduce `path` by production `index`. Returns the new path and whether
    /// the stack got shorter.
    fn reduce(
        &mut self,
        path: &ParsePath,
        index: u32,
        lookahead: Option<Token<'src>>,
    ) -> Option<(ParsePath, bool)> {
        let grammar = self.grammar;
        let production = grammar.production(index as usize)?;
        let len = production.rhs.len();
        if path.revisits(&self.frames, len, production.lhs) {
            tracing::trace!(rule = grammar.name(production.lhs), "reduction cycle skipped");
            return None;
        }

        let children = self.frames.top_nodes(path.top, len);
        let span = Span::covering(
            children
                .iter()
                .filter_map(|&c| self.arena.get(c))
                .map(|n| n.span),
        )
        .unwrap_or_else(|| lookahead.map_or(Span::DUMMY, |t| Span::point(t.start())));
        let name = grammar.names().shared(production.lhs);
        let node = self
            .arena
            .add(GraphNode::non_terminal(production.lhs, name, span, children));
        if let Some(action) = &production.action {
            self.run_action(action, production.lhs, node);
        }

        let id = self.fresh_id();
        let next = path.reduced(
            &mut self.frames,
            id,
            len,
            node,
            production.lhs,
            self.config.reduce_factor,
        );
        Some((next, len > 1))
    }

    fn applicable(
        &self,
        production: &Production,
        path: &ParsePath,
        action: ActionKind,
        lookahead: Option<Token<'src>>,
    ) -> bool {
        if !self
            .contexts
            .is_active(production.context.as_deref(), self.config.context_match)
        {
            return false;
        }
        match &production.precondition {
            None => true,
            Some(precondition) => precondition(&PreconditionInput {
                action,
                stack: &self.frames.symbols(path.top),
                lookahead,
                contexts: &self.contexts,
            }),
        }
    }

    // ─── Generations ───

    /// Keep one path per merge key: higher score, then lower id.
    fn merge(&mut self, paths: Vec<ParsePath>, cursor: usize) -> Vec<ParsePath> {
        let mut kept: Vec<ParsePath> = Vec::with_capacity(paths.len());
        let mut slots: FxHashMap<MergeKey, usize> = FxHashMap::default();
        for path in paths {
            match slots.entry(path.merge_key(&self.frames, cursor)) {
                Entry::Occupied(slot) => {
                    self.stats.merged += 1;
                    let existing = &mut kept[*slot.get()];
                    if path.outranks(existing) {
                        *existing = path;
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(kept.len());
                    kept.push(path);
                }
            }
        }
        kept
    }

    fn prune(&mut self, mut paths: Vec<ParsePath>) -> Vec<ParsePath> {
        let ceiling = self.config.max_paths.max(1);
        if paths.len() > ceiling {
            sort_best_first(&mut paths);
            let dropped = paths.len() - ceiling;
            self.stats.pruned += dropped;
            tracing::debug!(dropped, ceiling, "pruned parser paths");
            paths.truncate(ceiling);
        }
        paths
    }

    // ─── Results ───

    fn finish(mut self, mut completed: Vec<ParsePath>, last: &[ParsePath]) -> ParseOutput {
        sort_best_first(&mut completed);
        let mut roots: Vec<NodeId> = Vec::with_capacity(completed.len());
        for path in &completed {
            if let Some(top) = path.top {
                let root = self.frames.get(top).node;
                if !roots.contains(&root) {
                    roots.push(root);
                }
            }
        }
        self.stats.completed = roots.len();
        if roots.is_empty() {
            let error = self.no_derivation(self.tokens.len());
            return self.fail(error, last);
        }

        let (mut graph, roots) = self.arena.extract(&roots);
        if let [root] = roots.as_slice() {
            graph.set_root(*root);
        } else if let Some(goal) = self.goal {
            let name = self.grammar.names().shared(goal);
            let wrappers: Vec<NodeId> = roots
                .iter()
                .map(|&root| {
                    let span = graph[root].span;
                    graph.add(GraphNode::packed(goal, Arc::clone(&name), span, root))
                })
                .collect();
            let span =
                Span::covering(roots.iter().map(|&r| graph[r].span)).unwrap_or(Span::DUMMY);
            let root = graph.add(GraphNode::ambiguous_root(goal, name, span, wrappers));
            graph.set_root(root);
        }

        tracing::debug!(
            derivations = roots.len(),
            nodes = graph.len(),
            steps = self.stats.steps,
            merged = self.stats.merged,
            pruned = self.stats.pruned,
            "parse complete"
        );
        ParseOutput {
            success: true,
            graph,
            errors: Vec::new(),
            symbols: self.symbols,
            contexts: self.contexts,
            stats: self.stats,
        }
    }

    /// Report `error`, keeping the nodes of the best path in `last`.
    fn fail(self, error: ParseError, last: &[ParsePath]) -> ParseOutput {
        let best = last
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score).then(b.id.cmp(&a.id)));
        let (graph, _) = match best {
            Some(path) => self.arena.extract(&self.frames.nodes(path.top)),
            None => (SemanticGraph::new(), Vec::new()),
        };
        tracing::debug!(
            kind = %error.kind,
            token = error.token_index,
            offset = error.offset,
            "parse failed"
        );
        ParseOutput {
            success: false,
            graph,
            errors: vec![error],
            symbols: self.symbols,
            contexts: self.contexts,
            stats: self.stats,
        }
    }

    fn no_derivation(&self, cursor: usize) -> ParseError {
        let offset = self.offset_at(cursor);
        let message = match self.tokens.get(cursor) {
            Some(token) => format!(
                "no path can consume `{}` ({})",
                token.text.to_owned_string(),
                self.grammar.name(token.kind)
            ),
            None => "input ended before any derivation completed".to_owned(),
        };
        ParseError::new(ParseErrorKind::NoDerivation, cursor, offset, message)
    }

    fn stuck(&self, reason: StuckReason, cursor: usize) -> ParseError {
        tracing::warn!(%reason, cursor, steps = self.stats.steps, "parser stuck");
        let message = match reason {
            StuckReason::StepLimit => format!("gave up after {} expansions", self.stats.steps),
            StuckReason::NoProgress => format!(
                "{} reduction rounds without progress",
                self.config.stall_limit
            ),
        };
        ParseError::new(
            ParseErrorKind::Stuck(reason),
            cursor,
            self.offset_at(cursor),
            message,
        )
    }

    /// Start of the token at `cursor`, or the end of the last token.
    fn offset_at(&self, cursor: usize) -> u32 {
        match self.tokens.get(cursor) {
            Some(token) => token.start(),
            None => self.tokens.last().map_or(0, |t| t.span().end),
        }
    }

    fn fresh_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Apply precedence and associativity between a possible shift and the
/// candidate reductions.
///
/// Only reductions whose production and the best shift-enabling production
/// both declare a precedence take part. The lower side is dropped; on a tie
/// `Left` drops the shift, `Right` drops the reduction and `NonAssoc` keeps
/// both.
fn resolve_conflicts(
    grammar: &Grammar,
    shift: Option<Option<u16>>,
    reductions: SmallVec<[u32; 4]>,
) -> (bool, SmallVec<[u32; 4]>) {
    let Some(shift_precedence) = shift else {
        return (false, reductions);
    };
    let Some(shift_precedence) = shift_precedence else {
        return (true, reductions);
    };
    let mut keep_shift = true;
    let reductions = reductions
        .into_iter()
        .filter(|&index| {
            let Some(production) = grammar.production(index as usize) else {
                return false;
            };
            let Some(reduce_precedence) = production.precedence else {
                return true;
            };
            match reduce_precedence.cmp(&shift_precedence) {
                std::cmp::Ordering::Greater => {
                    keep_shift = false;
                    true
                }
                std::cmp::Ordering::Less => false,
                std::cmp::Ordering::Equal => match production.associativity {
                    Associativity::Left => {
                        keep_shift = false;
                        true
                    }
                    Associativity::Right => false,
                    Associativity::NonAssoc => true,
                },
            }
        })
        .collect();
    (keep_shift, reductions)
}

fn sort_best_first(paths: &mut [ParsePath]) {
    paths.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.id.cmp(&b.id)));
}

#[cfg(test)]
mod tests;
