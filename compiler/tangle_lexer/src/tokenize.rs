//! Path-parallel scanning.
//!
//! Every live path tries every applicable rule at its own position. A path
//! with several candidates forks once per candidate; a path with none dies.
//! After each step, paths sharing (position, context stack, token-type
//! signature) are merged and the survivors are capped at `max_paths`.
//!
//! A path whose position reaches the end of input is complete. The best
//! completed stream becomes the output; the rest are reported as
//! alternatives and the tokens they disagree on are flagged
//! [`TokenFlags::AMBIGUOUS`].

use std::collections::hash_map::Entry;

use rustc_hash::{FxHashMap, FxHashSet};
use tangle_ir::{Name, Span, Token, TokenFlags, View};

use crate::config::LexerConfig;
use crate::error::LexError;
use crate::output::{LexOutput, LexStats};
use crate::path::{LexPath, MergeKey};
use crate::rules::{CompiledLexer, RuleMatch};

pub(crate) struct Tokenizer<'l, 'src> {
    lexer: &'l CompiledLexer,
    view: View<'src>,
    config: &'l LexerConfig,
    next_id: u32,
    stats: LexStats,
    /// The dead or abandoned path that got furthest.
    furthest: Option<LexPath<'src>>,
}

impl<'l, 'src> Tokenizer<'l, 'src> {
    pub fn new(lexer: &'l CompiledLexer, view: View<'src>, config: &'l LexerConfig) -> Self {
        Tokenizer {
            lexer,
            view,
            config,
            next_id: 1,
            stats: LexStats::default(),
            furthest: None,
        }
    }

    pub fn run(mut self) -> LexOutput<'src> {
        let len = self.view.len();
        let limit = self.config.step_limit(len);
        let mut live = vec![LexPath::root()];
        let mut completed = Vec::new();
        let mut errors = Vec::new();
        let mut stalled = 0;

        while !live.is_empty() {
            if self.stats.steps >= limit {
                let (pos, context) = self.abandon(live);
                tracing::warn!(limit, pos, "tokenizer step limit reached");
                errors.push(LexError::step_limit(self.absolute(pos), limit, context));
                break;
            }
            self.stats.steps += 1;

            let mut next = Vec::with_capacity(live.len());
            let mut progressed = false;
            for path in live {
                if path.pos >= len {
                    completed.push(path);
                    continue;
                }
                progressed |= self.step(path, &mut next);
            }

            let next = self.merge(next);
            let next = self.prune(next);
            self.stats.peak_paths = self.stats.peak_paths.max(next.len());
            tracing::trace!(step = self.stats.steps, paths = next.len(), "lexer step");

            if progressed || next.is_empty() {
                stalled = 0;
            } else {
                stalled += 1;
                if stalled >= self.config.stall_limit {
                    let (pos, context) = self.abandon(next);
                    tracing::warn!(steps = stalled, pos, "tokenizer made no progress");
                    errors.push(LexError::no_progress(self.absolute(pos), stalled, context));
                    break;
                }
            }
            live = next;
        }

        self.finish(completed, errors)
    }

    /// Advance one path by one token. Returns whether it moved forward.
    fn step(&mut self, path: LexPath<'src>, next: &mut Vec<LexPath<'src>>) -> bool {
        let candidates = self.lexer.matches_at(
            self.view.as_bytes(),
            path.pos,
            &path.contexts,
            self.config.context_match,
        );
        let Some((first, rest)) = candidates.split_first() else {
            tracing::trace!(pos = path.pos, id = path.id, "path reached a dead end");
            self.note_furthest(path);
            return false;
        };
        if !rest.is_empty() {
            tracing::trace!(pos = path.pos, candidates = candidates.len(), "path forked");
        }

        let mut progressed = false;
        for candidate in rest {
            let child = path.fork(self.fresh_id());
            progressed |= self.apply(child, *candidate, next);
        }
        progressed |= self.apply(path, *first, next);
        progressed
    }

    fn apply(
        &mut self,
        mut path: LexPath<'src>,
        candidate: RuleMatch,
        next: &mut Vec<LexPath<'src>>,
    ) -> bool {
        let Some(rule) = self.lexer.rule(candidate.rule) else {
            self.note_furthest(path);
            return false;
        };
        if path.advance(rule, candidate.len, self.view).is_err() {
            self.note_furthest(path);
            return false;
        }
        next.push(path);
        candidate.len > 0
    }

    /// Keep one representative per merge key: higher score, then lower id.
    fn merge(&mut self, paths: Vec<LexPath<'src>>) -> Vec<LexPath<'src>> {
        let mut kept: Vec<LexPath<'src>> = Vec::with_capacity(paths.len());
        let mut slots: FxHashMap<MergeKey, usize> = FxHashMap::default();
        for path in paths {
            match slots.entry(path.merge_key()) {
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

    fn prune(&mut self, mut paths: Vec<LexPath<'src>>) -> Vec<LexPath<'src>> {
        let ceiling = self.config.max_paths.max(1);
        if paths.len() > ceiling {
            paths.sort_by(|a, b| {
                b.score
                    .cmp(&a.score)
                    .then(b.pos.cmp(&a.pos))
                    .then(a.id.cmp(&b.id))
            });
            let dropped = paths.len() - ceiling;
            self.stats.pruned += dropped;
            tracing::debug!(dropped, ceiling, "pruned lexer paths");
            paths.truncate(ceiling);
        }
        paths
    }

    fn finish(mut self, completed: Vec<LexPath<'src>>, errors: Vec<LexError>) -> LexOutput<'src> {
        let mut completed = self.merge(completed);
        self.stats.completed = completed.len();
        completed.sort_by(LexPath::cmp_preference);

        let mut streams = completed.into_iter();
        let Some(best) = streams.next() else {
            return self.fail(errors);
        };
        let contexts = best.contexts;
        let mut tokens = best.tokens;
        let mut alternatives: Vec<Vec<Token<'src>>> = streams.map(|p| p.tokens).collect();
        if !alternatives.is_empty() {
            flag_disagreements(&mut tokens, &mut alternatives);
        }

        tracing::debug!(
            tokens = tokens.len(),
            alternatives = alternatives.len(),
            steps = self.stats.steps,
            merged = self.stats.merged,
            pruned = self.stats.pruned,
            "tokenize complete"
        );
        LexOutput {
            success: errors.is_empty(),
            tokens,
            alternatives,
            errors,
            contexts,
            stats: self.stats,
        }
    }

    /// No stream covered the input: report the furthest partial stream.
    fn fail(mut self, mut errors: Vec<LexError>) -> LexOutput<'src> {
        let partial = self.furthest.take().unwrap_or_else(LexPath::root);
        if errors.is_empty() {
            errors.push(LexError::no_match(
                self.absolute(partial.pos),
                partial.contexts.path(),
            ));
        }
        tracing::debug!(pos = partial.pos, steps = self.stats.steps, "tokenize failed");
        LexOutput {
            success: false,
            tokens: partial.tokens,
            alternatives: Vec::new(),
            errors,
            contexts: partial.contexts,
            stats: self.stats,
        }
    }

    /// Give up on the remaining live paths, keeping the furthest one.
    /// Returns its position and context path.
    fn abandon(&mut self, paths: Vec<LexPath<'src>>) -> (usize, String) {
        for path in paths {
            self.note_furthest(path);
        }
        self.furthest
            .as_ref()
            .map_or((0, String::new()), |p| (p.pos, p.contexts.path()))
    }

    fn note_furthest(&mut self, path: LexPath<'src>) {
        let further = match &self.furthest {
            Some(current) => path.pos > current.pos,
            None => true,
        };
        if further {
            self.furthest = Some(path);
        }
    }

    fn fresh_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn absolute(&self, pos: usize) -> u32 {
        self.view.offset() + pos as u32
    }
}

/// Flag every token that some other completed stream lacks.
fn flag_disagreements<'src>(best: &mut [Token<'src>], alternatives: &mut [Vec<Token<'src>>]) {
    let key = |t: &Token<'_>| (t.span(), t.kind);
    let sets: Vec<FxHashSet<(Span, Name)>> = std::iter::once(&*best)
        .chain(alternatives.iter().map(Vec::as_slice))
        .map(|stream| stream.iter().map(key).collect())
        .collect();

    let streams = std::iter::once(best).chain(alternatives.iter_mut().map(Vec::as_mut_slice));
    for (index, stream) in streams.enumerate() {
        for token in stream.iter_mut() {
            let k = key(&*token);
            let disputed = sets
                .iter()
                .enumerate()
                .any(|(other, set)| other != index && !set.contains(&k));
            if disputed {
                token.flags |= TokenFlags::AMBIGUOUS;
            }
        }
    }
}
