//! Compiled pattern automaton.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tangle_lexer_core::DisambiguationStrategy;

use crate::error::BuildError;
use crate::matcher::{Match, Matcher};
use crate::property::{PropertyProvider, StdPropertyProvider};
use crate::state::{GroupBalance, GroupInfo, GroupingKind, State, StateId, TransitionKind};

/// Knobs for [`Enfa::compile_with`].
#[derive(Copy, Clone, Debug)]
pub struct CompileOptions {
    /// How Phase 2 resolves ambiguous pattern tokens.
    pub strategy: DisambiguationStrategy,
    /// Largest bound accepted in `{n,m}`.
    pub max_repeat: u32,
    /// Furthest a lookbehind body may reach back, in bytes.
    pub max_lookbehind: usize,
}

impl CompileOptions {
    pub const fn new() -> Self {
        CompileOptions {
            strategy: DisambiguationStrategy::LongestMatch,
            max_repeat: 1000,
            max_lookbehind: 255,
        }
    }

    #[must_use]
    pub const fn with_strategy(mut self, strategy: DisambiguationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub const fn with_max_repeat(mut self, max_repeat: u32) -> Self {
        self.max_repeat = max_repeat;
        self
    }

    #[must_use]
    pub const fn with_max_lookbehind(mut self, bytes: usize) -> Self {
        self.max_lookbehind = bytes;
        self
    }
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self::new()
    }
}

static STD_PROPERTIES: StdPropertyProvider = StdPropertyProvider;

/// Extended NFA compiled from one pattern.
///
/// Immutable after construction and safe to share across threads; every
/// match runs its own simulation state.
#[derive(Clone, Debug)]
pub struct Enfa {
    pub(crate) terminal: Arc<str>,
    pub(crate) pattern: Arc<str>,
    pub(crate) states: Vec<State>,
    pub(crate) start: StateId,
    pub(crate) accept: StateId,
    pub(crate) groups: Vec<GroupInfo>,
    pub(crate) capture_count: u32,
    pub(crate) has_back_references: bool,
    pub(crate) max_lookbehind: usize,
}

impl Enfa {
    /// Compile `pattern` for the token rule `terminal` with default options.
    pub fn compile(terminal: &str, pattern: &str) -> Result<Enfa, BuildError> {
        crate::builder::compile(terminal, pattern, &CompileOptions::default())
    }

    pub fn compile_with(
        terminal: &str,
        pattern: &str,
        options: &CompileOptions,
    ) -> Result<Enfa, BuildError> {
        crate::builder::compile(terminal, pattern, options)
    }

    pub fn terminal(&self) -> &str {
        &self.terminal
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.index()]
    }

    pub fn start(&self) -> StateId {
        self.start
    }

    pub fn accept(&self) -> StateId {
        self.accept
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Every `(...)` group in open order, capturing or not.
    pub fn groups(&self) -> &[GroupInfo] {
        &self.groups
    }

    pub fn capture_count(&self) -> u32 {
        self.capture_count
    }

    pub fn has_back_references(&self) -> bool {
        self.has_back_references
    }

    /// Start/end transition counts for every grouping construct, ordered by
    /// kind then index. A well-formed automaton has `starts == ends` for
    /// each entry.
    pub fn group_balance(&self) -> Vec<GroupBalance> {
        let mut counts: FxHashMap<(GroupingKind, u32), (u32, u32)> = FxHashMap::default();
        for transition in self.states.iter().flat_map(|s| s.transitions.iter()) {
            let (key, is_start) = match transition.kind {
                TransitionKind::GroupStart(i) => ((GroupingKind::Group, i), true),
                TransitionKind::GroupEnd(i) => ((GroupingKind::Group, i), false),
                TransitionKind::LookaheadStart { index, .. } => {
                    ((GroupingKind::Lookahead, index), true)
                }
                TransitionKind::LookaheadEnd(i) => ((GroupingKind::Lookahead, i), false),
                TransitionKind::LookbehindStart { index, .. } => {
                    ((GroupingKind::Lookbehind, index), true)
                }
                TransitionKind::LookbehindEnd(i) => ((GroupingKind::Lookbehind, i), false),
                _ => continue,
            };
            let entry = counts.entry(key).or_default();
            if is_start {
                entry.0 += 1;
            } else {
                entry.1 += 1;
            }
        }
        let mut balance: Vec<GroupBalance> = counts
            .into_iter()
            .map(|((kind, index), (starts, ends))| GroupBalance {
                kind,
                index,
                starts,
                ends,
            })
            .collect();
        balance.sort_by_key(|b| (b.kind, b.index));
        balance
    }

    /// Matcher using [`StdPropertyProvider`].
    pub fn matcher(&self) -> Matcher<'_> {
        Matcher::new(self, &STD_PROPERTIES)
    }

    pub fn matcher_with<'e>(&'e self, provider: &'e dyn PropertyProvider) -> Matcher<'e> {
        Matcher::new(self, provider)
    }

    /// Does the pattern match the whole of `text`?
    pub fn accepts(&self, text: &(impl AsRef<[u8]> + ?Sized)) -> bool {
        self.matcher().accepts(text.as_ref())
    }

    /// Match anchored at `pos`, preferring higher-priority paths.
    pub fn match_at(&self, text: &(impl AsRef<[u8]> + ?Sized), pos: usize) -> Option<Match> {
        self.matcher().match_at(text.as_ref(), pos)
    }

    /// Longest match anchored at `pos`.
    pub fn longest_match_at(
        &self,
        text: &(impl AsRef<[u8]> + ?Sized),
        pos: usize,
    ) -> Option<Match> {
        self.matcher().longest_match_at(text.as_ref(), pos)
    }

    /// Leftmost match anywhere in `text`.
    pub fn find(&self, text: &(impl AsRef<[u8]> + ?Sized)) -> Option<Match> {
        self.matcher().find(text.as_ref())
    }
}
