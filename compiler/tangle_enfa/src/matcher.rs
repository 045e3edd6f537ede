//! ENFA simulation.
//!
//! A priority-ordered thread simulation (Pike VM). Threads advance in
//! lock-step over the input; at each position every state is visited at
//! most once, so matching is linear in `text.len() * states` and never
//! backtracks.
//!
//! Priority is the order of a state's transitions. The epsilon closure is a
//! depth-first walk that visits the first transition's subtree before the
//! second's, so the thread list at every position is ordered from most to
//! least preferred. Leftmost-first matching cuts the list at the first
//! accepting thread.
//!
//! Two extensions break strict lock-step:
//! - Back-references consume the captured text in one step, so threads can
//!   land several bytes ahead. Thread lists are keyed by position.
//! - Lookarounds run a nested simulation of their body from the current
//!   position (forwards) or from each candidate start behind it.

use std::collections::BTreeMap;
use std::ops::Range;

use rustc_hash::FxHashSet;

use crate::automaton::Enfa;
use crate::property::PropertyProvider;
use crate::state::{CharSet, PropertyRef, StateId, TransitionKind};
use tangle_lexer_core::ClassEscape;


/// Result of a successful match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Match {
    pub start: usize,
    pub end: usize,
    captures: Vec<Option<Range<usize>>>,
}

impl Match {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Byte range of capture group `n` (1-based). `None` if the group did
    /// not take part in the match.
    pub fn capture(&self, n: u32) -> Option<Range<usize>> {
        let index = (n as usize).checked_sub(1)?;
        self.captures.get(index).cloned().flatten()
    }

    pub fn captures(&self) -> &[Option<Range<usize>>] {
        &self.captures
    }
}

/// Capture slots: `2n` is the start and `2n + 1` the end of group `n`.
/// Slot pair 0 is the whole match.
type Slots = Vec<Option<usize>>;

/// What ends a simulation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Goal {
    Accept,
    LookaheadEnd(u32),
    LookbehindEnd(u32),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Mode {
    /// Highest-priority match; lower-priority threads are cut.
    Leftmost,
    /// Furthest end; ties keep the higher-priority thread.
    Longest,
    /// Any goal at any position.
    AnyEnd,
    /// Goal exactly at this position.
    EndsAt(usize),
}

struct Thread {
    state: StateId,
    slots: Slots,
}

#[derive(Default)]
struct ThreadList {
    threads: Vec<Thread>,
    seen: FxHashSet<StateId>,
    seen_with_slots: FxHashSet<(StateId, Slots)>,
}

impl ThreadList {
    /// First visit of `state` at this position? With back-references two
    /// threads in the same state can still diverge, so captures count too.
    fn mark(&mut self, state: StateId, slots: &Slots, by_slots: bool) -> bool {
        if by_slots {
            self.seen_with_slots.insert((state, slots.clone()))
        } else {
            self.seen.insert(state)
        }
    }
}

/// Runs one [`Enfa`] against byte input.
///
/// Input is decoded as UTF-8 on the fly; a malformed byte reads as U+FFFD
/// and advances by one.
#[derive(Copy, Clone)]
pub struct Matcher<'e> {
    enfa: &'e Enfa,
    provider: &'e dyn PropertyProvider,
}

impl<'e> Matcher<'e> {
    pub fn new(enfa: &'e Enfa, provider: &'e dyn PropertyProvider) -> Self {
        Matcher { enfa, provider }
    }

    pub fn accepts(&self, text: &[u8]) -> bool {
        let end = text.len();
        self.run(
            self.enfa.start,
            text,
            0,
            Goal::Accept,
            Mode::EndsAt(end),
            self.seed(),
        )
        .is_some()
    }

    pub fn match_at(&self, text: &[u8], pos: usize) -> Option<Match> {
        self.anchored(text, pos, Mode::Leftmost)
    }

    pub fn longest_match_at(&self, text: &[u8], pos: usize) -> Option<Match> {
        self.anchored(text, pos, Mode::Longest)
    }

    /// Leftmost match, trying each scalar boundary in turn.
    pub fn find(&self, text: &[u8]) -> Option<Match> {
        (0..=text.len())
            .filter(|&pos| is_boundary(text, pos))
            .find_map(|pos| self.match_at(text, pos))
    }

    fn anchored(&self, text: &[u8], pos: usize, mode: Mode) -> Option<Match> {
        if pos > text.len() {
            return None;
        }
        let mut seed = self.seed();
        seed[0] = Some(pos);
        let (end, slots) = self.run(self.enfa.start, text, pos, Goal::Accept, mode, seed)?;
        let captures = (1..=self.enfa.capture_count as usize)
            .map(|n| match (slots[2 * n], slots[2 * n + 1]) {
                (Some(s), Some(e)) if s <= e => Some(s..e),
                _ => None,
            })
            .collect();
        Some(Match {
            start: pos,
            end,
            captures,
        })
    }

    fn seed(&self) -> Slots {
        vec![None; 2 * (self.enfa.capture_count as usize + 1)]
    }

    // ─── Simulation ───

    fn run(
        &self,
        entry: StateId,
        text: &[u8],
        start: usize,
        goal: Goal,
        mode: Mode,
        seed: Slots,
    ) -> Option<(usize, Slots)> {
        let mut lists: BTreeMap<usize, ThreadList> = BTreeMap::new();
        let mut first = ThreadList::default();
        self.add_thread(&mut first, entry, text, start, seed);
        lists.insert(start, first);

        let mut best: Option<(usize, Slots)> = None;
        while let Some((pos, list)) = lists.pop_first() {
            if let Mode::EndsAt(end) = mode {
                if pos > end {
                    break;
                }
            }
            let decoded = decode(text, pos);
            for thread in list.threads {
                if self.is_goal(thread.state, goal) {
                    match mode {
                        Mode::Leftmost => {
                            best = Some((pos, thread.slots));
                            break;
                        }
                        Mode::Longest => {
                            if !best.as_ref().is_some_and(|(end, _)| pos <= *end) {
                                best = Some((pos, thread.slots));
                            }
                            continue;
                        }
                        Mode::AnyEnd => return Some((pos, thread.slots)),
                        Mode::EndsAt(end) => {
                            if pos == end {
                                return Some((pos, thread.slots));
                            }
                            continue;
                        }
                    }
                }
                for transition in &self.enfa.states[thread.state.index()].transitions {
                    let Some(width) =
                        self.consume(&transition.kind, text, pos, decoded, &thread.slots)
                    else {
                        continue;
                    };
                    let next = pos + width;
                    if matches!(mode, Mode::EndsAt(end) if next > end) {
                        continue;
                    }
                    let list = lists.entry(next).or_default();
                    self.add_thread(list, transition.target, text, next, thread.slots.clone());
                }
            }
        }
        best
    }

    /// Add `state` and its zero-width closure at `pos`, in priority order.
    fn add_thread(
        &self,
        list: &mut ThreadList,
        state: StateId,
        text: &[u8],
        pos: usize,
        slots: Slots,
    ) {
        let by_slots = self.enfa.has_back_references;
        let mut stack = vec![(state, slots)];
        while let Some((id, slots)) = stack.pop() {
            if !list.mark(id, &slots, by_slots) {
                continue;
            }
            for transition in self.enfa.states[id.index()].transitions.iter().rev() {
                let next = self.follow(&transition.kind, transition.target, text, pos, &slots);
                stack.extend(next);
            }
            list.threads.push(Thread { state: id, slots });
        }
    }

    fn is_goal(&self, state: StateId, goal: Goal) -> bool {
        match goal {
            Goal::Accept => state == self.enfa.accept,
            Goal::LookaheadEnd(index) => self.enfa.states[state.index()]
                .transitions
                .iter()
                .any(|t| matches!(t.kind, TransitionKind::LookaheadEnd(i) if i == index)),
            Goal::LookbehindEnd(index) => self.enfa.states[state.index()]
                .transitions
                .iter()
                .any(|t| matches!(t.kind, TransitionKind::LookbehindEnd(i) if i == index)),
        }
    }

    /// Zero-width step. Returns the next state and its slots, or `None` if
    /// the transition is consuming or its condition fails.
    fn follow(
        &self,
        kind: &TransitionKind,
        target: StateId,
        text: &[u8],
        pos: usize,
        slots: &Slots,
    ) -> Option<(StateId, Slots)> {
        let pass = match kind {
            TransitionKind::Epsilon => true,
            TransitionKind::StartAnchor => pos == 0,
            TransitionKind::EndAnchor => pos == text.len(),
            TransitionKind::WordBoundary => at_word_boundary(text, pos),
            TransitionKind::NotWordBoundary => !at_word_boundary(text, pos),
            TransitionKind::GroupStart(group) | TransitionKind::GroupEnd(group) => {
                let mut next = slots.clone();
                let capture = self
                    .enfa
                    .groups
                    .get(*group as usize)
                    .and_then(|g| g.capture);
                if let Some(n) = capture {
                    let is_end = matches!(kind, TransitionKind::GroupEnd(_));
                    next[2 * n as usize + usize::from(is_end)] = Some(pos);
                }
                return Some((target, next));
            }
            TransitionKind::LookaheadStart {
                index,
                negated,
                resume,
            } => {
                let hit = self
                    .run(
                        target,
                        text,
                        pos,
                        Goal::LookaheadEnd(*index),
                        Mode::AnyEnd,
                        slots.clone(),
                    )
                    .is_some();
                return (hit != *negated).then(|| (*resume, slots.clone()));
            }
            TransitionKind::LookbehindStart {
                index,
                negated,
                resume,
            } => {
                let hit = self.look_behind(target, text, pos, *index, slots);
                return (hit != *negated).then(|| (*resume, slots.clone()));
            }
            // An unset or empty capture matches the empty string.
            TransitionKind::BackReference(n) => {
                match captured(slots, *n, text) {
                    Some(bytes) => bytes.is_empty(),
                    None => true,
                }
            }
            _ => false,
        };
        pass.then(|| (target, slots.clone()))
    }

    /// Does the lookbehind body match some `text[q..pos]`?
    fn look_behind(
        &self,
        entry: StateId,
        text: &[u8],
        pos: usize,
        index: u32,
        slots: &Slots,
    ) -> bool {
        let floor = pos.saturating_sub(self.enfa.max_lookbehind);
        (floor..=pos)
            .rev()
            .filter(|&q| is_boundary(text, q))
            .any(|q| {
                self.run(
                    entry,
                    text,
                    q,
                    Goal::LookbehindEnd(index),
                    Mode::EndsAt(pos),
                    slots.clone(),
                )
                .is_some()
            })
    }

    /// Consuming step. Returns the number of bytes consumed.
    fn consume(
        &self,
        kind: &TransitionKind,
        text: &[u8],
        pos: usize,
        decoded: Option<(char, usize)>,
        slots: &Slots,
    ) -> Option<usize> {
        if let TransitionKind::BackReference(n) = kind {
            let bytes = captured(slots, *n, text)?;
            let rest = text.get(pos..)?;
            return (!bytes.is_empty() && rest.starts_with(bytes)).then_some(bytes.len());
        }
        let (c, width) = decoded?;
        let hit = match kind {
            TransitionKind::Literal(x) | TransitionKind::CodePoint(x) => c == *x,
            TransitionKind::NegatedLiteral(x) => c != *x,
            TransitionKind::Any => c != '\n',
            TransitionKind::Class(set) => self.class_contains(set, c),
            TransitionKind::NegatedClass(set) => !self.class_contains(set, c),
            TransitionKind::Digit => escape_hit(ClassEscape::Digit, c),
            TransitionKind::NotDigit => escape_hit(ClassEscape::NotDigit, c),
            TransitionKind::Word => escape_hit(ClassEscape::Word, c),
            TransitionKind::NotWord => escape_hit(ClassEscape::NotWord, c),
            TransitionKind::Space => escape_hit(ClassEscape::Space, c),
            TransitionKind::NotSpace => escape_hit(ClassEscape::NotSpace, c),
            TransitionKind::Property(name) => self.provider.has_property(name, c) == Some(true),
            TransitionKind::NegatedProperty(name) => {
                self.provider.has_property(name, c) == Some(false)
            }
            TransitionKind::Posix(property) => self.property_hit(property, c),
            TransitionKind::Control(code) => u32::from(c) == u32::from(*code),
            _ => false,
        };
        hit.then_some(width)
    }

    fn class_contains(&self, set: &CharSet, c: char) -> bool {
        set.ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi)
            || set.escapes.iter().any(|&e| escape_hit(e, c))
            || set.properties.iter().any(|p| self.property_hit(p, c))
            || set.posix.iter().any(|p| self.property_hit(p, c))
    }

    fn property_hit(&self, property: &PropertyRef, c: char) -> bool {
        self.provider
            .has_property(&property.name, c)
            .is_some_and(|has| has != property.negated)
    }
}

// ─── Character helpers ───

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn escape_hit(escape: ClassEscape, c: char) -> bool {
    match escape {
        ClassEscape::Digit => c.is_ascii_digit(),
        ClassEscape::NotDigit => !c.is_ascii_digit(),
        ClassEscape::Word => is_word_char(c),
        ClassEscape::NotWord => !is_word_char(c),
        ClassEscape::Space => c.is_whitespace(),
        ClassEscape::NotSpace => !c.is_whitespace(),
    }
}

fn captured<'t>(slots: &Slots, n: u32, text: &'t [u8]) -> Option<&'t [u8]> {
    let base = 2 * n as usize;
    match (slots.get(base).copied()?, slots.get(base + 1).copied()?) {
        (Some(start), Some(end)) if start <= end => text.get(start..end),
        _ => None,
    }
}

fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

/// Is `pos` the start of a scalar (or the end of input)?
fn is_boundary(text: &[u8], pos: usize) -> bool {
    text.get(pos).map_or(pos == text.len(), |&b| !is_continuation(b))
}

/// Scalar at `pos` and its width in bytes.
fn decode(text: &[u8], pos: usize) -> Option<(char, usize)> {
    let lead = *text.get(pos)?;
    let width = match lead {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 1,
    };
    let decoded = text
        .get(pos..pos + width)
        .and_then(|bytes| std::str::from_utf8(bytes).ok())
        .and_then(|s| s.chars().next());
    Some(decoded.map_or((char::REPLACEMENT_CHARACTER, 1), |c| (c, width)))
}

/// Scalar ending at `pos`.
fn decode_before(text: &[u8], pos: usize) -> Option<char> {
    let floor = pos.saturating_sub(4);
    let start = (floor..pos).rev().find(|&q| is_boundary(text, q))?;
    decode(text, start).map(|(c, _)| c)
}

fn at_word_boundary(text: &[u8], pos: usize) -> bool {
    let before = decode_before(text, pos).is_some_and(is_word_char);
    let after = decode(text, pos).is_some_and(|(c, _)| is_word_char(c));
    before != after
}
