//! Pattern → ENFA construction.
//!
//! Single left-to-right pass over the disambiguated [`ParsedState`] stream
//! with an explicit frame stack; no pattern AST is built.
//!
//! - Atoms become one transition between two fresh states.
//! - `(` saves the current concatenation in a [`Frame::Group`]; `)` links
//!   the inner concatenation, unwinds pending alternations and wraps the
//!   result in grouping start/end transitions.
//! - `|` links the current concatenation as the left branch of a
//!   [`Frame::Alt`]; branches rejoin at a shared accept state.
//! - A quantifier rewrites the most recent fragment in place. Bounded
//!   repetition expands to cloned copies.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tangle_ir::View;
use tangle_lexer_core::{
    lex_pattern, Anchor, ClassEscape, ClassItem, ClassSet, GroupKind, ParsedState, PatternKind,
    Quantifier,
};

use crate::automaton::{CompileOptions, Enfa};
use crate::error::{BuildError, BuildErrorKind};
use crate::state::{
    CharSet, GroupInfo, PropertyRef, State, StateId, StateKind, Transition, TransitionKind,
};


/// Entry and exit of a partially built sub-automaton. `accept` has no
/// outgoing transitions until the fragment is linked.
#[derive(Copy, Clone, Debug)]
struct Fragment {
    start: StateId,
    accept: StateId,
}

/// What a `(` opened.
#[derive(Copy, Clone, Debug)]
enum Opened {
    Group(u32),
    Lookahead { index: u32, negated: bool },
    Lookbehind { index: u32, negated: bool },
}

enum Frame {
    /// Left branch done, right branch in progress.
    Alt {
        alt_start: StateId,
        alt_accept: StateId,
        left: Fragment,
    },
    /// Concatenation outside the group, restored at `)`.
    Group {
        outer: Vec<Fragment>,
        opened: Opened,
        position: u32,
    },
}

pub(crate) fn compile(
    terminal: &str,
    pattern: &str,
    options: &CompileOptions,
) -> Result<Enfa, BuildError> {
    let terminal: Arc<str> = Arc::from(terminal);
    let view = View::from_str_bytes(pattern);
    let parsed = lex_pattern(view, options.strategy).map_err(|err| {
        let position = err.position().unwrap_or(0);
        BuildError {
            terminal: Arc::clone(&terminal),
            matched: prefix(pattern, position),
            position,
            kind: BuildErrorKind::Lex(err),
        }
    })?;

    let mut builder = Builder::new(options);
    match builder.run(&parsed) {
        Ok(fragment) => {
            let enfa = builder.finish(Arc::clone(&terminal), pattern, fragment);
            tracing::debug!(
                terminal = %terminal,
                states = enfa.len(),
                captures = enfa.capture_count(),
                "pattern compiled"
            );
            Ok(enfa)
        }
        Err((position, kind)) => Err(BuildError {
            terminal,
            matched: prefix(pattern, position),
            position,
            kind,
        }),
    }
}

fn prefix(pattern: &str, position: u32) -> String {
    let bytes = pattern.as_bytes();
    let end = (position as usize).min(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

type Failure = (u32, BuildErrorKind);

struct Builder<'o> {
    options: &'o CompileOptions,
    states: Vec<State>,
    groups: Vec<GroupInfo>,
    capture_count: u32,
    lookaheads: u32,
    lookbehinds: u32,
    /// Numbered back-references, checked once every group is known.
    back_references: Vec<(u32, u32)>,
}

impl<'o> Builder<'o> {
    fn new(options: &'o CompileOptions) -> Self {
        Builder {
            options,
            states: Vec::with_capacity(16),
            groups: Vec::new(),
            capture_count: 0,
            lookaheads: 0,
            lookbehinds: 0,
            back_references: Vec::new(),
        }
    }

    fn run(&mut self, parsed: &[ParsedState<'_>]) -> Result<Fragment, Failure> {
        let mut stack: Vec<Frame> = Vec::with_capacity(8);
        let mut current: Vec<Fragment> = Vec::with_capacity(4);
        // The last fragment in `current` may take a quantifier.
        let mut repeatable = false;

        for state in parsed {
            let position = state.start;
            match &state.kind {
                PatternKind::Alternation => {
                    let left = self.link_concat(&mut current);
                    let alt_start = self.add_state();
                    let alt_accept = self.add_state();
                    stack.push(Frame::Alt {
                        alt_start,
                        alt_accept,
                        left,
                    });
                    repeatable = false;
                }
                PatternKind::GroupOpen(kind) => {
                    let opened = self.open_group(kind);
                    stack.push(Frame::Group {
                        outer: std::mem::take(&mut current),
                        opened,
                        position,
                    });
                    repeatable = false;
                }
                PatternKind::GroupClose => {
                    let mut result = self.link_concat(&mut current);
                    loop {
                        match stack.pop() {
                            Some(Frame::Alt {
                                alt_start,
                                alt_accept,
                                left,
                            }) => {
                                result = self.join_alternatives(alt_start, alt_accept, left, result);
                            }
                            Some(Frame::Group { outer, opened, .. }) => {
                                let wrapped = self.close_group(opened, result);
                                current = outer;
                                current.push(wrapped);
                                break;
                            }
                            None => return Err((position, BuildErrorKind::UnmatchedGroupEnd)),
                        }
                    }
                    repeatable = true;
                }
                PatternKind::Quantifier(quantifier) => {
                    self.check_quantifier(*quantifier).map_err(|kind| (position, kind))?;
                    let last = match current.pop() {
                        Some(last) if repeatable => last,
                        _ => return Err((position, BuildErrorKind::NothingToRepeat)),
                    };
                    let repeated = self.apply_quantifier(last, *quantifier);
                    current.push(repeated);
                    repeatable = false;
                }
                PatternKind::Anchor(anchor) => {
                    let kind = match anchor {
                        Anchor::Start => TransitionKind::StartAnchor,
                        Anchor::End => TransitionKind::EndAnchor,
                        Anchor::WordBoundary => TransitionKind::WordBoundary,
                        Anchor::NotWordBoundary => TransitionKind::NotWordBoundary,
                    };
                    current.push(self.single(kind));
                    repeatable = false;
                }
                other => {
                    let kind = self.atom(other).map_err(|kind| (position, kind))?;
                    if let TransitionKind::BackReference(number) = kind {
                        self.back_references.push((number, position));
                    }
                    current.push(self.single(kind));
                    repeatable = true;
                }
            }
        }

        let mut result = self.link_concat(&mut current);
        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Alt {
                    alt_start,
                    alt_accept,
                    left,
                } => {
                    result = self.join_alternatives(alt_start, alt_accept, left, result);
                }
                Frame::Group { position, .. } => {
                    return Err((position, BuildErrorKind::UnclosedGroup));
                }
            }
        }

        for &(number, position) in &self.back_references {
            if number == 0 || number > self.capture_count {
                return Err((position, BuildErrorKind::InvalidBackReference));
            }
        }
        Ok(result)
    }

    fn finish(mut self, terminal: Arc<str>, pattern: &str, fragment: Fragment) -> Enfa {
        let accept = self.add_state();
        self.states[accept.index()].kind = StateKind::Accepting;
        self.add_epsilon(fragment.accept, accept);

        for state in &mut self.states {
            if state.transitions.is_empty() && state.kind == StateKind::Transition {
                state.kind = StateKind::Error;
            }
        }

        Enfa {
            terminal,
            pattern: Arc::from(pattern),
            start: fragment.start,
            accept,
            states: self.states,
            groups: self.groups,
            capture_count: self.capture_count,
            has_back_references: !self.back_references.is_empty(),
            max_lookbehind: self.options.max_lookbehind,
        }
    }

    // ─── Atoms ───

    fn atom(&self, kind: &PatternKind) -> Result<TransitionKind, BuildErrorKind> {
        Ok(match kind {
            PatternKind::Literal(c) => TransitionKind::Literal(*c),
            PatternKind::Any => TransitionKind::Any,
            PatternKind::Escape(escape) => escape_transition(*escape),
            PatternKind::Class(set) => class_transition(set)?,
            PatternKind::BackReference(number) => TransitionKind::BackReference(*number),
            PatternKind::NamedBackReference(name) => {
                let number = self
                    .groups
                    .iter()
                    .find(|group| group.name.as_deref() == Some(&**name))
                    .and_then(|group| group.capture)
                    .ok_or(BuildErrorKind::InvalidBackReference)?;
                TransitionKind::BackReference(number)
            }
            PatternKind::Property { name, negated } => {
                if *negated {
                    TransitionKind::NegatedProperty(Arc::clone(name))
                } else {
                    TransitionKind::Property(Arc::clone(name))
                }
            }
            PatternKind::CodePoint(value) => {
                TransitionKind::CodePoint(scalar(*value)?)
            }
            PatternKind::Control(code) => TransitionKind::Control(*code),
            PatternKind::Unsupported(what) => {
                return Err(BuildErrorKind::UnsupportedConstruct(*what))
            }
            // Structural kinds are handled by `run`.
            PatternKind::Anchor(_)
            | PatternKind::GroupOpen(_)
            | PatternKind::GroupClose
            | PatternKind::Alternation
            | PatternKind::Quantifier(_) => {
                return Err(BuildErrorKind::UnsupportedConstruct(kind.label()))
            }
        })
    }

    fn single(&mut self, kind: TransitionKind) -> Fragment {
        let start = self.add_state();
        let accept = self.add_state();
        self.add_transition(start, kind, accept);
        Fragment { start, accept }
    }

    // ─── Groups ───

    fn open_group(&mut self, kind: &GroupKind) -> Opened {
        match kind {
            GroupKind::Capture | GroupKind::Named(_) | GroupKind::NonCapture => {
                let capture = if kind.is_capturing() {
                    self.capture_count += 1;
                    Some(self.capture_count)
                } else {
                    None
                };
                let name = match kind {
                    GroupKind::Named(name) => Some(Arc::clone(name)),
                    _ => None,
                };
                let index = self.groups.len() as u32;
                self.groups.push(GroupInfo { capture, name });
                Opened::Group(index)
            }
            GroupKind::Lookahead | GroupKind::NegativeLookahead => {
                let index = self.lookaheads;
                self.lookaheads += 1;
                Opened::Lookahead {
                    index,
                    negated: matches!(kind, GroupKind::NegativeLookahead),
                }
            }
            GroupKind::Lookbehind | GroupKind::NegativeLookbehind => {
                let index = self.lookbehinds;
                self.lookbehinds += 1;
                Opened::Lookbehind {
                    index,
                    negated: matches!(kind, GroupKind::NegativeLookbehind),
                }
            }
        }
    }

    fn close_group(&mut self, opened: Opened, inner: Fragment) -> Fragment {
        match opened {
            Opened::Group(index) => {
                let start = self.add_state();
                let accept = self.add_state();
                self.add_transition(start, TransitionKind::GroupStart(index), inner.start);
                self.add_transition(inner.accept, TransitionKind::GroupEnd(index), accept);
                Fragment { start, accept }
            }
            Opened::Lookahead { index, negated } => self.lookaround(
                inner,
                negated,
                |resume| TransitionKind::LookaheadStart {
                    index,
                    negated,
                    resume,
                },
                TransitionKind::LookaheadEnd(index),
            ),
            Opened::Lookbehind { index, negated } => self.lookaround(
                inner,
                negated,
                |resume| TransitionKind::LookbehindStart {
                    index,
                    negated,
                    resume,
                },
                TransitionKind::LookbehindEnd(index),
            ),
        }
    }

    /// `start --Look*Start--> entry -ε-> body -ε-> final --Look*End--> resume`.
    ///
    /// The main path jumps from `start` straight to `resume` when the body
    /// check passes; the body is only walked by the nested simulation.
    fn lookaround(
        &mut self,
        inner: Fragment,
        negated: bool,
        start_kind: impl FnOnce(StateId) -> TransitionKind,
        end_kind: TransitionKind,
    ) -> Fragment {
        let start = self.add_state();
        let entry = self.add_state();
        let body_final = self.add_state();
        let resume = self.add_state();
        self.states[entry.index()].kind = StateKind::NotApplicable;
        self.states[body_final.index()].kind = if negated {
            StateKind::Negating
        } else {
            StateKind::Accepting
        };
        self.add_transition(start, start_kind(resume), entry);
        self.add_epsilon(entry, inner.start);
        self.add_epsilon(inner.accept, body_final);
        self.add_transition(body_final, end_kind, resume);
        Fragment {
            start,
            accept: resume,
        }
    }

    fn join_alternatives(
        &mut self,
        alt_start: StateId,
        alt_accept: StateId,
        left: Fragment,
        right: Fragment,
    ) -> Fragment {
        self.add_epsilon(alt_start, left.start);
        self.add_epsilon(alt_start, right.start);
        self.add_epsilon(left.accept, alt_accept);
        self.add_epsilon(right.accept, alt_accept);
        Fragment {
            start: alt_start,
            accept: alt_accept,
        }
    }

    fn link_concat(&mut self, fragments: &mut Vec<Fragment>) -> Fragment {
        let mut parts = std::mem::take(fragments).into_iter();
        let Some(mut result) = parts.next() else {
            let s = self.add_state();
            return Fragment {
                start: s,
                accept: s,
            };
        };
        for next in parts {
            self.add_epsilon(result.accept, next.start);
            result.accept = next.accept;
        }
        result
    }

    // ─── Repetition ───

    fn check_quantifier(&self, q: Quantifier) -> Result<(), BuildErrorKind> {
        if let Some(max) = q.max {
            if q.min > max {
                return Err(BuildErrorKind::MalformedRepetition);
            }
        }
        let bound = q.max.unwrap_or(q.min).max(q.min);
        let limit = self.options.max_repeat;
        if bound > limit {
            return Err(BuildErrorKind::RepetitionTooLarge { bound, limit });
        }
        Ok(())
    }

    fn apply_quantifier(&mut self, frag: Fragment, q: Quantifier) -> Fragment {
        match (q.min, q.max) {
            (0, None) => self.star(frag, q.lazy),
            (1, None) => self.plus(frag, q.lazy),
            (0, Some(1)) => self.optional(frag, q.lazy),
            (min, max) => self.bounded(frag, min, max, q.lazy),
        }
    }

    /// Push `(first, second)` epsilons, swapped when `lazy`.
    fn fork(&mut self, from: StateId, stay: StateId, leave: StateId, lazy: bool) {
        if lazy {
            self.add_epsilon(from, leave);
            self.add_epsilon(from, stay);
        } else {
            self.add_epsilon(from, stay);
            self.add_epsilon(from, leave);
        }
    }

    fn star(&mut self, frag: Fragment, lazy: bool) -> Fragment {
        let start = self.add_state();
        let accept = self.add_state();
        self.fork(start, frag.start, accept, lazy);
        self.fork(frag.accept, frag.start, accept, lazy);
        Fragment { start, accept }
    }

    fn plus(&mut self, frag: Fragment, lazy: bool) -> Fragment {
        let start = self.add_state();
        let accept = self.add_state();
        self.add_epsilon(start, frag.start);
        self.fork(frag.accept, frag.start, accept, lazy);
        Fragment { start, accept }
    }

    fn optional(&mut self, frag: Fragment, lazy: bool) -> Fragment {
        let start = self.add_state();
        let accept = self.add_state();
        self.fork(start, frag.start, accept, lazy);
        self.add_epsilon(frag.accept, accept);
        Fragment { start, accept }
    }

    /// `min` mandatory copies followed by a star (`{n,}`) or by `max - min`
    /// optional copies. The original fragment serves as the first copy.
    fn bounded(&mut self, frag: Fragment, min: u32, max: Option<u32>, lazy: bool) -> Fragment {
        let optional = match max {
            None => 1,
            Some(max) => max - min,
        };
        let total = (min + optional) as usize;
        if total == 0 {
            let s = self.add_state();
            return Fragment {
                start: s,
                accept: s,
            };
        }

        // Clone before any copy gains loop edges.
        let mut copies = Vec::with_capacity(total);
        copies.push(frag);
        for _ in 1..total {
            let copy = self.clone_fragment(frag);
            copies.push(copy);
        }

        let mut linked = Vec::with_capacity(total);
        for (i, copy) in copies.into_iter().enumerate() {
            let part = if i < min as usize {
                copy
            } else if max.is_none() {
                self.star(copy, lazy)
            } else {
                self.optional(copy, lazy)
            };
            linked.push(part);
        }
        self.link_concat(&mut linked)
    }

    /// Fresh copy of every state reachable from `frag.start`.
    fn clone_fragment(&mut self, frag: Fragment) -> Fragment {
        let mut order = Vec::new();
        let mut seen = FxHashSet::default();
        let mut queue = vec![frag.start];
        seen.insert(frag.start);
        while let Some(id) = queue.pop() {
            order.push(id);
            for transition in &self.states[id.index()].transitions {
                let mut targets = SmallVec::<[StateId; 2]>::new();
                targets.push(transition.target);
                if let TransitionKind::LookaheadStart { resume, .. }
                | TransitionKind::LookbehindStart { resume, .. } = transition.kind
                {
                    targets.push(resume);
                }
                for target in targets {
                    if seen.insert(target) {
                        queue.push(target);
                    }
                }
            }
        }

        let mut mapping: FxHashMap<StateId, StateId> = FxHashMap::default();
        for &old in &order {
            let new = self.add_state();
            self.states[new.index()].kind = self.states[old.index()].kind;
            mapping.insert(old, new);
        }
        let remap = |id: StateId| mapping.get(&id).copied().unwrap_or(id);
        for &old in &order {
            let new = remap(old);
            let mut transitions = self.states[old.index()].transitions.clone();
            for transition in &mut transitions {
                transition.target = remap(transition.target);
                transition.kind.remap(remap);
            }
            self.states[new.index()].transitions = transitions;
        }

        Fragment {
            start: remap(frag.start),
            accept: remap(frag.accept),
        }
    }

    // ─── Arena ───

    fn add_state(&mut self) -> StateId {
        let id = StateId::new(self.states.len() as u32);
        self.states.push(State::new());
        id
    }

    fn add_transition(&mut self, from: StateId, kind: TransitionKind, target: StateId) {
        self.states[from.index()]
            .transitions
            .push(Transition { kind, target });
    }

    fn add_epsilon(&mut self, from: StateId, target: StateId) {
        self.add_transition(from, TransitionKind::Epsilon, target);
    }
}

fn scalar(value: u32) -> Result<char, BuildErrorKind> {
    char::from_u32(value).ok_or(BuildErrorKind::InvalidCodePoint(value))
}

fn escape_transition(escape: ClassEscape) -> TransitionKind {
    match escape {
        ClassEscape::Digit => TransitionKind::Digit,
        ClassEscape::NotDigit => TransitionKind::NotDigit,
        ClassEscape::Word => TransitionKind::Word,
        ClassEscape::NotWord => TransitionKind::NotWord,
        ClassEscape::Space => TransitionKind::Space,
        ClassEscape::NotSpace => TransitionKind::NotSpace,
    }
}

fn negate_escape(escape: ClassEscape) -> ClassEscape {
    match escape {
        ClassEscape::Digit => ClassEscape::NotDigit,
        ClassEscape::NotDigit => ClassEscape::Digit,
        ClassEscape::Word => ClassEscape::NotWord,
        ClassEscape::NotWord => ClassEscape::Word,
        ClassEscape::Space => ClassEscape::NotSpace,
        ClassEscape::NotSpace => ClassEscape::Space,
    }
}

/// Lower a bracketed class. One-item classes collapse to the matching
/// single-purpose transition.
fn class_transition(set: &ClassSet) -> Result<TransitionKind, BuildErrorKind> {
    if set.items.is_empty() && !set.negated {
        return Err(BuildErrorKind::EmptyClass);
    }

    if let [item] = set.items.as_slice() {
        let negated = set.negated;
        return Ok(match item {
            ClassItem::Single(value) => {
                let c = scalar(*value)?;
                if negated {
                    TransitionKind::NegatedLiteral(c)
                } else {
                    TransitionKind::Literal(c)
                }
            }
            ClassItem::Escape(escape) => {
                let escape = if negated { negate_escape(*escape) } else { *escape };
                escape_transition(escape)
            }
            ClassItem::Property { name, negated: inner } => {
                if negated == *inner {
                    TransitionKind::Property(Arc::clone(name))
                } else {
                    TransitionKind::NegatedProperty(Arc::clone(name))
                }
            }
            ClassItem::Posix { name, negated: inner } => TransitionKind::Posix(PropertyRef {
                name: Arc::clone(name),
                negated: negated != *inner,
            }),
            ClassItem::Range(..) => lower_set(set)?,
        });
    }
    lower_set(set)
}

fn lower_set(set: &ClassSet) -> Result<TransitionKind, BuildErrorKind> {
    let mut chars = CharSet::default();
    for item in &set.items {
        match item {
            ClassItem::Single(value) => {
                let c = scalar(*value)?;
                chars.ranges.push((c, c));
            }
            ClassItem::Range(lo, hi) => {
                let (lo, hi) = (scalar(*lo)?, scalar(*hi)?);
                if lo > hi {
                    return Err(BuildErrorKind::InvalidClassRange);
                }
                chars.ranges.push((lo, hi));
            }
            ClassItem::Escape(escape) => chars.escapes.push(*escape),
            ClassItem::Property { name, negated } => chars.properties.push(PropertyRef {
                name: Arc::clone(name),
                negated: *negated,
            }),
            ClassItem::Posix { name, negated } => chars.posix.push(PropertyRef {
                name: Arc::clone(name),
                negated: *negated,
            }),
        }
    }
    let chars = Arc::new(chars);
    Ok(if set.negated {
        TransitionKind::NegatedClass(chars)
    } else {
        TransitionKind::Class(chars)
    })
}
