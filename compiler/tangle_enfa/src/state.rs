//! ENFA states and typed transitions.
//!
//! States live in a flat arena indexed by [`StateId`]. Each state has a
//! [`StateKind`] and an ordered transition list; order is priority, so the
//! first transition of a greedy loop is the "stay" edge and the first of a
//! lazy loop is the "leave" edge.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;
use tangle_lexer_core::ClassEscape;

/// Index of a state in an [`crate::Enfa`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct StateId(u32);

impl StateId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        StateId(raw)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StateKind {
    /// Final state of the pattern, or of a positive lookaround body.
    Accepting,
    /// Final state of a negative lookaround body. Reaching it fails the
    /// assertion.
    Negating,
    /// Ordinary state with outgoing transitions.
    Transition,
    /// Dead end: no outgoing transitions and not accepting.
    Error,
    /// Entry of a lookaround body. Never on the main match path.
    NotApplicable,
}

/// Reference to a Unicode property or POSIX class by name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PropertyRef {
    pub name: Arc<str>,
    pub negated: bool,
}

/// Members of a bracketed class.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CharSet {
    /// Inclusive scalar ranges. Single characters are `(c, c)`.
    pub ranges: SmallVec<[(char, char); 4]>,
    pub escapes: SmallVec<[ClassEscape; 2]>,
    pub properties: Vec<PropertyRef>,
    pub posix: Vec<PropertyRef>,
}

/// Typed matching rule carried by a transition.
///
/// Consuming kinds advance the input by one scalar (or by the captured text
/// for back-references). All other kinds are zero-width.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    Epsilon,
    Literal(char),
    NegatedLiteral(char),
    /// `.`: any scalar except `\n`.
    Any,
    Class(Arc<CharSet>),
    NegatedClass(Arc<CharSet>),
    Digit,
    NotDigit,
    Word,
    NotWord,
    Space,
    NotSpace,
    StartAnchor,
    EndAnchor,
    WordBoundary,
    NotWordBoundary,
    /// Opens group `n` (index into [`crate::Enfa::groups`]).
    GroupStart(u32),
    GroupEnd(u32),
    /// Enters lookahead body `index`; the main path continues at `resume`.
    LookaheadStart {
        index: u32,
        negated: bool,
        resume: StateId,
    },
    LookaheadEnd(u32),
    LookbehindStart {
        index: u32,
        negated: bool,
        resume: StateId,
    },
    LookbehindEnd(u32),
    /// Consumes the text captured by group `n` (1-based capture number).
    BackReference(u32),
    Property(Arc<str>),
    NegatedProperty(Arc<str>),
    Posix(PropertyRef),
    CodePoint(char),
    Control(u8),
}

impl TransitionKind {
    /// Does this transition advance the input?
    pub fn is_consuming(&self) -> bool {
        matches!(
            self,
            TransitionKind::Literal(_)
                | TransitionKind::NegatedLiteral(_)
                | TransitionKind::Any
                | TransitionKind::Class(_)
                | TransitionKind::NegatedClass(_)
                | TransitionKind::Digit
                | TransitionKind::NotDigit
                | TransitionKind::Word
                | TransitionKind::NotWord
                | TransitionKind::Space
                | TransitionKind::NotSpace
                | TransitionKind::BackReference(_)
                | TransitionKind::Property(_)
                | TransitionKind::NegatedProperty(_)
                | TransitionKind::Posix(_)
                | TransitionKind::CodePoint(_)
                | TransitionKind::Control(_)
        )
    }

    /// Rewrite embedded state ids through `map` (used when cloning).
    pub(crate) fn remap(&mut self, map: impl Fn(StateId) -> StateId) {
        match self {
            TransitionKind::LookaheadStart { resume, .. }
            | TransitionKind::LookbehindStart { resume, .. } => *resume = map(*resume),
            _ => {}
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Transition {
    pub kind: TransitionKind,
    pub target: StateId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct State {
    pub kind: StateKind,
    pub transitions: SmallVec<[Transition; 2]>,
}

impl State {
    pub(crate) fn new() -> Self {
        State {
            kind: StateKind::Transition,
            transitions: SmallVec::new(),
        }
    }
}

/// Metadata for one group in the pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupInfo {
    /// 1-based capture number for capturing groups.
    pub capture: Option<u32>,
    pub name: Option<Arc<str>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupingKind {
    Group,
    Lookahead,
    Lookbehind,
}

/// Start/end marker counts for one grouping construct.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GroupBalance {
    pub kind: GroupingKind,
    pub index: u32,
    pub starts: u32,
    pub ends: u32,
}

impl GroupBalance {
    pub fn is_balanced(&self) -> bool {
        self.starts == self.ends
    }
}
