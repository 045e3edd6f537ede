//! Pattern token model.
//!
//! Phase 1 produces [`PatternToken`]s, which may carry alternative
//! interpretations of the same start offset. Phase 2 collapses each one to a
//! [`ParsedState`], which never carries alternatives.

use std::fmt;
use std::sync::Arc;

use tangle_ir::View;

/// Shorthand class escapes (`\d \D \w \W \s \S`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClassEscape {
    Digit,
    NotDigit,
    Word,
    NotWord,
    Space,
    NotSpace,
}

impl ClassEscape {
    pub fn from_letter(letter: u8) -> Option<Self> {
        Some(match letter {
            b'd' => ClassEscape::Digit,
            b'D' => ClassEscape::NotDigit,
            b'w' => ClassEscape::Word,
            b'W' => ClassEscape::NotWord,
            b's' => ClassEscape::Space,
            b'S' => ClassEscape::NotSpace,
            _ => return None,
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// `^` or `\A`
    Start,
    /// `$`, `\z` or `\Z`
    End,
    /// `\b`
    WordBoundary,
    /// `\B`
    NotWordBoundary,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum GroupKind {
    /// `(`
    Capture,
    /// `(?<name>` or `(?P<name>`
    Named(Arc<str>),
    /// `(?:`
    NonCapture,
    /// `(?=`
    Lookahead,
    /// `(?!`
    NegativeLookahead,
    /// `(?<=`
    Lookbehind,
    /// `(?<!`
    NegativeLookbehind,
}

impl GroupKind {
    pub fn is_capturing(&self) -> bool {
        matches!(self, GroupKind::Capture | GroupKind::Named(_))
    }

    pub fn is_lookaround(&self) -> bool {
        matches!(
            self,
            GroupKind::Lookahead
                | GroupKind::NegativeLookahead
                | GroupKind::Lookbehind
                | GroupKind::NegativeLookbehind
        )
    }
}

/// Repetition bounds. `max: None` is unbounded.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Quantifier {
    pub min: u32,
    pub max: Option<u32>,
    pub lazy: bool,
}

/// One member of a bracketed character class.
///
/// Code points are kept as raw `u32` so the builder can report invalid
/// scalars with their position.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClassItem {
    Single(u32),
    Range(u32, u32),
    Escape(ClassEscape),
    /// `\p{..}` / `\P{..}` inside a class.
    Property { name: Arc<str>, negated: bool },
    /// `[:alpha:]` / `[:^alpha:]`
    Posix { name: Arc<str>, negated: bool },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ClassSet {
    pub negated: bool,
    pub items: Vec<ClassItem>,
}

/// Interpretation of a pattern token.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PatternKind {
    /// A literal scalar, plain or escaped (`a`, `\.`, `\n`).
    Literal(char),
    /// `.`
    Any,
    Escape(ClassEscape),
    Class(ClassSet),
    Anchor(Anchor),
    GroupOpen(GroupKind),
    GroupClose,
    Alternation,
    Quantifier(Quantifier),
    /// `\1`, `\12`
    BackReference(u32),
    /// `\k<name>`
    NamedBackReference(Arc<str>),
    /// `\p{..}`, `\P{..}`, `\pL`
    Property { name: Arc<str>, negated: bool },
    /// `\xHH`, `\x{H..}`, `\uHHHH`, `\u{H..}`. Not yet validated as a scalar.
    CodePoint(u32),
    /// `\cX`
    Control(u8),
    /// A construct that needs backtracking or recursion. Rejected by the
    /// ENFA builder.
    Unsupported(&'static str),
}

impl PatternKind {
    /// Short label used in logs and errors.
    pub fn label(&self) -> &'static str {
        match self {
            PatternKind::Literal(_) => "literal",
            PatternKind::Any => "any",
            PatternKind::Escape(_) => "class escape",
            PatternKind::Class(_) => "class",
            PatternKind::Anchor(_) => "anchor",
            PatternKind::GroupOpen(_) => "group start",
            PatternKind::GroupClose => "group end",
            PatternKind::Alternation => "alternation",
            PatternKind::Quantifier(_) => "quantifier",
            PatternKind::BackReference(_) | PatternKind::NamedBackReference(_) => {
                "back-reference"
            }
            PatternKind::Property { .. } => "property",
            PatternKind::CodePoint(_) => "code point",
            PatternKind::Control(_) => "control",
            PatternKind::Unsupported(what) => what,
        }
    }
}

/// Phase 1 output unit.
///
/// `kind` and `text` hold the interpretation the scanner advanced past, which
/// is always the longest. `alternatives` lists the other interpretations of
/// the same start offset in the order the scanner found them. Alternatives
/// never carry alternatives of their own.
#[derive(Clone, PartialEq, Eq)]
pub struct PatternToken<'a> {
    pub kind: PatternKind,
    pub text: View<'a>,
    /// Offset from the start of the pattern.
    pub start: u32,
    pub alternatives: Vec<PatternToken<'a>>,
}

impl<'a> PatternToken<'a> {
    pub fn new(kind: PatternKind, text: View<'a>, start: u32) -> Self {
        PatternToken {
            kind,
            text,
            start,
            alternatives: Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.text.len() as u32
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Offset one past the last byte.
    #[inline]
    pub fn end(&self) -> u32 {
        self.start + self.len()
    }

    pub fn is_ambiguous(&self) -> bool {
        !self.alternatives.is_empty()
    }
}

impl fmt::Debug for PatternToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}@{}..{} {:?}",
            self.kind,
            self.start,
            self.end(),
            self.text.to_owned_string()
        )?;
        if !self.alternatives.is_empty() {
            f.debug_list().entries(&self.alternatives).finish()?;
        }
        Ok(())
    }
}

/// Phase 2 output unit: a single resolved interpretation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedState<'a> {
    pub kind: PatternKind,
    pub text: View<'a>,
    pub start: u32,
    /// The token had competing interpretations.
    pub ambiguous: bool,
}

impl ParsedState<'_> {
    #[inline]
    pub fn end(&self) -> u32 {
        self.start + self.text.len() as u32
    }
}
