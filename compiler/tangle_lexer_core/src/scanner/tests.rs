#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;
use crate::token::{ClassItem, ClassSet};

fn kinds(pattern: &str) -> Vec<PatternKind> {
    scan(View::from_str_bytes(pattern))
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

fn single(pattern: &str) -> PatternToken<'_> {
    let mut tokens = scan(View::from_str_bytes(pattern)).unwrap();
    assert_eq!(tokens.len(), 1, "{tokens:?}");
    tokens.remove(0)
}

fn err(pattern: &str) -> PatternLexError {
    scan(View::from_str_bytes(pattern)).unwrap_err()
}

fn q(min: u32, max: Option<u32>, lazy: bool) -> PatternKind {
    PatternKind::Quantifier(Quantifier { min, max, lazy })
}

// ─── Property Tests ────────────────────────────────────────────────────

proptest! {
    /// Tokens tile the pattern: contiguous, non-empty, covering every byte.
    #[test]
    fn tokens_tile_the_pattern(pattern in "[a-z().|*+?^$\\[\\]{},0-9-]{0,24}") {
        if let Ok(tokens) = scan(View::from_str_bytes(&pattern)) {
            let mut pos = 0;
            for t in &tokens {
                prop_assert_eq!(t.start, pos);
                prop_assert!(!t.is_empty());
                pos = t.end();
            }
            prop_assert_eq!(pos as usize, pattern.len());
        }
    }

    /// Alternatives are strictly shorter than the primary reading.
    #[test]
    fn alternatives_are_shorter(digits in "[1-9][0-9]{0,4}") {
        let pattern = format!("\\{digits}");
        let token = single(&pattern);
        for alt in &token.alternatives {
            prop_assert!(alt.len() < token.len());
            prop_assert_eq!(alt.start, token.start);
        }
    }
}

// ─── Dispatch ──────────────────────────────────────────────────────────

#[test]
fn literals_and_metacharacters() {
    assert_eq!(
        kinds("a.|^$)"),
        vec![
            PatternKind::Literal('a'),
            PatternKind::Any,
            PatternKind::Alternation,
            PatternKind::Anchor(Anchor::Start),
            PatternKind::Anchor(Anchor::End),
            PatternKind::GroupClose,
        ]
    );
}

#[test]
fn literal_decodes_utf8_scalars() {
    let token = single("é");
    assert_eq!(token.kind, PatternKind::Literal('é'));
    assert_eq!(token.len(), 2);
}

#[test]
fn empty_pattern_has_no_tokens() {
    assert!(kinds("").is_empty());
}

// ─── Quantifiers ───────────────────────────────────────────────────────

#[test]
fn greedy_and_lazy_quantifiers() {
    assert_eq!(
        kinds("a*?b+c?d??"),
        vec![
            PatternKind::Literal('a'),
            q(0, None, true),
            PatternKind::Literal('b'),
            q(1, None, false),
            PatternKind::Literal('c'),
            q(0, Some(1), false),
            PatternKind::Literal('d'),
            q(0, Some(1), true),
        ]
    );
}

#[test]
fn brace_repetitions() {
    assert_eq!(kinds("{3}")[0], q(3, Some(3), false));
    assert_eq!(kinds("{3,}")[0], q(3, None, false));
    assert_eq!(kinds("{2,5}?")[0], q(2, Some(5), true));
    assert_eq!(kinds("{,4}")[0], q(0, Some(4), false));
    // Bounds are recorded as written; ordering is checked by the builder.
    assert_eq!(kinds("{5,2}")[0], q(5, Some(2), false));
}

#[test]
fn malformed_brace_is_literal() {
    assert_eq!(
        kinds("{a}"),
        vec![
            PatternKind::Literal('{'),
            PatternKind::Literal('a'),
            PatternKind::Literal('}'),
        ]
    );
    assert_eq!(kinds("{,}")[0], PatternKind::Literal('{'));
    assert_eq!(kinds("{1")[0], PatternKind::Literal('{'));
}

#[test]
fn possessive_quantifiers_are_unsupported() {
    for pattern in ["a*+", "a++", "a?+", "a{2}+"] {
        assert_eq!(
            kinds(pattern)[1],
            PatternKind::Unsupported("possessive quantifier"),
            "{pattern}"
        );
    }
}

// ─── Escapes ───────────────────────────────────────────────────────────

#[test]
fn class_and_simple_escapes() {
    assert_eq!(
        kinds(r"\d\W\s\n\t\.\\"),
        vec![
            PatternKind::Escape(ClassEscape::Digit),
            PatternKind::Escape(ClassEscape::NotWord),
            PatternKind::Escape(ClassEscape::Space),
            PatternKind::Literal('\n'),
            PatternKind::Literal('\t'),
            PatternKind::Literal('.'),
            PatternKind::Literal('\\'),
        ]
    );
}

#[test]
fn escaped_anchors() {
    assert_eq!(
        kinds(r"\b\B\A\z"),
        vec![
            PatternKind::Anchor(Anchor::WordBoundary),
            PatternKind::Anchor(Anchor::NotWordBoundary),
            PatternKind::Anchor(Anchor::Start),
            PatternKind::Anchor(Anchor::End),
        ]
    );
}

#[test]
fn control_escape() {
    assert_eq!(kinds(r"\cJ")[0], PatternKind::Control(0x0A));
    assert_eq!(kinds(r"\c1")[0], PatternKind::Literal('c'));
}

#[test]
fn short_hex_escape_is_unambiguous() {
    let token = single(r"\x41");
    assert_eq!(token.kind, PatternKind::CodePoint(0x41));
    assert!(!token.is_ambiguous());
}

#[test]
fn bare_hex_escape_is_nul() {
    let tokens = scan(View::from_str_bytes(r"\xg")).unwrap();
    assert_eq!(tokens[0].kind, PatternKind::CodePoint(0));
    assert_eq!(tokens[0].len(), 2);
    assert_eq!(tokens[1].kind, PatternKind::Literal('g'));
}

#[test]
fn braced_hex_records_short_alternative() {
    let token = single(r"\x{1F600}");
    assert_eq!(token.kind, PatternKind::CodePoint(0x1F600));
    assert_eq!(token.len(), 9);
    assert_eq!(token.alternatives.len(), 1);
    let short = &token.alternatives[0];
    assert_eq!(short.kind, PatternKind::CodePoint(0));
    assert_eq!(short.len(), 2);
}

#[test]
fn unclosed_brace_after_hex_is_not_ambiguous() {
    let tokens = scan(View::from_str_bytes(r"\x{12")).unwrap();
    assert!(!tokens[0].is_ambiguous());
    assert_eq!(tokens[0].len(), 2);
    assert_eq!(tokens[1].kind, PatternKind::Literal('{'));
}

#[test]
fn unicode_escape_forms() {
    let fixed = single(r"\u00E9");
    assert_eq!(fixed.kind, PatternKind::CodePoint(0xE9));
    assert!(!fixed.is_ambiguous());

    let braced = single(r"\u{41}");
    assert_eq!(braced.kind, PatternKind::CodePoint(0x41));
    assert_eq!(braced.alternatives[0].kind, PatternKind::Literal('u'));
    assert_eq!(braced.alternatives[0].len(), 2);
}

#[test]
fn multi_digit_back_reference_is_ambiguous() {
    let token = single(r"\12");
    assert_eq!(token.kind, PatternKind::BackReference(12));
    assert_eq!(token.alternatives.len(), 1);
    assert_eq!(token.alternatives[0].kind, PatternKind::BackReference(1));

    let one = single(r"\3");
    assert_eq!(one.kind, PatternKind::BackReference(3));
    assert!(!one.is_ambiguous());
}

#[test]
fn named_back_references() {
    assert_eq!(
        kinds(r"\k<word>")[0],
        PatternKind::NamedBackReference("word".into())
    );
    assert_eq!(
        kinds("(?P=word)")[0],
        PatternKind::NamedBackReference("word".into())
    );
}

#[test]
fn property_escapes() {
    assert_eq!(
        kinds(r"\p{Greek}\P{L}\pN\p{^Lu}"),
        vec![
            PatternKind::Property {
                name: "Greek".into(),
                negated: false
            },
            PatternKind::Property {
                name: "L".into(),
                negated: true
            },
            PatternKind::Property {
                name: "N".into(),
                negated: false
            },
            PatternKind::Property {
                name: "Lu".into(),
                negated: true
            },
        ]
    );
}

// ─── Groups ────────────────────────────────────────────────────────────

#[test]
fn group_markers() {
    assert_eq!(
        kinds("((?:(?=(?!(?<=(?<!"),
        vec![
            PatternKind::GroupOpen(GroupKind::Capture),
            PatternKind::GroupOpen(GroupKind::NonCapture),
            PatternKind::GroupOpen(GroupKind::Lookahead),
            PatternKind::GroupOpen(GroupKind::NegativeLookahead),
            PatternKind::GroupOpen(GroupKind::Lookbehind),
            PatternKind::GroupOpen(GroupKind::NegativeLookbehind),
        ]
    );
}

#[test]
fn named_groups() {
    let named = PatternKind::GroupOpen(GroupKind::Named("year".into()));
    assert_eq!(kinds("(?<year>")[0], named);
    assert_eq!(kinds("(?P<year>")[0], named);
}

#[test]
fn unsupported_group_constructs() {
    let cases = [
        ("(?>a)", "atomic group"),
        ("(?R)", "recursion"),
        ("(?1)", "recursion"),
        ("(?-1)", "recursion"),
        ("(?&name)", "subroutine call"),
        ("(?P>name)", "subroutine call"),
        ("(?i)", "inline flags"),
        ("(?i-s:", "inline flags"),
        ("(?#note)", "comment group"),
    ];
    for (pattern, what) in cases {
        assert_eq!(kinds(pattern)[0], PatternKind::Unsupported(what), "{pattern}");
    }
    // The whole header is one token.
    assert_eq!(single("(?R)").len(), 4);
}

// ─── Classes ───────────────────────────────────────────────────────────

#[test]
fn class_members_and_ranges() {
    let token = single(r"[a-z_\d\x41-\x{5A}]");
    assert_eq!(
        token.kind,
        PatternKind::Class(ClassSet {
            negated: false,
            items: vec![
                ClassItem::Range(u32::from('a'), u32::from('z')),
                ClassItem::Single(u32::from('_')),
                ClassItem::Escape(ClassEscape::Digit),
                ClassItem::Range(0x41, 0x5A),
            ],
        })
    );
}

#[test]
fn negated_class_with_posix_and_trailing_dash() {
    let token = single("[^[:alpha:][:^digit:]-]");
    assert_eq!(
        token.kind,
        PatternKind::Class(ClassSet {
            negated: true,
            items: vec![
                ClassItem::Posix {
                    name: "alpha".into(),
                    negated: false
                },
                ClassItem::Posix {
                    name: "digit".into(),
                    negated: true
                },
                ClassItem::Single(u32::from('-')),
            ],
        })
    );
}

#[test]
fn class_escaped_bracket_and_backspace() {
    let token = single(r"[\]\b]");
    let PatternKind::Class(set) = token.kind else {
        panic!("expected class");
    };
    assert_eq!(
        set.items,
        vec![ClassItem::Single(u32::from(']')), ClassItem::Single(0x08)]
    );
}

#[test]
fn empty_class_is_scanned() {
    assert_eq!(single("[]").kind, PatternKind::Class(ClassSet::default()));
}

// ─── Hard Failures ─────────────────────────────────────────────────────

#[test]
fn unterminated_class() {
    assert_eq!(err("ab[cd"), PatternLexError::UnterminatedClass { position: 2 });
    // The only `]` is escaped.
    assert_eq!(err(r"[a\]"), PatternLexError::UnterminatedClass { position: 0 });
}

#[test]
fn unterminated_property() {
    assert_eq!(
        err(r"x\p{Greek"),
        PatternLexError::UnterminatedProperty { position: 1 }
    );
    assert_eq!(err(r"\p"), PatternLexError::UnterminatedProperty { position: 0 });
    assert_eq!(err(r"\p{}"), PatternLexError::UnterminatedProperty { position: 0 });
}

#[test]
fn trailing_backslash() {
    assert_eq!(err("ab\\"), PatternLexError::TrailingBackslash { position: 2 });
}

#[test]
fn unterminated_group_name() {
    assert_eq!(
        err("(?<name"),
        PatternLexError::UnterminatedGroupName { position: 0 }
    );
    assert_eq!(err("(?<>a)"), PatternLexError::EmptyGroupName { position: 0 });
}
