#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;
use crate::{scan, PatternKind};

fn states(pattern: &str, strategy: DisambiguationStrategy) -> Vec<ParsedState<'_>> {
    let view = View::from_str_bytes(pattern);
    let tokens = scan(view).unwrap();
    disambiguate(view, &tokens, strategy).unwrap()
}

fn kinds(pattern: &str, strategy: DisambiguationStrategy) -> Vec<PatternKind> {
    states(pattern, strategy)
        .into_iter()
        .map(|s| s.kind)
        .collect()
}

proptest! {
    /// Longest-match always keeps the Phase 1 token boundaries.
    #[test]
    fn longest_match_is_length_maximal(digits in "[1-9][0-9]{1,4}") {
        let pattern = format!("a\\{digits}b");
        let out = states(&pattern, DisambiguationStrategy::LongestMatch);
        prop_assert_eq!(out.len(), 3);
        prop_assert_eq!(out[1].text.len(), digits.len() + 1);
        prop_assert!(out[1].ambiguous);
    }

    /// Every strategy yields states that tile the pattern.
    #[test]
    fn every_strategy_tiles(pattern in "(\\\\x\\{[0-9a-f]{1,4}\\}|\\\\[1-9][0-9]?|[a-z]){0,6}") {
        for strategy in [
            DisambiguationStrategy::LongestMatch,
            DisambiguationStrategy::ShortestMatch,
            DisambiguationStrategy::FirstListed,
        ] {
            let out = states(&pattern, strategy);
            let mut pos = 0;
            for s in &out {
                prop_assert_eq!(s.start, pos);
                pos = s.end();
            }
            prop_assert_eq!(pos as usize, pattern.len());
        }
    }
}

#[test]
fn braced_hex_prefers_long_form() {
    let out = states(r"\x{1F600}", DisambiguationStrategy::default());
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].kind, PatternKind::CodePoint(0x1F600));
    assert!(out[0].ambiguous);
    assert_eq!(out[0].text.len(), 9);
}

#[test]
fn unambiguous_tokens_pass_through() {
    let out = states("ab", DisambiguationStrategy::ShortestMatch);
    assert_eq!(out.len(), 2);
    assert!(out.iter().all(|s| !s.ambiguous));
}

#[test]
fn shortest_match_rescans_the_gap() {
    // `\x` is NUL, then `{12}` re-scans as a repetition.
    assert_eq!(
        kinds(r"\x{12}a", DisambiguationStrategy::ShortestMatch),
        vec![
            PatternKind::CodePoint(0),
            PatternKind::Quantifier(crate::Quantifier {
                min: 12,
                max: Some(12),
                lazy: false,
            }),
            PatternKind::Literal('a'),
        ]
    );
}

#[test]
fn shortest_back_reference_leaves_literal_digits() {
    let out = states(r"\123", DisambiguationStrategy::ShortestMatch);
    assert_eq!(
        out.iter().map(|s| s.kind.clone()).collect::<Vec<_>>(),
        vec![
            PatternKind::BackReference(1),
            PatternKind::Literal('2'),
            PatternKind::Literal('3'),
        ]
    );
    assert!(out[0].ambiguous);
    assert!(!out[1].ambiguous);
}

#[test]
fn first_listed_takes_the_recorded_alternative() {
    assert_eq!(
        kinds(r"\u{41}", DisambiguationStrategy::FirstListed),
        vec![
            PatternKind::Literal('u'),
            PatternKind::Quantifier(crate::Quantifier {
                min: 41,
                max: Some(41),
                lazy: false,
            }),
        ]
    );
}

#[test]
fn choose_keeps_primary_on_ties() {
    let view = View::from_str_bytes("ab");
    let tokens = scan(view).unwrap();
    let t = &tokens[0];
    assert!(std::ptr::eq(DisambiguationStrategy::LongestMatch.choose(t), t));
    assert!(std::ptr::eq(DisambiguationStrategy::FirstListed.choose(t), t));
}
