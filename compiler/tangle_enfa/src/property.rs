//! Unicode property and POSIX class lookup.
//!
//! The matcher never classifies characters by property name itself; it asks
//! a [`PropertyProvider`]. Callers with full Unicode tables plug their own
//! provider in through [`crate::Enfa::matcher_with`].

/// Maps a property name and a scalar to membership.
pub trait PropertyProvider {
    /// `Some(true)` if `c` has the property, `Some(false)` if it does not,
    /// `None` if the name is unknown. Unknown names never match, in either
    /// polarity.
    fn has_property(&self, name: &str, c: char) -> Option<bool>;
}

/// Provider backed by `char` classification in the standard library.
///
/// Covers the general-category shorthands and POSIX class names a lexer
/// grammar typically uses. Names compare ASCII case-insensitively, and
/// `_`, `-` and spaces are ignored (`White_Space` = `whitespace`).
#[derive(Copy, Clone, Debug, Default)]
pub struct StdPropertyProvider;

impl PropertyProvider for StdPropertyProvider {
    fn has_property(&self, name: &str, c: char) -> Option<bool> {
        let key: String = name
            .chars()
            .filter(|ch| !matches!(ch, '_' | '-' | ' '))
            .map(|ch| ch.to_ascii_lowercase())
            .collect();
        let hit = match key.as_str() {
            "l" | "letter" | "alpha" | "alphabetic" => c.is_alphabetic(),
            "lu" | "upper" | "uppercase" | "uppercaseletter" => c.is_uppercase(),
            "ll" | "lower" | "lowercase" | "lowercaseletter" => c.is_lowercase(),
            "n" | "number" | "numeric" => c.is_numeric(),
            "nd" | "digit" | "decimalnumber" => c.is_ascii_digit(),
            "p" | "punct" | "punctuation" => c.is_ascii_punctuation() || is_general_punctuation(c),
            "z" | "space" | "whitespace" | "separator" => c.is_whitespace(),
            "cc" | "cntrl" | "control" => c.is_control(),
            "alnum" => c.is_alphanumeric(),
            "xdigit" | "hexdigit" | "asciihexdigit" => c.is_ascii_hexdigit(),
            "ascii" => c.is_ascii(),
            "any" => true,
            "blank" => c == ' ' || c == '\t',
            "word" => c.is_alphanumeric() || c == '_',
            "graph" => !c.is_whitespace() && !c.is_control(),
            "print" => !c.is_control(),
            _ => return None,
        };
        Some(hit)
    }
}

/// Non-ASCII punctuation in the General Punctuation, CJK Symbols and
/// Supplemental Punctuation blocks.
fn is_general_punctuation(c: char) -> bool {
    matches!(
        c,
        '\u{2010}'..='\u{2027}'
            | '\u{2030}'..='\u{205E}'
            | '\u{3001}'..='\u{3003}'
            | '\u{2E00}'..='\u{2E7F}'
            | '\u{00A1}'
            | '\u{00A7}'
            | '\u{00AB}'
            | '\u{00B6}'
            | '\u{00B7}'
            | '\u{00BB}'
            | '\u{00BF}'
    )
}
