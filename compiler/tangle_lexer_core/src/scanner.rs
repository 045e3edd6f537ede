//! Phase 1: hand-written pattern scanner.
//!
//! The scanner walks a pattern view left to right. A dispatch on the current
//! byte selects a focused routine (escape, class, group marker, quantifier,
//! anchor, literal) that advances the cursor and returns one
//! [`PatternToken`].
//!
//! # Ambiguity
//!
//! Some escapes admit more than one reading from the same offset. The
//! routine advances past the longest reading and attaches the shorter ones
//! as alternatives:
//!
//! | Source     | Longest          | Alternative            |
//! |------------|------------------|------------------------|
//! | `\x{1F6}`  | code point 0x1F6 | `\x` (NUL), then `{1F6}` |
//! | `\u{41}`   | code point 0x41  | literal `u`, then `{41}` |
//! | `\12`      | back-reference 12 | back-reference 1, then `2` |
//!
//! Phase 2 ([`crate::disambiguate`]) picks one reading per token and
//! re-scans any bytes a shorter reading leaves uncovered.

use std::sync::Arc;

use tangle_ir::View;
use tracing::trace;

use crate::cursor::Cursor;
use crate::token::{Anchor, ClassEscape, GroupKind, PatternKind, PatternToken, Quantifier};
use crate::PatternLexError;

mod class;

/// Scan a whole pattern into Phase 1 tokens.
pub fn scan(pattern: View<'_>) -> Result<Vec<PatternToken<'_>>, PatternLexError> {
    let mut scanner = PatternScanner::new(pattern);
    let mut tokens = Vec::new();
    while let Some(token) = scanner.next_token()? {
        tokens.push(token);
    }
    trace!(
        tokens = tokens.len(),
        ambiguous = tokens.iter().filter(|t| t.is_ambiguous()).count(),
        "pattern scanned"
    );
    Ok(tokens)
}

/// Stateless-per-token scanner. Any offset can be a restart point, which is
/// what Phase 2 relies on when it re-scans a gap.
pub struct PatternScanner<'a> {
    pattern: View<'a>,
    cursor: Cursor<'a>,
}

impl<'a> PatternScanner<'a> {
    pub fn new(pattern: View<'a>) -> Self {
        PatternScanner {
            pattern,
            cursor: Cursor::new(pattern.as_bytes()),
        }
    }

    #[inline]
    pub fn pos(&self) -> u32 {
        self.cursor.pos()
    }

    /// Move to `pos`, relative to the start of the pattern.
    pub fn seek(&mut self, pos: u32) {
        self.cursor.set_pos(pos);
    }

    /// Produce the next token, or `None` at the end of the pattern.
    pub fn next_token(&mut self) -> Result<Option<PatternToken<'a>>, PatternLexError> {
        if self.cursor.is_eof() {
            return Ok(None);
        }
        let start = self.cursor.pos();
        let token = match self.cursor.current() {
            b'\\' => self.escape(start)?,
            b'[' => self.class(start)?,
            b'(' => self.group_open(start)?,
            b')' => self.single(start, PatternKind::GroupClose)?,
            b'|' => self.single(start, PatternKind::Alternation)?,
            b'.' => self.single(start, PatternKind::Any)?,
            b'^' => self.single(start, PatternKind::Anchor(Anchor::Start))?,
            b'$' => self.single(start, PatternKind::Anchor(Anchor::End))?,
            b'*' => self.quantifier(start, 0, None)?,
            b'+' => self.quantifier(start, 1, None)?,
            b'?' => self.quantifier(start, 0, Some(1))?,
            b'{' => self.brace(start)?,
            _ => {
                let c = self.cursor.eat_char();
                self.token(PatternKind::Literal(c), start)?
            }
        };
        Ok(Some(token))
    }

    /// Token from `start` to the cursor.
    fn token(&self, kind: PatternKind, start: u32) -> Result<PatternToken<'a>, PatternLexError> {
        self.token_to(kind, start, self.cursor.pos())
    }

    fn token_to(
        &self,
        kind: PatternKind,
        start: u32,
        end: u32,
    ) -> Result<PatternToken<'a>, PatternLexError> {
        let text = self
            .pattern
            .slice(start as usize, end.saturating_sub(start) as usize)?;
        Ok(PatternToken::new(kind, text, start))
    }

    fn single(&mut self, start: u32, kind: PatternKind) -> Result<PatternToken<'a>, PatternLexError> {
        self.cursor.advance();
        self.token(kind, start)
    }

    // ─── Escapes ────────────────────────────────────────────────────────

    fn escape(&mut self, start: u32) -> Result<PatternToken<'a>, PatternLexError> {
        self.cursor.advance(); // consume '\'
        if self.cursor.is_eof() {
            return Err(PatternLexError::TrailingBackslash { position: start });
        }
        let letter = self.cursor.current();
        match letter {
            b'x' => return self.hex_escape(start),
            b'u' => return self.unicode_escape(start),
            b'1'..=b'9' => return self.back_reference(start),
            b'p' | b'P' => {
                self.cursor.advance();
                let (name, negated) = self.property_name(start, letter == b'P')?;
                return self.token(PatternKind::Property { name, negated }, start);
            }
            b'k' if self.cursor.peek() == b'<' => {
                self.cursor.advance_n(2);
                let name = self.group_name(start, b'>')?;
                return self.token(PatternKind::NamedBackReference(name), start);
            }
            _ => {}
        }

        let kind = if let Some(class) = ClassEscape::from_letter(letter) {
            self.cursor.advance();
            PatternKind::Escape(class)
        } else if let Some(c) = simple_escape(letter) {
            self.cursor.advance();
            PatternKind::Literal(c)
        } else {
            match letter {
                b'b' => self.advance_with(PatternKind::Anchor(Anchor::WordBoundary)),
                b'B' => self.advance_with(PatternKind::Anchor(Anchor::NotWordBoundary)),
                b'A' => self.advance_with(PatternKind::Anchor(Anchor::Start)),
                b'z' | b'Z' => self.advance_with(PatternKind::Anchor(Anchor::End)),
                b'K' => self.advance_with(PatternKind::Unsupported("match reset")),
                b'G' => self.advance_with(PatternKind::Unsupported("previous-match anchor")),
                b'c' if self.cursor.peek().is_ascii_alphabetic() => {
                    let code = self.cursor.peek() & 0x1F;
                    self.cursor.advance_n(2);
                    PatternKind::Control(code)
                }
                _ => PatternKind::Literal(self.cursor.eat_char()),
            }
        };
        self.token(kind, start)
    }

    fn advance_with(&mut self, kind: PatternKind) -> PatternKind {
        self.cursor.advance();
        kind
    }

    /// `\x` followed by up to two hex digits, or `\x{H..}`.
    fn hex_escape(&mut self, start: u32) -> Result<PatternToken<'a>, PatternLexError> {
        self.cursor.advance(); // consume 'x'
        let after_x = self.cursor.pos();
        let (short_value, digits) = self.fixed_hex(2);
        let short_end = after_x + digits;
        let short = self.token_to(PatternKind::CodePoint(short_value), start, short_end)?;
        self.braced_or(start, short)
    }

    /// `\u` followed by exactly four hex digits, or `\u{H..}`. Anything else
    /// is a literal `u`.
    fn unicode_escape(&mut self, start: u32) -> Result<PatternToken<'a>, PatternLexError> {
        self.cursor.advance(); // consume 'u'
        let after_u = self.cursor.pos();
        let (value, digits) = self.fixed_hex(4);
        let short = if digits == 4 {
            self.token_to(PatternKind::CodePoint(value), start, after_u + 4)?
        } else {
            self.token_to(PatternKind::Literal('u'), start, after_u)?
        };
        self.braced_or(start, short)
    }

    /// Attach `short` as an alternative when a braced hex form follows;
    /// otherwise return `short` alone. Leaves the cursor after whichever
    /// reading is primary.
    fn braced_or(
        &mut self,
        start: u32,
        short: PatternToken<'a>,
    ) -> Result<PatternToken<'a>, PatternLexError> {
        match self.braced_hex() {
            Some((value, end)) => {
                self.cursor.set_pos(end);
                let mut long = self.token_to(PatternKind::CodePoint(value), start, end)?;
                long.alternatives.push(short);
                Ok(long)
            }
            None => {
                self.cursor.set_pos(short.end());
                Ok(short)
            }
        }
    }

    /// Read up to `max` hex digits at the cursor without advancing.
    fn fixed_hex(&self, max: u32) -> (u32, u32) {
        let rest = self.cursor.rest();
        let mut value = 0u32;
        let mut digits = 0u32;
        for &b in rest.iter().take(max as usize) {
            let Some(d) = hex_value(b) else { break };
            value = value * 16 + d;
            digits += 1;
        }
        (value, digits)
    }

    /// `{H..}` at the cursor: one to eight hex digits and a closing brace.
    /// Returns the value and the offset past `}`.
    fn braced_hex(&self) -> Option<(u32, u32)> {
        if self.cursor.current() != b'{' || self.cursor.is_eof() {
            return None;
        }
        let open = self.cursor.pos();
        let close = self.cursor.find(b'}')?;
        let body = self.cursor.rest().get(1..(close - open) as usize)?;
        if body.is_empty() || body.len() > 8 {
            return None;
        }
        let mut value = 0u32;
        for &b in body {
            value = value * 16 + hex_value(b)?;
        }
        Some((value, close + 1))
    }

    /// `\N..`: the all-digits reading is primary, the one-digit reading is
    /// recorded when more digits follow.
    fn back_reference(&mut self, start: u32) -> Result<PatternToken<'a>, PatternLexError> {
        let first = u32::from(self.cursor.current() - b'0');
        self.cursor.advance();
        let one_digit_end = self.cursor.pos();
        self.cursor.eat_while(|b| b.is_ascii_digit());
        let digits = self
            .pattern
            .as_bytes()
            .get(start as usize + 1..self.cursor.pos() as usize)
            .unwrap_or(&[]);
        let value = parse_decimal(digits);
        let mut token = self.token(PatternKind::BackReference(value), start)?;
        if self.cursor.pos() > one_digit_end {
            let short = self.token_to(PatternKind::BackReference(first), start, one_digit_end)?;
            token.alternatives.push(short);
        }
        Ok(token)
    }

    /// Property name after `\p` / `\P`. Cursor sits after the letter.
    fn property_name(
        &mut self,
        start: u32,
        negated: bool,
    ) -> Result<(Arc<str>, bool), PatternLexError> {
        let current = self.cursor.current();
        if current.is_ascii_alphabetic() && !self.cursor.is_eof() {
            self.cursor.advance();
            return Ok((Arc::from(char::from(current).to_string()), negated));
        }
        if current != b'{' || self.cursor.is_eof() {
            return Err(PatternLexError::UnterminatedProperty { position: start });
        }
        let open = self.cursor.pos();
        let Some(close) = self.cursor.find(b'}') else {
            return Err(PatternLexError::UnterminatedProperty { position: start });
        };
        let body = self
            .cursor
            .rest()
            .get(1..(close - open) as usize)
            .unwrap_or(&[]);
        let (body, negated) = match body.split_first() {
            Some((b'^', tail)) => (tail, !negated),
            _ => (body, negated),
        };
        if body.is_empty() {
            return Err(PatternLexError::UnterminatedProperty { position: start });
        }
        let name = Arc::from(String::from_utf8_lossy(body).as_ref());
        self.cursor.set_pos(close + 1);
        Ok((name, negated))
    }

    // ─── Groups ─────────────────────────────────────────────────────────

    fn group_open(&mut self, start: u32) -> Result<PatternToken<'a>, PatternLexError> {
        self.cursor.advance(); // consume '('
        if self.cursor.current() != b'?' || self.cursor.is_eof() {
            return self.token(PatternKind::GroupOpen(GroupKind::Capture), start);
        }
        self.cursor.advance(); // consume '?'
        let kind = match (self.cursor.current(), self.cursor.peek()) {
            (b':', _) => self.advance_with(PatternKind::GroupOpen(GroupKind::NonCapture)),
            (b'=', _) => self.advance_with(PatternKind::GroupOpen(GroupKind::Lookahead)),
            (b'!', _) => self.advance_with(PatternKind::GroupOpen(GroupKind::NegativeLookahead)),
            (b'>', _) => self.advance_with(PatternKind::Unsupported("atomic group")),
            (b'<', b'=') => {
                self.cursor.advance_n(2);
                PatternKind::GroupOpen(GroupKind::Lookbehind)
            }
            (b'<', b'!') => {
                self.cursor.advance_n(2);
                PatternKind::GroupOpen(GroupKind::NegativeLookbehind)
            }
            (b'<', _) => {
                self.cursor.advance();
                PatternKind::GroupOpen(GroupKind::Named(self.group_name(start, b'>')?))
            }
            (b'P', b'<') => {
                self.cursor.advance_n(2);
                PatternKind::GroupOpen(GroupKind::Named(self.group_name(start, b'>')?))
            }
            (b'P', b'=') => {
                self.cursor.advance_n(2);
                PatternKind::NamedBackReference(self.group_name(start, b')')?)
            }
            (b'P', b'>') | (b'&', _) => {
                self.skip_past(b')');
                PatternKind::Unsupported("subroutine call")
            }
            (b'R' | b'0'..=b'9', _) => {
                self.skip_past(b')');
                PatternKind::Unsupported("recursion")
            }
            (b'+' | b'-', d) if d.is_ascii_digit() => {
                self.skip_past(b')');
                PatternKind::Unsupported("recursion")
            }
            (b'#', _) => {
                self.skip_past(b')');
                PatternKind::Unsupported("comment group")
            }
            (c, _) if c.is_ascii_alphabetic() || c == b'-' => {
                self.cursor.eat_while(|b| b.is_ascii_alphabetic() || b == b'-');
                if matches!(self.cursor.current(), b':' | b')') && !self.cursor.is_eof() {
                    self.cursor.advance();
                }
                PatternKind::Unsupported("inline flags")
            }
            _ => PatternKind::Unsupported("unknown group syntax"),
        };
        self.token(kind, start)
    }

    /// Read a group name up to `close` and consume the delimiter.
    fn group_name(&mut self, start: u32, close: u8) -> Result<Arc<str>, PatternLexError> {
        let name_start = self.cursor.pos();
        let Some(end) = self.cursor.find(close) else {
            return Err(PatternLexError::UnterminatedGroupName { position: start });
        };
        if end == name_start {
            return Err(PatternLexError::EmptyGroupName { position: start });
        }
        let bytes = self
            .cursor
            .rest()
            .get(..(end - name_start) as usize)
            .unwrap_or(&[]);
        let name = Arc::from(String::from_utf8_lossy(bytes).as_ref());
        self.cursor.set_pos(end + 1);
        Ok(name)
    }

    /// Advance past the next `byte`, or to the end if there is none.
    fn skip_past(&mut self, byte: u8) {
        match self.cursor.find(byte) {
            Some(at) => self.cursor.set_pos(at + 1),
            None => self.cursor.set_pos(self.cursor.source_len()),
        }
    }

    // ─── Quantifiers ────────────────────────────────────────────────────

    fn quantifier(
        &mut self,
        start: u32,
        min: u32,
        max: Option<u32>,
    ) -> Result<PatternToken<'a>, PatternLexError> {
        self.cursor.advance();
        self.finish_quantifier(start, min, max)
    }

    /// Lazy (`?`) and possessive (`+`) suffixes.
    fn finish_quantifier(
        &mut self,
        start: u32,
        min: u32,
        max: Option<u32>,
    ) -> Result<PatternToken<'a>, PatternLexError> {
        let lazy = match self.cursor.current() {
            b'?' if !self.cursor.is_eof() => {
                self.cursor.advance();
                true
            }
            b'+' if !self.cursor.is_eof() => {
                self.cursor.advance();
                return self.token(PatternKind::Unsupported("possessive quantifier"), start);
            }
            _ => false,
        };
        self.token(PatternKind::Quantifier(Quantifier { min, max, lazy }), start)
    }

    /// `{n}`, `{n,}`, `{n,m}`, `{,m}`. Any other `{` is a literal.
    fn brace(&mut self, start: u32) -> Result<PatternToken<'a>, PatternLexError> {
        if let Some((min, max, end)) = self.repetition_bounds() {
            self.cursor.set_pos(end);
            return self.finish_quantifier(start, min, max);
        }
        self.cursor.advance();
        self.token(PatternKind::Literal('{'), start)
    }

    fn repetition_bounds(&self) -> Option<(u32, Option<u32>, u32)> {
        let close = self.cursor.find(b'}')?;
        let body = self
            .cursor
            .rest()
            .get(1..(close - self.cursor.pos()) as usize)?;
        let all_digits = |s: &[u8]| !s.is_empty() && s.iter().all(u8::is_ascii_digit);
        let (min, max) = match body.iter().position(|&b| b == b',') {
            None if all_digits(body) => {
                let n = parse_decimal(body);
                (n, Some(n))
            }
            None => return None,
            Some(comma) => {
                let (lo, hi) = (&body[..comma], &body[comma + 1..]);
                match (lo.is_empty(), hi.is_empty()) {
                    (true, true) => return None,
                    (false, true) if all_digits(lo) => (parse_decimal(lo), None),
                    (true, false) if all_digits(hi) => (0, Some(parse_decimal(hi))),
                    (false, false) if all_digits(lo) && all_digits(hi) => {
                        (parse_decimal(lo), Some(parse_decimal(hi)))
                    }
                    _ => return None,
                }
            }
        };
        Some((min, max, close + 1))
    }
}

/// Single-letter escapes that stand for one literal character.
fn simple_escape(letter: u8) -> Option<char> {
    Some(match letter {
        b'n' => '\n',
        b'r' => '\r',
        b't' => '\t',
        b'f' => '\x0C',
        b'v' => '\x0B',
        b'a' => '\x07',
        b'e' => '\x1B',
        b'0' => '\0',
        _ => return None,
    })
}

fn hex_value(b: u8) -> Option<u32> {
    char::from(b).to_digit(16)
}

/// Decimal digits to `u32`, saturating on overflow.
fn parse_decimal(digits: &[u8]) -> u32 {
    digits.iter().fold(0u32, |acc, &b| {
        acc.saturating_mul(10)
            .saturating_add(u32::from(b.wrapping_sub(b'0')))
    })
}

#[cfg(test)]
mod tests;
