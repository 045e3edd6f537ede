//! Bracketed character classes.
//!
//! A class is scanned whole into one token: `[` to the first unescaped `]`.
//! Members are decoded here; range ordering and empty classes are checked
//! by the ENFA builder, which has the terminal name for its error.

use std::sync::Arc;

use super::{simple_escape, PatternScanner};
use crate::token::{ClassEscape, ClassItem, ClassSet, PatternKind, PatternToken};
use crate::PatternLexError;

/// A decoded class member before range folding.
enum Atom {
    Char(u32),
    Item(ClassItem),
}

impl<'a> PatternScanner<'a> {
    pub(super) fn class(&mut self, start: u32) -> Result<PatternToken<'a>, PatternLexError> {
        self.cursor.advance(); // consume '['
        if self.cursor.find(b']').is_none() {
            return Err(PatternLexError::UnterminatedClass { position: start });
        }
        let mut set = ClassSet::default();
        if self.cursor.current() == b'^' && !self.cursor.is_eof() {
            set.negated = true;
            self.cursor.advance();
        }

        loop {
            if self.cursor.is_eof() {
                return Err(PatternLexError::UnterminatedClass { position: start });
            }
            if self.cursor.current() == b']' {
                self.cursor.advance();
                break;
            }
            if self.cursor.current() == b'[' && self.cursor.peek() == b':' {
                if let Some(item) = self.posix_class() {
                    set.items.push(item);
                    continue;
                }
            }
            let lo = match self.class_atom(start)? {
                Atom::Item(item) => {
                    set.items.push(item);
                    continue;
                }
                Atom::Char(c) => c,
            };
            // `a-z`; a `-` before `]` is literal.
            if self.cursor.current() == b'-' && self.cursor.peek() != b']' && self.cursor.peek() != 0 {
                self.cursor.advance();
                match self.class_atom(start)? {
                    Atom::Char(hi) => set.items.push(ClassItem::Range(lo, hi)),
                    Atom::Item(item) => {
                        set.items.push(ClassItem::Single(lo));
                        set.items.push(ClassItem::Single(u32::from('-')));
                        set.items.push(item);
                    }
                }
                continue;
            }
            set.items.push(ClassItem::Single(lo));
        }
        self.token(PatternKind::Class(set), start)
    }

    fn class_atom(&mut self, start: u32) -> Result<Atom, PatternLexError> {
        if self.cursor.current() != b'\\' {
            return Ok(Atom::Char(u32::from(self.cursor.eat_char())));
        }
        self.cursor.advance(); // consume '\'
        if self.cursor.is_eof() {
            return Err(PatternLexError::UnterminatedClass { position: start });
        }
        let letter = self.cursor.current();
        if let Some(class) = ClassEscape::from_letter(letter) {
            self.cursor.advance();
            return Ok(Atom::Item(ClassItem::Escape(class)));
        }
        if let Some(c) = simple_escape(letter) {
            self.cursor.advance();
            return Ok(Atom::Char(u32::from(c)));
        }
        let atom = match letter {
            b'p' | b'P' => {
                let escape_start = self.cursor.pos() - 1;
                self.cursor.advance();
                let (name, negated) = self.property_name(escape_start, letter == b'P')?;
                Atom::Item(ClassItem::Property { name, negated })
            }
            // Backspace inside a class.
            b'b' => {
                self.cursor.advance();
                Atom::Char(0x08)
            }
            b'x' | b'u' => {
                self.cursor.advance();
                let width = if letter == b'x' { 2 } else { 4 };
                if let Some((value, end)) = self.braced_hex() {
                    self.cursor.set_pos(end);
                    Atom::Char(value)
                } else {
                    let (value, digits) = self.fixed_hex(width);
                    if letter == b'u' && digits != 4 {
                        Atom::Char(u32::from('u'))
                    } else {
                        self.cursor.advance_n(digits);
                        Atom::Char(value)
                    }
                }
            }
            b'c' if self.cursor.peek().is_ascii_alphabetic() => {
                let code = self.cursor.peek() & 0x1F;
                self.cursor.advance_n(2);
                Atom::Char(u32::from(code))
            }
            _ => Atom::Char(u32::from(self.cursor.eat_char())),
        };
        Ok(atom)
    }

    /// `[:name:]` or `[:^name:]` at the cursor. Returns `None`, without
    /// moving, when the bytes do not form one.
    fn posix_class(&mut self) -> Option<ClassItem> {
        let rest = self.cursor.rest();
        let body = rest.get(2..)?;
        let (negated, body) = match body.split_first() {
            Some((b'^', tail)) => (true, tail),
            _ => (false, body),
        };
        let name_len = body.iter().take_while(|b| b.is_ascii_alphabetic()).count();
        if name_len == 0 || body.get(name_len..name_len + 2) != Some(b":]".as_slice()) {
            return None;
        }
        let name = Arc::from(String::from_utf8_lossy(&body[..name_len]).as_ref());
        let consumed = 2 + u32::from(negated) + name_len as u32 + 2;
        self.cursor.advance_n(consumed);
        Some(ClassItem::Posix { name, negated })
    }
}

