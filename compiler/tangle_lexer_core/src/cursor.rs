//! Byte cursor over a pattern view.
//!
//! Reads past the end return `0x00`, so scan routines can peek freely. An
//! interior NUL in the pattern also reads as `0x00`; [`Cursor::is_eof`]
//! tells the two apart by comparing the position against the length.

/// Cursor over the bytes of one pattern.
#[derive(Clone, Copy, Debug)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: u32,
}

const _: () = assert!(std::mem::size_of::<Cursor<'static>>() <= 24);

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Cursor { buf, pos: 0 }
    }

    /// Byte at the current position, or `0x00` past the end.
    #[inline]
    pub fn current(&self) -> u8 {
        self.byte(0)
    }

    #[inline]
    pub fn peek(&self) -> u8 {
        self.byte(1)
    }

    #[inline]
    fn byte(&self, ahead: u32) -> u8 {
        self.buf
            .get((self.pos + ahead) as usize)
            .copied()
            .unwrap_or(0)
    }

    #[inline]
    pub fn advance(&mut self) {
        self.pos += 1;
    }

    #[inline]
    pub fn advance_n(&mut self, n: u32) {
        self.pos += n;
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos as usize >= self.buf.len()
    }

    #[inline]
    pub fn pos(&self) -> u32 {
        self.pos
    }

    pub fn set_pos(&mut self, pos: u32) {
        self.pos = pos;
    }

    pub fn source_len(&self) -> u32 {
        self.buf.len() as u32
    }

    /// Bytes from the current position to the end.
    pub fn rest(&self) -> &'a [u8] {
        self.buf.get(self.pos as usize..).unwrap_or(&[])
    }

    /// Advance while `pred` holds for the current byte. Stops at the end.
    #[inline]
    pub fn eat_while(&mut self, pred: impl Fn(u8) -> bool) -> u32 {
        let start = self.pos;
        while !self.is_eof() && pred(self.current()) {
            self.pos += 1;
        }
        self.pos - start
    }

    /// Offset of the next `byte` at or after the current position.
    pub fn find(&self, byte: u8) -> Option<u32> {
        memchr::memchr(byte, self.rest()).map(|i| self.pos + i as u32)
    }

    /// Number of bytes in the UTF-8 sequence led by `byte`.
    #[inline]
    pub fn utf8_char_width(byte: u8) -> u32 {
        match byte {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        }
    }

    /// Decode the scalar at the current position and advance past it.
    ///
    /// Malformed sequences decode as U+FFFD and consume a single byte.
    pub fn eat_char(&mut self) -> char {
        let width = Self::utf8_char_width(self.current());
        let rest = self.rest();
        let decoded = rest
            .get(..width as usize)
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
            .and_then(|s| s.chars().next());
        match decoded {
            Some(c) => {
                self.pos += width;
                c
            }
            None => {
                self.pos += 1;
                char::REPLACEMENT_CHARACTER
            }
        }
    }
}
