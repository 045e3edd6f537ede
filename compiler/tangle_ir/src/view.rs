//! Zero-copy byte views.
//!
//! A [`View`] is an immutable `(buffer, start, len)` window over a borrowed
//! byte buffer. Slicing only narrows the window and never copies; equality
//! and hashing compare byte content, not identity. The only allocating
//! operation is [`View::to_owned_string`], which is meant for boundaries
//! (error messages, final graph values).

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::Span;

/// Error returned by out-of-range view access.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    /// Requested `[start, start + len)` exceeds the view.
    #[error("range {start}..{start}+{len} out of range for view of length {available}")]
    OutOfRange {
        start: usize,
        len: usize,
        available: usize,
    },
    /// The view does not contain valid UTF-8.
    #[error("invalid UTF-8 at byte {offset}")]
    InvalidUtf8 { offset: usize },
}

/// Immutable window over a shared byte buffer.
///
/// # Invariant
///
/// `start + len <= buf.len()`. Every constructor and `slice` preserves it.
#[derive(Clone, Copy)]
pub struct View<'a> {
    buf: &'a [u8],
    start: u32,
    len: u32,
}

/// Size assertion: fat pointer plus two offsets.
const _: () = assert!(std::mem::size_of::<View<'static>>() <= 24);

impl<'a> View<'a> {
    /// View over all of `buf`.
    ///
    /// Buffers longer than `u32::MAX` are clamped to the addressable prefix.
    pub fn new(buf: &'a [u8]) -> Self {
        let len = u32::try_from(buf.len()).unwrap_or(u32::MAX);
        View { buf, start: 0, len }
    }

    /// View over a string's UTF-8 bytes.
    pub fn from_str_bytes(text: &'a str) -> Self {
        Self::new(text.as_bytes())
    }

    /// Narrow to `[start, start + len)` relative to this view.
    pub fn slice(&self, start: usize, len: usize) -> Result<View<'a>, ViewError> {
        let available = self.len as usize;
        match start.checked_add(len) {
            Some(end) if end <= available => Ok(View {
                buf: self.buf,
                start: self.start + start as u32,
                len: len as u32,
            }),
            _ => Err(ViewError::OutOfRange {
                start,
                len,
                available,
            }),
        }
    }

    /// Suffix starting at `start` (relative to this view).
    pub fn tail(&self, start: usize) -> Result<View<'a>, ViewError> {
        let len = (self.len as usize).checked_sub(start).ok_or(ViewError::OutOfRange {
            start,
            len: 0,
            available: self.len as usize,
        })?;
        self.slice(start, len)
    }

    /// Byte at relative index `i`.
    pub fn byte_at(&self, i: usize) -> Result<u8, ViewError> {
        self.get(i).ok_or(ViewError::OutOfRange {
            start: i,
            len: 1,
            available: self.len as usize,
        })
    }

    /// Byte at relative index `i`, or `None` past the end.
    #[inline]
    pub fn get(&self, i: usize) -> Option<u8> {
        self.as_bytes().get(i).copied()
    }

    /// Read-only byte window.
    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        let start = self.start as usize;
        &self.buf[start..start + self.len as usize]
    }

    /// Borrowing UTF-8 check. Does not allocate.
    pub fn as_str(&self) -> Result<&'a str, ViewError> {
        std::str::from_utf8(self.as_bytes()).map_err(|e| ViewError::InvalidUtf8 {
            offset: e.valid_up_to(),
        })
    }

    /// Decode to an owned `String`, replacing invalid sequences.
    ///
    /// This is the only allocating operation on a view.
    pub fn to_owned_string(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }

    /// Absolute offset of this view within the underlying buffer.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.start
    }

    /// Absolute span of this view within the underlying buffer.
    #[inline]
    pub fn span(&self) -> Span {
        Span::new(self.start, self.start + self.len)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.as_bytes().starts_with(prefix)
    }
}

impl PartialEq for View<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for View<'_> {}

impl Hash for View<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl fmt::Debug for View<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "View({:?} @ {})",
            String::from_utf8_lossy(self.as_bytes()),
            self.span()
        )
    }
}

#[cfg(test)]
mod tests;
