//! The single owned input buffer.
//!
//! Input is loaded once into a contiguous byte buffer. Every later stage
//! borrows [`View`]s from it, so lexer and parser paths share the bytes
//! without copying.
//!
//! Construction never rejects input. It records what looks wrong for the
//! engine's UTF-8 assumptions as [`EncodingIssue`]s and leaves the decision
//! to the caller:
//!
//! | Issue | Reported |
//! |---|---|
//! | UTF-8 byte order mark | once, at offset 0 |
//! | UTF-16 byte order mark (LE or BE) | once, at offset 0 |
//! | NUL byte | every occurrence |
//! | invalid UTF-8 | first occurrence only |

use crate::{Span, View};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Clone, Debug)]
pub struct SourceBuffer {
    bytes: Vec<u8>,
    issues: Vec<EncodingIssue>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodingIssue {
    pub kind: EncodingIssueKind,
    /// Offending bytes.
    pub span: Span,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EncodingIssueKind {
    Utf8Bom,
    Utf16LeBom,
    Utf16BeBom,
    Nul,
    InvalidUtf8,
}

impl SourceBuffer {
    /// Take ownership of `bytes`.
    ///
    /// Offsets are `u32`; anything past `u32::MAX` bytes is dropped.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        let mut bytes = bytes.into();
        bytes.truncate(u32::MAX as usize);
        let issues = encoding_issues(&bytes);
        SourceBuffer { bytes, issues }
    }

    pub fn from_text(text: &str) -> Self {
        Self::new(text.as_bytes())
    }

    /// View over every byte, including a byte order mark.
    pub fn view(&self) -> View<'_> {
        View::new(&self.bytes)
    }

    /// View over the content after a leading UTF-8 byte order mark.
    ///
    /// Offsets inside the returned view still count from the buffer start.
    pub fn content(&self) -> View<'_> {
        let view = self.view();
        if view.starts_with(UTF8_BOM) {
            view.tail(UTF8_BOM.len()).unwrap_or(view)
        } else {
            view
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> u32 {
        self.bytes.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn encoding_issues(&self) -> &[EncodingIssue] {
        &self.issues
    }

    pub fn is_utf8(&self) -> bool {
        !self.issues.iter().any(|i| {
            matches!(
                i.kind,
                EncodingIssueKind::InvalidUtf8
                    | EncodingIssueKind::Utf16LeBom
                    | EncodingIssueKind::Utf16BeBom
            )
        })
    }
}

fn issue(kind: EncodingIssueKind, start: usize, len: usize) -> EncodingIssue {
    EncodingIssue {
        kind,
        span: Span::new(start as u32, (start + len) as u32),
    }
}

fn encoding_issues(bytes: &[u8]) -> Vec<EncodingIssue> {
    let mut issues = Vec::new();

    let bom = if bytes.starts_with(UTF8_BOM) {
        Some((EncodingIssueKind::Utf8Bom, 3))
    } else if bytes.starts_with(&[0xFF, 0xFE]) {
        Some((EncodingIssueKind::Utf16LeBom, 2))
    } else if bytes.starts_with(&[0xFE, 0xFF]) {
        Some((EncodingIssueKind::Utf16BeBom, 2))
    } else {
        None
    };
    if let Some((kind, len)) = bom {
        issues.push(issue(kind, 0, len));
    }

    issues.extend(memchr::memchr_iter(0, bytes).map(|pos| issue(EncodingIssueKind::Nul, pos, 1)));

    if let Err(error) = std::str::from_utf8(bytes) {
        let start = error.valid_up_to();
        let len = error.error_len().unwrap_or(bytes.len() - start);
        issues.push(issue(EncodingIssueKind::InvalidUtf8, start, len));
    }
    issues
}

#[cfg(test)]
mod tests;
