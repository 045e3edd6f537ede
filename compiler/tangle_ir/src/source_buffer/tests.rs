#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;

fn kinds(buf: &SourceBuffer) -> Vec<EncodingIssueKind> {
    buf.encoding_issues().iter().map(|i| i.kind).collect()
}

// === Clean input ===

#[test]
fn empty_buffer() {
    let buf = SourceBuffer::from_text("");
    assert!(buf.is_empty());
    assert!(buf.view().is_empty());
    assert!(buf.encoding_issues().is_empty());
}

#[test]
fn multibyte_text_is_clean() {
    let text = "x = \u{1F600};";
    let buf = SourceBuffer::from_text(text);
    assert_eq!(buf.len() as usize, text.len());
    assert_eq!(buf.as_bytes(), text.as_bytes());
    assert!(buf.is_utf8());
    assert!(buf.encoding_issues().is_empty());
}

// === Byte order marks ===

#[test]
fn content_skips_utf8_bom() {
    let buf = SourceBuffer::from_text("\u{FEFF}abc");
    assert_eq!(kinds(&buf), vec![EncodingIssueKind::Utf8Bom]);
    assert_eq!(buf.encoding_issues()[0].span, Span::new(0, 3));
    assert!(buf.is_utf8());

    let content = buf.content();
    assert_eq!(content.as_bytes(), b"abc");
    assert_eq!(content.offset(), 3);
    assert_eq!(buf.view().len(), 6);
}

#[test]
fn utf16_bom_is_not_utf8() {
    let buf = SourceBuffer::new(vec![0xFF, 0xFE, b'h', 0]);
    assert_eq!(
        kinds(&buf),
        vec![
            EncodingIssueKind::Utf16LeBom,
            EncodingIssueKind::Nul,
            EncodingIssueKind::InvalidUtf8
        ]
    );
    assert!(!buf.is_utf8());
    assert_eq!(buf.content().len(), 4);
}

// === NUL and invalid bytes ===

#[test]
fn every_nul_is_reported() {
    let buf = SourceBuffer::from_text("\0ab\0c\0");
    let at: Vec<u32> = buf.encoding_issues().iter().map(|i| i.span.start).collect();
    assert_eq!(at, vec![0, 3, 5]);
}

#[test]
fn first_invalid_sequence_only() {
    let buf = SourceBuffer::new(vec![b'a', 0xC3, b'(', 0xFF]);
    assert_eq!(
        buf.encoding_issues(),
        &[EncodingIssue {
            kind: EncodingIssueKind::InvalidUtf8,
            span: Span::new(1, 2),
        }]
    );
}

#[test]
fn truncated_sequence_runs_to_the_end() {
    let buf = SourceBuffer::new(vec![b'x', 0xF0, 0x9F]);
    assert_eq!(buf.encoding_issues()[0].span, Span::new(1, 3));
}
