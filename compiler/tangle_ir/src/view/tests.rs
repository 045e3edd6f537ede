#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use proptest::prelude::*;
use std::collections::hash_map::DefaultHasher;

fn hash_of(v: &View<'_>) -> u64 {
    let mut h = DefaultHasher::new();
    v.hash(&mut h);
    h.finish()
}

// === Slicing ===

#[test]
fn slice_narrows_and_tracks_offset() {
    let bytes = b"hello world";
    let view = View::new(bytes);
    let world = view.slice(6, 5).unwrap();
    assert_eq!(world.as_bytes(), b"world");
    assert_eq!(world.offset(), 6);
    assert_eq!(world.span(), Span::new(6, 11));

    let orl = world.slice(1, 3).unwrap();
    assert_eq!(orl.as_bytes(), b"orl");
    assert_eq!(orl.offset(), 7);
}

#[test]
fn slice_past_end_is_out_of_range() {
    let view = View::new(b"abc");
    assert_eq!(
        view.slice(2, 2),
        Err(ViewError::OutOfRange {
            start: 2,
            len: 2,
            available: 3
        })
    );
    assert!(view.slice(usize::MAX, 2).is_err());
    assert!(view.slice(3, 0).unwrap().is_empty());
}

#[test]
fn nested_slice_cannot_widen() {
    let view = View::new(b"abcdef");
    let inner = view.slice(1, 2).unwrap();
    assert!(inner.slice(0, 3).is_err());
    assert!(inner.tail(3).is_err());
    assert_eq!(inner.tail(1).unwrap().as_bytes(), b"c");
}

// === Byte access ===

#[test]
fn byte_at_bounds() {
    let view = View::new(b"xyz").slice(1, 2).unwrap();
    assert_eq!(view.byte_at(0).unwrap(), b'y');
    assert_eq!(view.byte_at(1).unwrap(), b'z');
    assert!(matches!(
        view.byte_at(2),
        Err(ViewError::OutOfRange { start: 2, .. })
    ));
}

// === Equality is by content ===

#[test]
fn equality_and_hash_by_content() {
    let a = b"abab";
    let view = View::new(a);
    let first = view.slice(0, 2).unwrap();
    let second = view.slice(2, 2).unwrap();
    assert_eq!(first, second);
    assert_eq!(hash_of(&first), hash_of(&second));
    assert_ne!(first.offset(), second.offset());

    let other = View::new(b"ab");
    assert_eq!(first, other);
}

// === Decoding ===

#[test]
fn as_str_borrows_and_rejects_invalid() {
    let view = View::from_str_bytes("h\u{e9}llo");
    assert_eq!(view.as_str().unwrap(), "h\u{e9}llo");

    let bad = [b'a', 0xFF, b'b'];
    let view = View::new(&bad);
    assert_eq!(view.as_str(), Err(ViewError::InvalidUtf8 { offset: 1 }));
    assert_eq!(view.to_owned_string(), "a\u{FFFD}b");
}

proptest! {
    #[test]
    fn slice_matches_std_slicing(
        bytes in proptest::collection::vec(any::<u8>(), 0..64),
        start in 0usize..80,
        len in 0usize..80,
    ) {
        let view = View::new(&bytes);
        match view.slice(start, len) {
            Ok(sub) => {
                prop_assert!(start + len <= bytes.len());
                prop_assert_eq!(sub.as_bytes(), &bytes[start..start + len]);
                prop_assert_eq!(sub.offset() as usize, start);
            }
            Err(ViewError::OutOfRange { .. }) => prop_assert!(start + len > bytes.len()),
            Err(other) => prop_assert!(false, "unexpected error {other:?}"),
        }
    }
}
