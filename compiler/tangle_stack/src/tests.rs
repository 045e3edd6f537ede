#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;

/// A singly linked chain, walked recursively.
enum Chain {
    Link(Box<Chain>),
    End,
}

fn depth(chain: &Chain) -> usize {
    ensure_sufficient_stack(|| match chain {
        Chain::Link(rest) => depth(rest) + 1,
        Chain::End => 0,
    })
}

fn chain(len: usize) -> Chain {
    (0..len).fold(Chain::End, |rest, _| Chain::Link(Box::new(rest)))
}

fn drop_iteratively(mut chain: Chain) {
    while let Chain::Link(rest) = chain {
        chain = *rest;
    }
}

// === Growth ===

#[test]
fn passes_the_result_through() {
    assert_eq!(ensure_sufficient_stack(|| "done"), "done");
    let parsed: Result<u8, std::num::ParseIntError> = ensure_sufficient_stack(|| "7".parse());
    assert_eq!(parsed.unwrap(), 7);
}

#[test]
fn deep_recursion_does_not_overflow() {
    let long = chain(250_000);
    assert_eq!(depth(&long), 250_000);
    drop_iteratively(long);
}
