//! Stack growth for recursive walks over parser stacks.
//!
//! Viability checks recurse once per stack entry they look through, and a
//! parser stack is as deep as the input is long. Wrapping each level in
//! [`ensure_sufficient_stack`] moves the walk onto a fresh segment when the
//! current one runs low.
//!
//! On native targets this is `stacker::maybe_grow`; on `wasm32` the closure
//! runs as is.

/// Grow when less than this much stack is left.
const RED_ZONE: usize = 128 * 1024;

/// Size of each new stack segment.
const SEGMENT: usize = 2 * 1024 * 1024;

/// Run `f`, first switching to a new stack segment if the current one is
/// nearly exhausted.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests;
