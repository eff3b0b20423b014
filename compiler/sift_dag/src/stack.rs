//! Stack growth for the recursive passes.
//!
//! Dag construction recurses once per step on a path, and the evaluators
//! recurse once per node or subpattern. Deeply nested patterns would
//! otherwise overflow the default thread stack.

/// If less than this remains, grow the stack.
const RED_ZONE: usize = 100 * 1024;

/// Space allocated per growth.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f` with at least [`RED_ZONE`] bytes of stack available.
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
