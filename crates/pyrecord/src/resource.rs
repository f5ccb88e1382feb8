//! Data recursion budget shared by repr, comparison, hashing and record conversion.
//!
//! Nested containers and records are traversed recursively. Without a bound, a
//! structure nested a few thousand levels deep, or two records that refer to
//! themselves, would overflow the Rust stack. Every traversal step takes one
//! level from a per-thread budget and gives it back when it returns.

use std::cell::Cell;

use crate::exception::{ExcType, RunResult};

/// Maximum recursion depth for data structure operations (repr, eq, hash, asdict).
///
/// Lower in debug builds, where each frame uses more stack.
#[cfg(debug_assertions)]
pub const MAX_DATA_RECURSION_DEPTH: usize = 100;

/// Maximum recursion depth for data structure operations (repr, eq, hash, asdict).
#[cfg(not(debug_assertions))]
pub const MAX_DATA_RECURSION_DEPTH: usize = 500;

thread_local! {
    static DATA_DEPTH_REMAINING: Cell<usize> = const { Cell::new(MAX_DATA_RECURSION_DEPTH) };
}

/// One level of data recursion; dropping it returns the level to the budget.
#[must_use = "the level is returned as soon as the guard is dropped"]
pub(crate) struct DataDepthGuard(());

impl DataDepthGuard {
    /// Takes one level from the budget.
    ///
    /// Fails with `RecursionError("maximum recursion depth exceeded {context}")`
    /// when the budget is spent.
    pub(crate) fn enter(context: &str) -> RunResult<Self> {
        DATA_DEPTH_REMAINING.with(|remaining| match remaining.get() {
            0 => Err(ExcType::recursion_error(context)),
            n => {
                remaining.set(n - 1);
                Ok(Self(()))
            }
        })
    }
}

impl Drop for DataDepthGuard {
    fn drop(&mut self) {
        DATA_DEPTH_REMAINING.with(|remaining| remaining.set(remaining.get() + 1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_is_returned_on_drop() {
        let guards: Vec<DataDepthGuard> = (0..MAX_DATA_RECURSION_DEPTH)
            .map(|_| DataDepthGuard::enter("in test").unwrap())
            .collect();
        let err = DataDepthGuard::enter("in test").err().unwrap();
        assert!(err.is(ExcType::RecursionError));
        assert_eq!(err.message(), Some("maximum recursion depth exceeded in test"));
        drop(guards);
        assert!(DataDepthGuard::enter("in test").is_ok());
    }
}
