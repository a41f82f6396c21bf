//! Cascade depth guard.
//!
//! Publishing may recursively trigger dispatch → append → publish cascades,
//! which run depth-first on the caller's stack. Each thread owns its dispatch
//! stack, so the depth counter is thread-local. A wiring cycle (an adapter
//! whose command eventually re-emits its own source event) would otherwise
//! recurse until the stack overflows.

use std::cell::Cell;
use std::marker::PhantomData;

use crate::error::ChoreographyError;

pub const DEFAULT_CASCADE_DEPTH_LIMIT: usize = 64;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// RAII token for one level of nested dispatch.
///
/// Not `Send`: it must be dropped on the thread that entered it.
#[derive(Debug)]
pub struct CascadeGuard {
    depth: usize,
    _not_send: PhantomData<*const ()>,
}

impl CascadeGuard {
    /// Enter one more level, failing once `limit` nested levels are active.
    pub fn enter(limit: usize) -> Result<Self, ChoreographyError> {
        DEPTH.with(|d| {
            let next = d.get() + 1;
            if next > limit {
                return Err(ChoreographyError::CascadeDepthExceeded { limit });
            }
            d.set(next);
            Ok(Self {
                depth: next,
                _not_send: PhantomData,
            })
        })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Current nesting depth on this thread (0 outside any dispatch).
    pub fn current() -> usize {
        DEPTH.with(Cell::get)
    }
}

impl Drop for CascadeGuard {
    fn drop(&mut self) {
        DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}
