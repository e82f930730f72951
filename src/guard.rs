//! Debug-only exclusivity guard.
//!
//! Containers in this crate call user code (comparators, hashers, key
//! equality) while their list/index pair may be transiently inconsistent.
//! Each container embeds an `Exclusion` and brackets its public entry
//! points with `let _g = self.guard.enter();`. In debug builds a nested
//! entry panics immediately instead of corrupting state; in release
//! builds the guard compiles to nothing.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-container exclusivity flag. Also carries a raw-pointer marker so
/// containers stay `!Send`/`!Sync`, matching the single-owner model.
#[derive(Debug, Default)]
pub(crate) struct Exclusion {
    #[cfg(debug_assertions)]
    busy: Cell<bool>,
    _single_thread: PhantomData<*mut ()>,
}

impl Exclusion {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            busy: Cell::new(false),
            _single_thread: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn enter(&self) -> ExclusionToken<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.busy.replace(true),
                "container re-entered while an operation is in progress"
            );
            ExclusionToken { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            ExclusionToken {
                _lt: PhantomData,
            }
        }
    }
}

// A cloned container starts with its own idle flag.
impl Clone for Exclusion {
    fn clone(&self) -> Self {
        Self::new()
    }
}

pub(crate) struct ExclusionToken<'a> {
    #[cfg(debug_assertions)]
    owner: &'a Exclusion,
    #[cfg(not(debug_assertions))]
    _lt: PhantomData<&'a ()>,
}

impl Drop for ExclusionToken<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.owner.busy.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::Exclusion;

    #[test]
    fn sequential_entry_is_ok() {
        let e = Exclusion::new();
        drop(e.enter());
        drop(e.enter());
    }

    #[cfg(debug_assertions)]
    #[test]
    fn nested_entry_panics_in_debug() {
        let e = Exclusion::new();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _outer = e.enter();
            let _inner = e.enter();
        }));
        assert!(res.is_err(), "nested entry must panic in debug builds");
    }
}
