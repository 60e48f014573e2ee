//! Conversion scope management.
//!
//! A [`ConversionScope`] marks the current thread as "converting" for as long
//! as the guard lives. Building priors must happen with no scope active, so
//! callers check [`ConversionScope::ensure_inactive`] before doing so.
//!
//! ```ignore
//! let data = {
//!     let _scope = ConversionScope::enter();
//!     convert()?
//! }; // scope released here, also on early return or panic
//! ```

use std::cell::Cell;
use std::marker::PhantomData;

use crate::error::{BridgeError, Result};

thread_local! {
    /// Nesting depth of open scopes on this thread.
    static SCOPE_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// RAII guard for an active conversion.
#[derive(Debug)]
pub struct ConversionScope {
    depth: usize,
    // Scopes are per-thread; keep the guard on the thread that opened it.
    _marker: PhantomData<*mut ()>,
}

impl ConversionScope {
    /// Open a scope on the current thread.
    pub fn enter() -> Self {
        let depth = SCOPE_DEPTH.with(|d| {
            let next = d.get() + 1;
            d.set(next);
            next
        });
        log::trace!("conversion scope entered (depth {depth})");
        ConversionScope {
            depth,
            _marker: PhantomData,
        }
    }

    /// Run `f` inside a scope and release it afterwards.
    pub fn run<T>(f: impl FnOnce() -> T) -> T {
        let _scope = Self::enter();
        f()
    }

    /// Whether any scope is open on this thread.
    pub fn is_active() -> bool {
        Self::depth() > 0
    }

    /// Current nesting depth on this thread.
    pub fn depth() -> usize {
        SCOPE_DEPTH.with(|d| d.get())
    }

    /// Fail if a scope is open; `operation` names the caller in the error.
    pub fn ensure_inactive(operation: &str) -> Result<()> {
        if Self::is_active() {
            return Err(BridgeError::ScopeActive {
                operation: operation.to_string(),
            });
        }
        Ok(())
    }

    /// Whether this guard was opened inside another scope.
    pub fn is_nested(&self) -> bool {
        self.depth > 1
    }
}

impl Drop for ConversionScope {
    fn drop(&mut self) {
        SCOPE_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
        log::trace!("conversion scope released (depth {})", self.depth - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_is_released_on_drop() {
        assert!(!ConversionScope::is_active());
        {
            let scope = ConversionScope::enter();
            assert!(ConversionScope::is_active());
            assert!(!scope.is_nested());
        }
        assert!(!ConversionScope::is_active());
    }

    #[test]
    fn nested_scopes_track_depth() {
        let outer = ConversionScope::enter();
        let inner = ConversionScope::enter();
        assert_eq!(ConversionScope::depth(), 2);
        assert!(inner.is_nested());
        drop(inner);
        assert_eq!(ConversionScope::depth(), 1);
        drop(outer);
        assert_eq!(ConversionScope::depth(), 0);
    }

    #[test]
    fn scope_is_released_on_error() {
        let result: std::result::Result<(), &str> = ConversionScope::run(|| Err("boom"));
        assert!(result.is_err());
        assert!(!ConversionScope::is_active());
    }

    #[test]
    fn scope_is_released_on_panic() {
        let caught = std::panic::catch_unwind(|| {
            ConversionScope::run(|| panic!("conversion failed"));
        });
        assert!(caught.is_err());
        assert!(!ConversionScope::is_active());
    }

    #[test]
    fn ensure_inactive_rejects_open_scope() {
        assert!(ConversionScope::ensure_inactive("prior construction").is_ok());
        let _scope = ConversionScope::enter();
        let err = ConversionScope::ensure_inactive("prior construction").unwrap_err();
        assert!(matches!(err, BridgeError::ScopeActive { .. }));
    }
}
