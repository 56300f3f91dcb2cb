//! Debug-only detector for re-entry from user `Hash`/`Eq` code.
//!
//! Probing and rehashing call into `K: Hash + Eq`. During a rehash the old
//! bucket array has already been moved out of the map, so a key whose
//! `Hash` or `Eq` impl reaches back into the same map would observe a
//! table with a nonzero `len` and no entries. Every such section holds a
//! `ProbeScope`; a nested scope on the same map panics in debug builds.
//! Release builds keep only a zero-sized marker.

use core::cell::Cell;
use core::marker::PhantomData;

#[derive(Debug)]
pub struct ProbeGuard {
    #[cfg(debug_assertions)]
    active: Cell<bool>,
    // The map is single-threaded; keep the guard (and so the map) !Sync.
    _unsync: PhantomData<Cell<()>>,
}

impl ProbeGuard {
    pub const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(false),
            _unsync: PhantomData,
        }
    }

    /// Opens a probe section. Panics in debug builds if one is already open.
    #[inline]
    pub fn enter(&self) -> ProbeScope<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.active.replace(true),
                "map re-entered from Hash/Eq while a probe was in progress"
            );
            ProbeScope { guard: self }
        }

        #[cfg(not(debug_assertions))]
        {
            ProbeScope { _pd: PhantomData }
        }
    }

    /// True while a probe section is open. Always false in release builds.
    pub fn is_active(&self) -> bool {
        #[cfg(debug_assertions)]
        {
            self.active.get()
        }
        #[cfg(not(debug_assertions))]
        {
            false
        }
    }
}

impl Default for ProbeGuard {
    fn default() -> Self {
        Self::new()
    }
}

// Each map owns its own guard; a clone starts outside any probe.
impl Clone for ProbeGuard {
    fn clone(&self) -> Self {
        Self::new()
    }
}

/// Closes the probe section on drop.
pub struct ProbeScope<'a> {
    #[cfg(debug_assertions)]
    guard: &'a ProbeGuard,
    #[cfg(not(debug_assertions))]
    _pd: PhantomData<&'a ()>,
}

impl Drop for ProbeScope<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.guard.active.set(false);
    }
}
