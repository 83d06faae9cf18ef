//! Per-window record of the one filter that receives OS-forwarded key events.

mod registrar;

pub use registrar::ActiveKeyEventFilterRegistrar;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::ThreadId;

use parking_lot::Mutex;
use tracing::debug;

use crate::hook::{KeyCode, KeyEventFilter, ModifierFlags};
use crate::runtime::ThreadBinding;

/// Single-slot registry of the active [`KeyEventFilter`].
///
/// Only usable from the thread it is bound to. The slot never owns the
/// filter, and `erase` clears it only when it still holds the filter being
/// erased, so activations and deactivations of different tabs can arrive
/// in any order.
pub struct ActiveKeyEventFilterTracker {
    binding: ThreadBinding,
    retired: AtomicBool,
    active: Mutex<Option<Weak<dyn KeyEventFilter>>>,
}

impl ActiveKeyEventFilterTracker {
    pub fn new() -> Self {
        Self::with_binding(ThreadBinding::current())
    }

    pub fn bound_to(owner: ThreadId) -> Self {
        Self::with_binding(ThreadBinding::bound_to(owner))
    }

    fn with_binding(binding: ThreadBinding) -> Self {
        Self {
            binding,
            retired: AtomicBool::new(false),
            active: Mutex::new(None),
        }
    }

    /// Empties the slot for good, for use once the bound thread has
    /// stopped. Later calls from any thread do nothing.
    pub fn retire(&self) {
        self.retired.store(true, Ordering::SeqCst);
        *self.active.lock() = None;
        debug!(target: "active_filter_tracker", "tracker retired");
    }

    fn usable(&self) -> bool {
        if self.retired.load(Ordering::SeqCst) {
            return false;
        }
        self.binding.assert_current();
        true
    }

    pub fn set(&self, filter: &Weak<dyn KeyEventFilter>) {
        if !self.usable() {
            return;
        }
        debug!(target: "active_filter_tracker", "active filter replaced");
        *self.active.lock() = Some(filter.clone());
    }

    pub fn erase(&self, filter: &Weak<dyn KeyEventFilter>) {
        if !self.usable() {
            return;
        }
        let mut active = self.active.lock();
        if active
            .as_ref()
            .is_some_and(|current| same_filter(current, filter))
        {
            debug!(target: "active_filter_tracker", "active filter cleared");
            *active = None;
        }
    }

    /// The active filter, if one is set and still alive.
    pub fn active(&self) -> Option<Arc<dyn KeyEventFilter>> {
        if !self.usable() {
            return None;
        }
        self.active.lock().as_ref().and_then(Weak::upgrade)
    }

    pub fn is_active(&self, filter: &Weak<dyn KeyEventFilter>) -> bool {
        self.usable()
            && self
                .active
                .lock()
                .as_ref()
                .is_some_and(|current| same_filter(current, filter))
    }
}

impl Default for ActiveKeyEventFilterTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyEventFilter for ActiveKeyEventFilterTracker {
    fn on_key_down(&self, code: KeyCode, flags: ModifierFlags) -> bool {
        self.active()
            .is_some_and(|filter| filter.on_key_down(code, flags))
    }

    fn on_key_up(&self, code: KeyCode, flags: ModifierFlags) -> bool {
        self.active()
            .is_some_and(|filter| filter.on_key_up(code, flags))
    }
}

fn same_filter(a: &Weak<dyn KeyEventFilter>, b: &Weak<dyn KeyEventFilter>) -> bool {
    std::ptr::addr_eq(a.as_ptr(), b.as_ptr())
}

#[cfg(test)]
mod tests;
