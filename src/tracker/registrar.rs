use std::sync::Weak;

use crate::hook::{KeyCode, KeyEventFilter, KeyHook, KeyHookActivator, ResultCallback};

use super::ActiveKeyEventFilterTracker;

/// Publishes `filter` to the tracker whenever the wrapped activator is
/// activated, and withdraws it on deactivation or drop.
///
/// `filter` and `key_hook` describe the same tab; the tracker must outlive
/// the registrar for the publication to take effect.
pub struct ActiveKeyEventFilterRegistrar {
    key_hook: Box<dyn KeyHookActivator>,
    filter: Weak<dyn KeyEventFilter>,
    tracker: Weak<ActiveKeyEventFilterTracker>,
}

impl ActiveKeyEventFilterRegistrar {
    pub fn new(
        key_hook: Box<dyn KeyHookActivator>,
        filter: Weak<dyn KeyEventFilter>,
        tracker: Weak<ActiveKeyEventFilterTracker>,
    ) -> Self {
        Self {
            key_hook,
            filter,
            tracker,
        }
    }
}

impl KeyHook for ActiveKeyEventFilterRegistrar {
    fn register_key(&self, codes: &[KeyCode], on_result: Option<ResultCallback>) {
        self.key_hook.register_key(codes, on_result);
    }

    fn unregister_key(&self, codes: &[KeyCode], on_result: Option<ResultCallback>) {
        self.key_hook.unregister_key(codes, on_result);
    }
}

impl KeyHookActivator for ActiveKeyEventFilterRegistrar {
    fn activate(&self, on_result: Option<ResultCallback>) {
        self.key_hook.activate(on_result);
        if let Some(tracker) = self.tracker.upgrade() {
            tracker.set(&self.filter);
        }
    }

    fn deactivate(&self, on_result: Option<ResultCallback>) {
        self.key_hook.deactivate(on_result);
        if let Some(tracker) = self.tracker.upgrade() {
            tracker.erase(&self.filter);
        }
    }

    fn is_key_reserved(&self, code: KeyCode) -> bool {
        self.key_hook.is_key_reserved(code)
    }
}

impl Drop for ActiveKeyEventFilterRegistrar {
    fn drop(&mut self) {
        if let Some(tracker) = self.tracker.upgrade() {
            tracker.erase(&self.filter);
        }
    }
}
