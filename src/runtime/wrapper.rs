use parking_lot::Mutex;

use crate::hook::{
    KeyCode, KeyEventFilter, KeyHook, KeyHookActivator, ModifierFlags, ResultCallback,
};

struct WrappedHook {
    filter: Box<dyn KeyEventFilter>,
    activator: Box<dyn KeyHookActivator>,
}

/// A filter and an activator for the same hook, serialised behind one lock
/// so callers on either thread never overlap.
///
/// Neither half may call back into the wrapper synchronously.
pub struct KeyHookThreadWrapper {
    inner: Mutex<WrappedHook>,
}

impl KeyHookThreadWrapper {
    pub fn new(filter: Box<dyn KeyEventFilter>, activator: Box<dyn KeyHookActivator>) -> Self {
        Self {
            inner: Mutex::new(WrappedHook { filter, activator }),
        }
    }
}

impl KeyEventFilter for KeyHookThreadWrapper {
    fn on_key_down(&self, code: KeyCode, flags: ModifierFlags) -> bool {
        self.inner.lock().filter.on_key_down(code, flags)
    }

    fn on_key_up(&self, code: KeyCode, flags: ModifierFlags) -> bool {
        self.inner.lock().filter.on_key_up(code, flags)
    }
}

impl KeyHook for KeyHookThreadWrapper {
    fn register_key(&self, codes: &[KeyCode], on_result: Option<ResultCallback>) {
        self.inner.lock().activator.register_key(codes, on_result);
    }

    fn unregister_key(&self, codes: &[KeyCode], on_result: Option<ResultCallback>) {
        self.inner.lock().activator.unregister_key(codes, on_result);
    }
}

impl KeyHookActivator for KeyHookThreadWrapper {
    fn activate(&self, on_result: Option<ResultCallback>) {
        self.inner.lock().activator.activate(on_result);
    }

    fn deactivate(&self, on_result: Option<ResultCallback>) {
        self.inner.lock().activator.deactivate(on_result);
    }

    fn is_key_reserved(&self, code: KeyCode) -> bool {
        self.inner.lock().activator.is_key_reserved(code)
    }
}
