use std::sync::Weak;

use tracing::warn;

use super::types::KeyCode;
use super::{report, KeyHook, ResultCallback};

/// Lends a hook owned elsewhere to another state keeper.
///
/// Holds no ownership; once the shared hook is gone every call reports
/// `false`.
pub struct KeyHookShareWrapper {
    key_hook: Weak<dyn KeyHook>,
}

impl KeyHookShareWrapper {
    pub fn new(key_hook: Weak<dyn KeyHook>) -> Self {
        Self { key_hook }
    }
}

impl KeyHook for KeyHookShareWrapper {
    fn register_key(&self, codes: &[KeyCode], on_result: Option<ResultCallback>) {
        match self.key_hook.upgrade() {
            Some(key_hook) => key_hook.register_key(codes, on_result),
            None => {
                warn!(target: "key_hook", ?codes, "shared key hook released before register");
                report(on_result, false);
            }
        }
    }

    fn unregister_key(&self, codes: &[KeyCode], on_result: Option<ResultCallback>) {
        match self.key_hook.upgrade() {
            Some(key_hook) => key_hook.unregister_key(codes, on_result),
            None => {
                warn!(target: "key_hook", ?codes, "shared key hook released before unregister");
                report(on_result, false);
            }
        }
    }
}
