use parking_lot::Mutex;
use tracing::{debug, warn};

use super::error::HookError;
use super::types::{is_valid_key_code, KeyCode, KEY_CODE_COUNT};
use super::{report, KeyHook, ResultCallback};

/// Lets several owners hold the same codes on one hook.
///
/// A code reaches the wrapped hook when its first holder registers it and
/// leaves when its last holder unregisters it. Unregistering a code that is
/// not held is ignored.
pub struct RefCountedKeyHook {
    key_hook: Box<dyn KeyHook>,
    holders: Mutex<[u32; KEY_CODE_COUNT]>,
}

impl RefCountedKeyHook {
    pub fn new(key_hook: Box<dyn KeyHook>) -> Self {
        Self {
            key_hook,
            holders: Mutex::new([0; KEY_CODE_COUNT]),
        }
    }

    pub fn holders(&self, code: KeyCode) -> u32 {
        if !is_valid_key_code(code) {
            return 0;
        }
        self.holders.lock()[code as usize]
    }

    fn first_out_of_range(codes: &[KeyCode]) -> Option<HookError> {
        codes
            .iter()
            .find(|code| !is_valid_key_code(**code))
            .map(|code| HookError::OutOfRange(*code))
    }
}

impl KeyHook for RefCountedKeyHook {
    fn register_key(&self, codes: &[KeyCode], on_result: Option<ResultCallback>) {
        if let Some(err) = Self::first_out_of_range(codes) {
            warn!(target: "key_hook", %err, "rejecting shared registration");
            report(on_result, false);
            return;
        }

        let first: Vec<KeyCode> = {
            let mut holders = self.holders.lock();
            codes
                .iter()
                .copied()
                .filter(|code| {
                    let count = &mut holders[*code as usize];
                    *count += 1;
                    *count == 1
                })
                .collect()
        };

        if first.is_empty() {
            debug!(target: "key_hook", ?codes, "codes already held by another owner");
            report(on_result, true);
        } else {
            self.key_hook.register_key(&first, on_result);
        }
    }

    fn unregister_key(&self, codes: &[KeyCode], on_result: Option<ResultCallback>) {
        if let Some(err) = Self::first_out_of_range(codes) {
            warn!(target: "key_hook", %err, "rejecting shared unregistration");
            report(on_result, false);
            return;
        }

        let last: Vec<KeyCode> = {
            let mut holders = self.holders.lock();
            codes
                .iter()
                .copied()
                .filter(|code| {
                    let count = &mut holders[*code as usize];
                    if *count == 0 {
                        return false;
                    }
                    *count -= 1;
                    *count == 0
                })
                .collect()
        };

        if last.is_empty() {
            debug!(target: "key_hook", ?codes, "codes still held by another owner");
            report(on_result, true);
        } else {
            self.key_hook.unregister_key(&last, on_result);
        }
    }
}
