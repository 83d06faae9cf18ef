use parking_lot::Mutex;
use tracing::{debug, warn};

use super::error::HookError;
use super::types::{is_valid_key_code, KeyCode, ModifierFlags, KEY_CODE_COUNT};
use super::{report, KeyEventFilter, KeyHook, KeyHookActivator, ResultCallback};

struct KeeperState {
    desired: [bool; KEY_CODE_COUNT],
    active: bool,
}

impl KeeperState {
    fn new() -> Self {
        Self {
            desired: [false; KEY_CODE_COUNT],
            active: false,
        }
    }

    fn is_desired(&self, code: KeyCode) -> bool {
        self.desired[code as usize]
    }

    fn desired_codes(&self) -> Vec<KeyCode> {
        self.desired
            .iter()
            .enumerate()
            .filter(|(_, desired)| **desired)
            .map(|(code, _)| code as KeyCode)
            .collect()
    }
}

/// Reconciles the codes a client asked for with what is registered through
/// the wrapped hook.
///
/// While inactive, register/unregister only touch local state. `activate`
/// flushes the whole desired set to the hook in one call and `deactivate`
/// withdraws and forgets it. Key events only reach the wrapped filter for
/// desired codes while active.
pub struct KeyHookStateKeeper {
    filter: Box<dyn KeyEventFilter>,
    key_hook: Box<dyn KeyHook>,
    state: Mutex<KeeperState>,
}

impl KeyHookStateKeeper {
    pub fn new(filter: Box<dyn KeyEventFilter>, key_hook: Box<dyn KeyHook>) -> Self {
        Self {
            filter,
            key_hook,
            state: Mutex::new(KeeperState::new()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    fn is_registered(&self, code: KeyCode) -> bool {
        if !is_valid_key_code(code) {
            return false;
        }
        let state = self.state.lock();
        state.active && state.is_desired(code)
    }

    fn reject_out_of_range(codes: &[KeyCode]) -> bool {
        match codes.iter().find(|code| !is_valid_key_code(**code)) {
            Some(code) => {
                let err = HookError::OutOfRange(*code);
                warn!(target: "key_hook", %err, "rejecting key hook request");
                true
            }
            None => false,
        }
    }

    /// Updates desired flags and returns the codes that must reach the hook,
    /// or `None` when the hook should not be called.
    fn apply(&self, codes: &[KeyCode], desired: bool) -> Option<Vec<KeyCode>> {
        let mut state = self.state.lock();
        let changed: Vec<KeyCode> = codes
            .iter()
            .copied()
            .filter(|code| state.is_desired(*code) != desired)
            .collect();
        for code in &changed {
            state.desired[*code as usize] = desired;
        }

        if state.active && !changed.is_empty() {
            Some(changed)
        } else {
            None
        }
    }
}

impl KeyHook for KeyHookStateKeeper {
    fn register_key(&self, codes: &[KeyCode], on_result: Option<ResultCallback>) {
        if Self::reject_out_of_range(codes) {
            report(on_result, false);
            return;
        }

        match self.apply(codes, true) {
            Some(pending) => self.key_hook.register_key(&pending, on_result),
            None => report(on_result, true),
        }
    }

    fn unregister_key(&self, codes: &[KeyCode], on_result: Option<ResultCallback>) {
        if Self::reject_out_of_range(codes) {
            report(on_result, false);
            return;
        }

        match self.apply(codes, false) {
            Some(pending) => self.key_hook.unregister_key(&pending, on_result),
            None => report(on_result, true),
        }
    }
}

impl KeyHookActivator for KeyHookStateKeeper {
    fn activate(&self, on_result: Option<ResultCallback>) {
        let pending = {
            let mut state = self.state.lock();
            if state.active {
                drop(state);
                report(on_result, true);
                return;
            }
            // Stays active even if the flush below fails.
            state.active = true;
            state.desired_codes()
        };

        debug!(target: "key_hook", codes = ?pending, "activating state keeper");
        if pending.is_empty() {
            report(on_result, true);
        } else {
            self.key_hook.register_key(&pending, on_result);
        }
    }

    fn deactivate(&self, on_result: Option<ResultCallback>) {
        let pending = {
            let mut state = self.state.lock();
            if !state.active {
                drop(state);
                report(on_result, true);
                return;
            }
            state.active = false;
            let codes = state.desired_codes();
            state.desired = [false; KEY_CODE_COUNT];
            codes
        };

        debug!(target: "key_hook", codes = ?pending, "deactivating state keeper");
        if pending.is_empty() {
            report(on_result, true);
        } else {
            self.key_hook.unregister_key(&pending, on_result);
        }
    }

    fn is_key_reserved(&self, code: KeyCode) -> bool {
        is_valid_key_code(code) && self.state.lock().is_desired(code)
    }
}

impl KeyEventFilter for KeyHookStateKeeper {
    fn on_key_down(&self, code: KeyCode, flags: ModifierFlags) -> bool {
        self.is_registered(code) && self.filter.on_key_down(code, flags)
    }

    fn on_key_up(&self, code: KeyCode, flags: ModifierFlags) -> bool {
        self.is_registered(code) && self.filter.on_key_up(code, flags)
    }
}

impl Drop for KeyHookStateKeeper {
    fn drop(&mut self) {
        self.deactivate(None);
    }
}
