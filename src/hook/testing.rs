use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{
    report, HookError, KeyCode, KeyEventFilter, KeyEventType, KeyHook, ModifierFlags,
    PlatformKeyHook, ResultCallback,
};

#[derive(Default)]
struct HookLog {
    register_calls: Vec<Vec<KeyCode>>,
    unregister_calls: Vec<Vec<KeyCode>>,
    registered: BTreeSet<KeyCode>,
    fail_register: bool,
}

/// Key hook that completes inline and remembers every call.
#[derive(Clone, Default)]
pub(crate) struct RecordingKeyHook {
    log: Arc<Mutex<HookLog>>,
}

impl RecordingKeyHook {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail_register(&self, fail: bool) {
        self.log.lock().fail_register = fail;
    }

    pub(crate) fn register_count(&self) -> usize {
        self.log.lock().register_calls.len()
    }

    pub(crate) fn unregister_count(&self) -> usize {
        self.log.lock().unregister_calls.len()
    }

    pub(crate) fn register_calls(&self) -> Vec<Vec<KeyCode>> {
        self.log.lock().register_calls.clone()
    }

    pub(crate) fn unregister_calls(&self) -> Vec<Vec<KeyCode>> {
        self.log.lock().unregister_calls.clone()
    }

    pub(crate) fn is_registered(&self, code: KeyCode) -> bool {
        self.log.lock().registered.contains(&code)
    }

    pub(crate) fn registered(&self) -> Vec<KeyCode> {
        self.log.lock().registered.iter().copied().collect()
    }
}

impl KeyHook for RecordingKeyHook {
    fn register_key(&self, codes: &[KeyCode], on_result: Option<ResultCallback>) {
        let success = {
            let mut log = self.log.lock();
            log.register_calls.push(codes.to_vec());
            if !log.fail_register {
                log.registered.extend(codes.iter().copied());
            }
            !log.fail_register
        };
        report(on_result, success);
    }

    fn unregister_key(&self, codes: &[KeyCode], on_result: Option<ResultCallback>) {
        {
            let mut log = self.log.lock();
            log.unregister_calls.push(codes.to_vec());
            for code in codes {
                log.registered.remove(code);
            }
        }
        report(on_result, true);
    }
}

/// Filter that consumes everything it sees and records it.
#[derive(Clone, Default)]
pub(crate) struct RecordingFilter {
    events: Arc<Mutex<Vec<(KeyEventType, KeyCode, ModifierFlags)>>>,
}

impl RecordingFilter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn events(&self) -> Vec<(KeyEventType, KeyCode, ModifierFlags)> {
        self.events.lock().clone()
    }
}

impl KeyEventFilter for RecordingFilter {
    fn on_key_down(&self, code: KeyCode, flags: ModifierFlags) -> bool {
        self.events.lock().push((KeyEventType::KeyDown, code, flags));
        true
    }

    fn on_key_up(&self, code: KeyCode, flags: ModifierFlags) -> bool {
        self.events.lock().push((KeyEventType::KeyUp, code, flags));
        true
    }
}

#[derive(Default)]
struct PlatformLog {
    registered: BTreeSet<KeyCode>,
    calls: Vec<(&'static str, Vec<KeyCode>, String)>,
    reject: bool,
}

/// OS hook stand-in that records which thread each call ran on.
#[derive(Clone, Default)]
pub(crate) struct RecordingPlatformHook {
    log: Arc<Mutex<PlatformLog>>,
}

impl RecordingPlatformHook {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn rejecting() -> Self {
        let hook = Self::default();
        hook.log.lock().reject = true;
        hook
    }

    pub(crate) fn registered(&self) -> Vec<KeyCode> {
        self.log.lock().registered.iter().copied().collect()
    }

    pub(crate) fn call_threads(&self) -> Vec<String> {
        self.log
            .lock()
            .calls
            .iter()
            .map(|(_, _, thread)| thread.clone())
            .collect()
    }

    pub(crate) fn calls(&self) -> Vec<(&'static str, Vec<KeyCode>)> {
        self.log
            .lock()
            .calls
            .iter()
            .map(|(operation, codes, _)| (*operation, codes.clone()))
            .collect()
    }

    fn record(&self, operation: &'static str, codes: &[KeyCode]) -> bool {
        let thread = std::thread::current()
            .name()
            .unwrap_or_default()
            .to_string();
        let mut log = self.log.lock();
        log.calls.push((operation, codes.to_vec(), thread));
        !log.reject
    }
}

impl PlatformKeyHook for RecordingPlatformHook {
    fn register_keys(&self, codes: &[KeyCode]) -> Result<(), HookError> {
        if !self.record("register", codes) {
            return Err(HookError::rejected("grab refused"));
        }
        self.log.lock().registered.extend(codes.iter().copied());
        Ok(())
    }

    fn unregister_keys(&self, codes: &[KeyCode]) -> Result<(), HookError> {
        if !self.record("unregister", codes) {
            return Err(HookError::rejected("ungrab refused"));
        }
        let mut log = self.log.lock();
        for code in codes {
            log.registered.remove(code);
        }
        Ok(())
    }
}
