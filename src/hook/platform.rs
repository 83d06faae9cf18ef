use tracing::debug;

use super::error::HookError;
use super::types::KeyCode;
use super::{report, KeyHook, ResultCallback};
use crate::telemetry::events::record_platform_hook_failure;

/// Synchronous OS hook primitives (`SetWindowsHookEx`, `XGrabKey`, ...).
pub trait PlatformKeyHook: Send + Sync {
    fn register_keys(&self, codes: &[KeyCode]) -> Result<(), HookError>;
    fn unregister_keys(&self, codes: &[KeyCode]) -> Result<(), HookError>;
}

/// Platform without keyboard lock support; every call fails.
#[derive(Debug, Default)]
pub struct NullPlatformHook;

impl PlatformKeyHook for NullPlatformHook {
    fn register_keys(&self, _codes: &[KeyCode]) -> Result<(), HookError> {
        Err(HookError::Unsupported)
    }

    fn unregister_keys(&self, _codes: &[KeyCode]) -> Result<(), HookError> {
        Err(HookError::Unsupported)
    }
}

/// Adapts a [`PlatformKeyHook`] to the asynchronous [`KeyHook`] contract by
/// completing the callback before returning.
pub struct SyncKeyHook {
    platform: Box<dyn PlatformKeyHook>,
}

impl SyncKeyHook {
    pub fn new(platform: Box<dyn PlatformKeyHook>) -> Self {
        Self { platform }
    }

    fn complete(
        operation: &'static str,
        codes: &[KeyCode],
        result: Result<(), HookError>,
        on_result: Option<ResultCallback>,
    ) {
        match result {
            Ok(()) => {
                debug!(target: "key_hook", operation, ?codes, "platform hook call succeeded");
                report(on_result, true);
            }
            Err(err) => {
                record_platform_hook_failure(operation, codes, &err);
                report(on_result, false);
            }
        }
    }
}

impl KeyHook for SyncKeyHook {
    fn register_key(&self, codes: &[KeyCode], on_result: Option<ResultCallback>) {
        let result = self.platform.register_keys(codes);
        Self::complete("register", codes, result, on_result);
    }

    fn unregister_key(&self, codes: &[KeyCode], on_result: Option<ResultCallback>) {
        let result = self.platform.unregister_keys(codes);
        Self::complete("unregister", codes, result, on_result);
    }
}
