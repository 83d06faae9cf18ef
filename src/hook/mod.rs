//! Key hook capabilities and the reservation state machine.

mod error;
mod platform;
mod refcount;
mod share;
mod state_keeper;
mod types;

pub use error::HookError;
pub use platform::{NullPlatformHook, PlatformKeyHook, SyncKeyHook};
pub use refcount::RefCountedKeyHook;
pub use share::KeyHookShareWrapper;
pub use state_keeper::KeyHookStateKeeper;
pub use types::{
    is_valid_key_code, KeyCode, KeyEventType, ModifierFlags, PlatformKeyEvent, KEY_CODE_COUNT,
};

use std::sync::Arc;

use tokio::sync::oneshot;

/// Completion for an asynchronous hook operation; `true` means the codes are held.
pub type ResultCallback = Box<dyn FnOnce(bool) + Send + 'static>;

pub(crate) fn report(on_result: Option<ResultCallback>, success: bool) {
    if let Some(callback) = on_result {
        callback(success);
    }
}

/// Callback paired with a receiver for its result.
///
/// Dropping the callback without calling it closes the receiver, which
/// callers should read as a failure.
pub fn completion_channel() -> (ResultCallback, oneshot::Receiver<bool>) {
    let (tx, rx) = oneshot::channel();
    let callback: ResultCallback = Box::new(move |success| {
        let _ = tx.send(success);
    });
    (callback, rx)
}

/// Decides whether a key event is consumed before it reaches default handling.
///
/// May be called from the platform-event thread.
pub trait KeyEventFilter: Send + Sync {
    fn on_key_down(&self, code: KeyCode, flags: ModifierFlags) -> bool;
    fn on_key_up(&self, code: KeyCode, flags: ModifierFlags) -> bool;

    fn on_key_event(&self, kind: KeyEventType, code: KeyCode, flags: ModifierFlags) -> bool {
        match kind {
            KeyEventType::KeyDown => self.on_key_down(code, flags),
            KeyEventType::KeyUp => self.on_key_up(code, flags),
        }
    }
}

/// Asynchronous registration of key codes with the OS (or a forwarding target).
///
/// `codes` must not contain duplicates. Every call completes through
/// `on_result` when it is present.
pub trait KeyHook: Send + Sync {
    fn register_key(&self, codes: &[KeyCode], on_result: Option<ResultCallback>);
    fn unregister_key(&self, codes: &[KeyCode], on_result: Option<ResultCallback>);
}

/// A [`KeyHook`] that can flush or withdraw everything registered through it.
pub trait KeyHookActivator: KeyHook {
    fn activate(&self, on_result: Option<ResultCallback>);
    fn deactivate(&self, on_result: Option<ResultCallback>);
    fn is_key_reserved(&self, code: KeyCode) -> bool;
}

impl<T: KeyEventFilter + ?Sized> KeyEventFilter for Arc<T> {
    fn on_key_down(&self, code: KeyCode, flags: ModifierFlags) -> bool {
        (**self).on_key_down(code, flags)
    }

    fn on_key_up(&self, code: KeyCode, flags: ModifierFlags) -> bool {
        (**self).on_key_up(code, flags)
    }
}

impl<T: KeyHook + ?Sized> KeyHook for Arc<T> {
    fn register_key(&self, codes: &[KeyCode], on_result: Option<ResultCallback>) {
        (**self).register_key(codes, on_result)
    }

    fn unregister_key(&self, codes: &[KeyCode], on_result: Option<ResultCallback>) {
        (**self).unregister_key(codes, on_result)
    }
}

impl<T: KeyHookActivator + ?Sized> KeyHookActivator for Arc<T> {
    fn activate(&self, on_result: Option<ResultCallback>) {
        (**self).activate(on_result)
    }

    fn deactivate(&self, on_result: Option<ResultCallback>) {
        (**self).deactivate(on_result)
    }

    fn is_key_reserved(&self, code: KeyCode) -> bool {
        (**self).is_key_reserved(code)
    }
}

#[cfg(test)]
pub(crate) mod testing;
