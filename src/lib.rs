//! Keyboard Lock
//!
//! Lets a browser tab reserve physical keys so that, while the tab is
//! focused or fullscreen, their events bypass the OS shortcuts and reach the
//! tab instead. One real OS hook per window is shared between every tab's
//! reservation set; only the active tab's set is ever live.

pub mod config;
pub mod hook;
pub mod host;
pub mod runtime;
pub mod telemetry;
pub mod tracker;

pub use config::KeyboardLockConfig;
pub use hook::{
    completion_channel, KeyCode, KeyEventFilter, KeyEventType, KeyHook, KeyHookActivator,
    ModifierFlags, PlatformKeyEvent, PlatformKeyHook, ResultCallback,
};
pub use host::{KeyboardLockHost, PlatformEventSink, TabContent, TabId, TabLookup};
pub use runtime::KeyboardLockRuntime;
