//! Control/platform thread plumbing.

mod proxy;
mod thread;
mod wrapper;

pub use proxy::{HookCommand, KeyEventFilterThreadProxy, KeyHookActivatorThreadProxy};
pub use thread::{EventThread, Task, TaskRunner, ThreadBinding};
pub use wrapper::KeyHookThreadWrapper;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::config::KeyboardLockConfig;
use crate::hook::PlatformKeyHook;
use crate::host::{KeyboardLockHost, TabLookup};

/// Both event threads plus the host that runs on them.
pub struct KeyboardLockRuntime {
    host: KeyboardLockHost,
    control: EventThread,
    platform: EventThread,
}

impl KeyboardLockRuntime {
    pub fn start(
        config: KeyboardLockConfig,
        platform_hook: Box<dyn PlatformKeyHook>,
        tabs: Arc<dyn TabLookup>,
    ) -> Result<Self> {
        let control = EventThread::spawn(&config.control_thread_name)?;
        let platform = EventThread::spawn(&config.platform_thread_name)?;
        info!(
            target: "keyboard_lock_host",
            control = %config.control_thread_name,
            platform = %config.platform_thread_name,
            "starting keyboard lock runtime"
        );

        let host = KeyboardLockHost::new(
            &config,
            platform_hook,
            tabs,
            control.runner(),
            platform.runner(),
        )?;

        Ok(Self {
            host,
            control,
            platform,
        })
    }

    pub fn host(&self) -> &KeyboardLockHost {
        &self.host
    }

    pub fn control_runner(&self) -> TaskRunner {
        self.control.runner()
    }

    pub fn platform_runner(&self) -> TaskRunner {
        self.platform.runner()
    }

    /// Releases every reservation, then stops both threads.
    ///
    /// The platform thread stops first so its final replies still find the
    /// control thread running.
    pub fn shutdown(&mut self) {
        self.host.shutdown();
        self.platform.shutdown();
        self.control.shutdown();
    }
}

impl Drop for KeyboardLockRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}
