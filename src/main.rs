use std::sync::Arc;

use anyhow::Result;
use keyboard_lock::hook::NullPlatformHook;
use keyboard_lock::telemetry::init_tracing;
use keyboard_lock::{
    completion_channel, KeyCode, KeyEventType, KeyboardLockConfig, KeyboardLockRuntime,
    ModifierFlags, PlatformKeyEvent, TabContent, TabId, TabLookup,
};
use tracing::{info, warn};

const PROBE_TAB: TabId = TabId(1);
const DEFAULT_PROBE_KEYS: &[&str] = &["Escape"];

/// Focused tab that logs whatever reaches it.
struct ProbeTab;

impl TabContent for ProbeTab {
    fn forward_key_event(&self, kind: KeyEventType, code: KeyCode, flags: ModifierFlags) -> bool {
        info!(kind = kind.as_str(), code, ?flags, "probe tab received key event");
        true
    }

    fn has_focus(&self) -> bool {
        true
    }
}

struct ProbeTabs {
    tab: Arc<dyn TabContent>,
}

impl TabLookup for ProbeTabs {
    fn content(&self, tab: TabId) -> Option<Arc<dyn TabContent>> {
        (tab == PROBE_TAB).then(|| Arc::clone(&self.tab))
    }
}

fn main() -> Result<()> {
    init_tracing()?;

    let config = KeyboardLockConfig::from_env()?;
    let keys: Vec<String> = if config.browser_reserved_keys.is_empty() {
        DEFAULT_PROBE_KEYS.iter().map(|key| key.to_string()).collect()
    } else {
        config.browser_reserved_keys.clone()
    };

    let tabs = Arc::new(ProbeTabs {
        tab: Arc::new(ProbeTab),
    });
    let mut runtime = KeyboardLockRuntime::start(config, Box::new(NullPlatformHook), tabs)?;
    let host = runtime.host();

    let (callback, rx) = completion_channel();
    host.set_reserved_key_codes(PROBE_TAB, &keys, Some(callback));
    let accepted = rx.blocking_recv().unwrap_or(false);
    if accepted {
        info!(keys = ?keys, "platform accepted the reservation");
    } else {
        warn!(keys = ?keys, "platform refused the reservation");
    }

    host.on_focus_changed(PROBE_TAB, true);
    if let Some(code) = host_first_reserved(&runtime) {
        let suppressed = host
            .event_sink()
            .on_platform_event(&PlatformKeyEvent::key_down(code, ModifierFlags::empty()));
        info!(code, suppressed, "delivered synthetic key event");
    }

    runtime.shutdown();
    Ok(())
}

fn host_first_reserved(runtime: &KeyboardLockRuntime) -> Option<KeyCode> {
    (0..keyboard_lock::hook::KEY_CODE_COUNT as KeyCode)
        .find(|code| runtime.host().is_key_reserved(PROBE_TAB, *code))
}
