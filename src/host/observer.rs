use std::sync::Weak;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::hook::ResultCallback;
use crate::telemetry::events::record_activation;

use super::collection::KeyHookActivatorCollection;
use super::content::TabId;

/// Window-system signal about one tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSignal {
    FocusChanged(bool),
    FullscreenChanged(bool),
    Destroyed,
}

impl PageSignal {
    fn trigger(&self) -> &'static str {
        match self {
            PageSignal::FocusChanged(_) => "focus",
            PageSignal::FullscreenChanged(_) => "fullscreen",
            PageSignal::Destroyed => "destroyed",
        }
    }
}

/// What the owner should do with an observer after a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverDisposition {
    Keep,
    Detach,
}

/// Turns one tab's focus and fullscreen changes into activation of its
/// entry in the collection.
pub struct PageObserver {
    tab: TabId,
    collection: Weak<Mutex<KeyHookActivatorCollection>>,
}

impl PageObserver {
    pub fn new(tab: TabId, collection: Weak<Mutex<KeyHookActivatorCollection>>) -> Self {
        Self { tab, collection }
    }

    pub fn tab(&self) -> TabId {
        self.tab
    }

    pub fn handle(&self, signal: PageSignal) -> ObserverDisposition {
        match signal {
            PageSignal::FocusChanged(active) | PageSignal::FullscreenChanged(active) => {
                self.set_active(active, signal.trigger())
            }
            PageSignal::Destroyed => {
                self.on_destroyed();
                ObserverDisposition::Detach
            }
        }
    }

    fn set_active(&self, active: bool, trigger: &'static str) -> ObserverDisposition {
        let Some(collection) = self.collection.upgrade() else {
            return ObserverDisposition::Detach;
        };
        let collection = collection.lock();
        let Some(activator) = collection.find(self.tab) else {
            debug!(target: "page_observer", tab = %self.tab, "reservation already cleared; detaching");
            return ObserverDisposition::Detach;
        };

        record_activation(self.tab.0, active, trigger);
        let on_result = self.log_result(if active { "activate" } else { "deactivate" });
        if active {
            activator.activate(on_result);
        } else {
            activator.deactivate(on_result);
        }
        ObserverDisposition::Keep
    }

    fn on_destroyed(&self) {
        let Some(collection) = self.collection.upgrade() else {
            return;
        };
        let removed = {
            let mut collection = collection.lock();
            if let Some(activator) = collection.find(self.tab) {
                record_activation(self.tab.0, false, PageSignal::Destroyed.trigger());
                activator.deactivate(None);
            }
            collection.erase(self.tab)
        };
        drop(removed);
        debug!(target: "page_observer", tab = %self.tab, "tab destroyed; observer detached");
    }

    fn log_result(&self, operation: &'static str) -> Option<ResultCallback> {
        let tab = self.tab;
        Some(Box::new(move |success| {
            if !success {
                warn!(target: "page_observer", %tab, operation, "key hook reported failure");
            }
        }))
    }
}
