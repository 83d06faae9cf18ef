use std::fmt;
use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};

use crate::hook::{KeyCode, KeyEventFilter, KeyEventType, ModifierFlags};

/// Opaque identity of a browser tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab#{}", self.0)
    }
}

/// Input pipeline of a tab's document.
pub trait TabContent: Send + Sync {
    /// Delivers a suppressed key event; `true` if the document consumed it.
    fn forward_key_event(&self, kind: KeyEventType, code: KeyCode, flags: ModifierFlags) -> bool;

    /// Whether the tab already holds input focus when it first reserves keys.
    fn has_focus(&self) -> bool {
        false
    }
}

/// Resolves tab identities to their content.
pub trait TabLookup: Send + Sync {
    fn content(&self, tab: TabId) -> Option<Arc<dyn TabContent>>;
}

/// Hands events to a tab's content for as long as the tab is alive.
pub struct ContentForwardingFilter {
    content: Weak<dyn TabContent>,
}

impl ContentForwardingFilter {
    pub fn new(content: &Arc<dyn TabContent>) -> Self {
        Self {
            content: Arc::downgrade(content),
        }
    }

    fn forward(&self, kind: KeyEventType, code: KeyCode, flags: ModifierFlags) -> bool {
        self.content
            .upgrade()
            .is_some_and(|content| content.forward_key_event(kind, code, flags))
    }
}

impl KeyEventFilter for ContentForwardingFilter {
    fn on_key_down(&self, code: KeyCode, flags: ModifierFlags) -> bool {
        self.forward(KeyEventType::KeyDown, code, flags)
    }

    fn on_key_up(&self, code: KeyCode, flags: ModifierFlags) -> bool {
        self.forward(KeyEventType::KeyUp, code, flags)
    }
}
