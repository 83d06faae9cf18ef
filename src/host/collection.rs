use std::collections::HashMap;

use crate::hook::KeyHookActivator;

use super::content::TabId;

/// Each tab's activator, owned by the window.
#[derive(Default)]
pub struct KeyHookActivatorCollection {
    activators: HashMap<TabId, Box<dyn KeyHookActivator>>,
}

impl KeyHookActivatorCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, tab: TabId) -> Option<&dyn KeyHookActivator> {
        self.activators.get(&tab).map(|activator| activator.as_ref())
    }

    /// Stores `activator` for `tab`, returning the one it replaces.
    pub fn insert(
        &mut self,
        tab: TabId,
        activator: Box<dyn KeyHookActivator>,
    ) -> Option<Box<dyn KeyHookActivator>> {
        self.activators.insert(tab, activator)
    }

    /// Removes the tab's activator; the caller decides where it is dropped.
    pub fn erase(&mut self, tab: TabId) -> Option<Box<dyn KeyHookActivator>> {
        self.activators.remove(&tab)
    }

    pub fn drain(&mut self) -> Vec<(TabId, Box<dyn KeyHookActivator>)> {
        self.activators.drain().collect()
    }

    pub fn contains(&self, tab: TabId) -> bool {
        self.activators.contains_key(&tab)
    }

    pub fn len(&self) -> usize {
        self.activators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activators.is_empty()
    }
}
