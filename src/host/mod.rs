//! Per-window owner of the real key hook and every tab's reservation.

mod collection;
mod content;
mod error;
mod key_codes;
mod observer;

pub use collection::KeyHookActivatorCollection;
pub use content::{ContentForwardingFilter, TabContent, TabId, TabLookup};
pub use error::ReservationError;
pub use key_codes::{DomCodeResolver, KeyCodeResolver};
pub use observer::{ObserverDisposition, PageObserver, PageSignal};

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::KeyboardLockConfig;
use crate::hook::{
    is_valid_key_code, report, HookError, KeyCode, KeyEventFilter, KeyHook, KeyHookActivator,
    KeyHookShareWrapper, KeyHookStateKeeper, PlatformKeyEvent, PlatformKeyHook,
    RefCountedKeyHook, ResultCallback, SyncKeyHook,
};
use crate::runtime::{
    KeyEventFilterThreadProxy, KeyHookActivatorThreadProxy, KeyHookThreadWrapper, TaskRunner,
    ThreadBinding,
};
use crate::telemetry::events::{record_activation, record_reservation};
use crate::tracker::{ActiveKeyEventFilterRegistrar, ActiveKeyEventFilterTracker};

const TARGET: &str = "keyboard_lock_host";

/// Entry point for OS hook callbacks.
///
/// Holds the window's top-level hook weakly; events arriving after the host
/// is gone are not suppressed.
#[derive(Clone)]
pub struct PlatformEventSink {
    top: Weak<KeyHookThreadWrapper>,
}

impl PlatformEventSink {
    /// Returns `true` when the event must not reach default OS handling.
    pub fn on_platform_event(&self, event: &PlatformKeyEvent) -> bool {
        self.top
            .upgrade()
            .is_some_and(|top| top.on_key_event(event.kind, event.code, event.flags))
    }
}

// Field order is drop order: tab entries go before the tracker they
// publish into, and the top-level hook goes last.
struct HostInner {
    control: TaskRunner,
    binding: ThreadBinding,
    tabs: Arc<dyn TabLookup>,
    resolver: Box<dyn KeyCodeResolver>,
    shut_down: AtomicBool,
    observers: Mutex<HashMap<TabId, PageObserver>>,
    collection: Arc<Mutex<KeyHookActivatorCollection>>,
    tracker: Arc<ActiveKeyEventFilterTracker>,
    // Every tab and the browser itself hold codes on `top` through here.
    shared: Arc<RefCountedKeyHook>,
    top: Arc<KeyHookThreadWrapper>,
}

/// Keyboard lock for one browser window.
///
/// Public calls may come from any thread; they are redirected to the
/// control thread, and their results are delivered there too.
pub struct KeyboardLockHost {
    inner: Arc<HostInner>,
}

impl KeyboardLockHost {
    pub fn new(
        config: &KeyboardLockConfig,
        platform_hook: Box<dyn PlatformKeyHook>,
        tabs: Arc<dyn TabLookup>,
        control: TaskRunner,
        platform: TaskRunner,
    ) -> Result<Self> {
        Self::with_resolver(
            config,
            platform_hook,
            tabs,
            Box::new(DomCodeResolver),
            control,
            platform,
        )
    }

    pub fn with_resolver(
        config: &KeyboardLockConfig,
        platform_hook: Box<dyn PlatformKeyHook>,
        tabs: Arc<dyn TabLookup>,
        resolver: Box<dyn KeyCodeResolver>,
        control: TaskRunner,
        platform: TaskRunner,
    ) -> Result<Self> {
        let mut browser_keys = resolve_all(resolver.as_ref(), &config.browser_reserved_keys)
            .context("invalid browser_reserved_keys in keyboard lock config")?;
        browser_keys.sort_unstable();
        browser_keys.dedup();

        let tracker = Arc::new(ActiveKeyEventFilterTracker::bound_to(control.thread_id()));
        let tracker_filter = Arc::downgrade(&tracker) as Weak<dyn KeyEventFilter>;
        let keeper = Arc::new(KeyHookStateKeeper::new(
            Box::new(KeyEventFilterThreadProxy::new(
                tracker_filter,
                control.clone(),
            )),
            Box::new(SyncKeyHook::new(platform_hook)),
        ));
        let top = Arc::new(KeyHookThreadWrapper::new(
            Box::new(Arc::clone(&keeper)),
            Box::new(KeyHookActivatorThreadProxy::new(
                keeper,
                platform,
                Some(control.clone()),
            )),
        ));

        let shared = Arc::new(RefCountedKeyHook::new(Box::new(KeyHookShareWrapper::new(
            Arc::downgrade(&top) as Weak<dyn KeyHook>,
        ))));

        // Held for the host's whole life; only teardown releases them.
        if !browser_keys.is_empty() {
            shared.register_key(&browser_keys, log_top_result("register browser keys"));
        }
        top.activate(log_top_result("activate"));
        info!(
            target: TARGET,
            browser_keys = browser_keys.len(),
            control = control.name(),
            "keyboard lock host created"
        );

        Ok(Self {
            inner: Arc::new(HostInner {
                binding: ThreadBinding::bound_to(control.thread_id()),
                control,
                tabs,
                resolver,
                shut_down: AtomicBool::new(false),
                observers: Mutex::new(HashMap::new()),
                collection: Arc::new(Mutex::new(KeyHookActivatorCollection::new())),
                tracker,
                shared,
                top,
            }),
        })
    }

    /// Adds `codes` to the tab's reservation set.
    pub fn set_reserved_keys(
        &self,
        tab: TabId,
        codes: Vec<KeyCode>,
        on_result: Option<ResultCallback>,
    ) {
        let on_result = self
            .inner
            .reply_on_control(tab, "reserve", codes.clone(), on_result);
        self.run_on_control(on_result, move |inner, on_result| {
            inner.set_reserved_keys(tab, codes, on_result)
        });
    }

    /// Like [`set_reserved_keys`](Self::set_reserved_keys), with DOM key code
    /// names. One unknown name fails the whole request.
    pub fn set_reserved_key_codes<S: AsRef<str>>(
        &self,
        tab: TabId,
        names: &[S],
        on_result: Option<ResultCallback>,
    ) {
        match resolve_all(self.inner.resolver.as_ref(), names) {
            Ok(codes) => self.set_reserved_keys(tab, codes, on_result),
            Err(err) => {
                let on_result = self
                    .inner
                    .reply_on_control(tab, "reserve", Vec::new(), on_result);
                self.inner.reject(tab, err, on_result);
            }
        }
    }

    /// Drops the tab's reservation set; its keys are released if it was active.
    pub fn clear_reserved_keys(&self, tab: TabId, on_result: Option<ResultCallback>) {
        let on_result = self
            .inner
            .reply_on_control(tab, "clear", Vec::new(), on_result);
        self.run_on_control(on_result, move |inner, on_result| {
            inner.clear_reserved_keys(tab, on_result)
        });
    }

    pub fn is_key_reserved(&self, tab: TabId, code: KeyCode) -> bool {
        self.inner
            .collection
            .lock()
            .find(tab)
            .is_some_and(|activator| activator.is_key_reserved(code))
    }

    pub fn on_focus_changed(&self, tab: TabId, focused: bool) {
        self.signal(tab, PageSignal::FocusChanged(focused));
    }

    pub fn on_fullscreen_changed(&self, tab: TabId, fullscreen: bool) {
        self.signal(tab, PageSignal::FullscreenChanged(fullscreen));
    }

    pub fn on_tab_destroyed(&self, tab: TabId) {
        self.signal(tab, PageSignal::Destroyed);
    }

    pub fn event_sink(&self) -> PlatformEventSink {
        PlatformEventSink {
            top: Arc::downgrade(&self.inner.top),
        }
    }

    pub fn reserved_tab_count(&self) -> usize {
        self.inner.collection.lock().len()
    }

    /// Releases every tab's keys, then withdraws the top-level registration
    /// on the platform thread. Must run before the control thread stops.
    pub fn shutdown(&self) {
        if self.inner.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }

        let weak = Arc::downgrade(&self.inner);
        let ran = self.inner.control.post_and_wait(move || {
            if let Some(inner) = weak.upgrade() {
                inner.teardown();
            }
        });
        if ran.is_none() {
            error!(
                target: TARGET,
                thread = self.inner.control.name(),
                "control thread gone before host shutdown; tearing down in place"
            );
            self.inner.tracker.retire();
            self.inner.teardown();
        }
    }

    fn signal(&self, tab: TabId, signal: PageSignal) {
        self.run_on_control(None, move |inner, _| inner.dispatch(tab, signal));
    }

    fn run_on_control<F>(&self, on_result: Option<ResultCallback>, task: F)
    where
        F: FnOnce(&HostInner, Option<ResultCallback>) + Send + 'static,
    {
        if self.inner.shut_down.load(Ordering::SeqCst) {
            debug!(target: TARGET, "host already shut down; refusing call");
            report(on_result, false);
            return;
        }
        if self.inner.binding.is_current() {
            task(self.inner.as_ref(), on_result);
            return;
        }

        let weak = Arc::downgrade(&self.inner);
        let posted = self
            .inner
            .control
            .post_with_callback(on_result, move |on_result| match weak.upgrade() {
                Some(inner) => task(inner.as_ref(), on_result),
                None => report(on_result, false),
            });
        if !posted {
            let err = ReservationError::ThreadUnavailable(self.inner.control.name().to_string());
            warn!(target: TARGET, %err, "failed to redirect host call");
        }
    }
}

impl Drop for KeyboardLockHost {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl HostInner {
    /// Wraps a public callback so the outcome is recorded and the callback
    /// runs on the control thread outside any host lock.
    fn reply_on_control(
        &self,
        tab: TabId,
        operation: &'static str,
        codes: Vec<KeyCode>,
        on_result: Option<ResultCallback>,
    ) -> Option<ResultCallback> {
        let control = self.control.clone();
        Some(Box::new(move |success| {
            record_reservation(tab.0, operation, &codes, success);
            if on_result.is_some() {
                control.post_with_callback(on_result, move |on_result| {
                    report(on_result, success)
                });
            }
        }))
    }

    fn reject(&self, tab: TabId, err: ReservationError, on_result: Option<ResultCallback>) {
        warn!(target: TARGET, %tab, %err, "reservation request rejected");
        report(on_result, false);
    }

    fn set_reserved_keys(
        &self,
        tab: TabId,
        mut codes: Vec<KeyCode>,
        on_result: Option<ResultCallback>,
    ) {
        self.binding.assert_current();
        if let Some(code) = codes.iter().copied().find(|code| !is_valid_key_code(*code)) {
            return self.reject(tab, HookError::OutOfRange(code).into(), on_result);
        }
        codes.sort_unstable();
        codes.dedup();

        let mut collection = self.collection.lock();
        let mut focused = false;
        if !collection.contains(tab) {
            let content = match self.tabs.content(tab) {
                Some(content) => content,
                None => {
                    drop(collection);
                    return self.reject(tab, ReservationError::UnknownTab(tab), on_result);
                }
            };
            focused = content.has_focus();
            collection.insert(tab, self.create_activator(&content));
            debug!(target: TARGET, %tab, "created tab activator");
        }

        match collection.find(tab) {
            Some(activator) => {
                // Activating first makes the result reflect the platform flush.
                if focused {
                    record_activation(tab.0, true, "initial_focus");
                    activator.activate(None);
                }
                activator.register_key(&codes, on_result);
            }
            None => report(on_result, false),
        }
        drop(collection);

        self.observers
            .lock()
            .entry(tab)
            .or_insert_with(|| PageObserver::new(tab, Arc::downgrade(&self.collection)));
    }

    fn create_activator(&self, content: &Arc<dyn TabContent>) -> Box<dyn KeyHookActivator> {
        let shared = Arc::downgrade(&self.shared) as Weak<dyn KeyHook>;
        let keeper = Arc::new(KeyHookStateKeeper::new(
            Box::new(ContentForwardingFilter::new(content)),
            Box::new(KeyHookShareWrapper::new(shared)),
        ));
        let filter = Arc::downgrade(&keeper) as Weak<dyn KeyEventFilter>;
        Box::new(ActiveKeyEventFilterRegistrar::new(
            Box::new(keeper),
            filter,
            Arc::downgrade(&self.tracker),
        ))
    }

    fn clear_reserved_keys(&self, tab: TabId, on_result: Option<ResultCallback>) {
        self.binding.assert_current();
        let removed = self.collection.lock().erase(tab);
        self.observers.lock().remove(&tab);
        if removed.is_some() {
            debug!(target: TARGET, %tab, "cleared tab reservation");
        }
        drop(removed);
        report(on_result, true);
    }

    fn dispatch(&self, tab: TabId, signal: PageSignal) {
        self.binding.assert_current();
        let mut observers = self.observers.lock();
        let Some(observer) = observers.get(&tab) else {
            debug!(target: TARGET, %tab, ?signal, "no observer for tab; ignoring signal");
            return;
        };
        if observer.handle(signal) == ObserverDisposition::Detach {
            observers.remove(&tab);
        }
    }

    fn teardown(&self) {
        self.observers.lock().clear();
        let drained = self.collection.lock().drain();
        let tabs = drained.len();
        for (_, activator) in drained {
            activator.deactivate(None);
        }

        self.top.deactivate(log_top_result("deactivate"));
        info!(target: TARGET, tabs, "keyboard lock host shut down");
    }
}

fn resolve_all<S: AsRef<str>>(
    resolver: &dyn KeyCodeResolver,
    names: &[S],
) -> Result<Vec<KeyCode>, ReservationError> {
    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            resolver
                .resolve(name)
                .ok_or_else(|| ReservationError::UnknownKeyCode(name.to_string()))
        })
        .collect()
}

fn log_top_result(operation: &'static str) -> Option<ResultCallback> {
    Some(Box::new(move |success| {
        if success {
            debug!(target: TARGET, operation, "top-level key hook updated");
        } else {
            warn!(target: TARGET, operation, "platform key hook refused top-level update");
        }
    }))
}
