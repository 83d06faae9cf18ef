use std::sync::{Arc, Weak};

use super::*;
use crate::hook::testing::{RecordingFilter, RecordingKeyHook};
use crate::hook::{completion_channel, KeyHook, KeyHookActivator, KeyHookStateKeeper};

fn filter_handle(filter: &Arc<dyn KeyEventFilter>) -> Weak<dyn KeyEventFilter> {
    Arc::downgrade(filter)
}

fn recording() -> (RecordingFilter, Arc<dyn KeyEventFilter>) {
    let filter = RecordingFilter::new();
    let shared: Arc<dyn KeyEventFilter> = Arc::new(filter.clone());
    (filter, shared)
}

fn current(tracker: &ActiveKeyEventFilterTracker) -> Option<Arc<dyn KeyEventFilter>> {
    tracker.active()
}

#[test]
fn erase_only_clears_matching_filter() {
    let tracker = ActiveKeyEventFilterTracker::new();
    let (_, a) = recording();
    let (_, b) = recording();

    tracker.set(&filter_handle(&a));
    tracker.erase(&filter_handle(&b));
    assert!(tracker.is_active(&filter_handle(&a)));

    tracker.erase(&filter_handle(&a));
    assert!(current(&tracker).is_none());
}

#[test]
fn set_overwrites_previous_filter() {
    let tracker = ActiveKeyEventFilterTracker::new();
    let (_, a) = recording();
    let (_, b) = recording();

    tracker.set(&filter_handle(&a));
    tracker.set(&filter_handle(&b));
    assert!(tracker.is_active(&filter_handle(&b)));
    assert!(!tracker.is_active(&filter_handle(&a)));
}

#[derive(Clone, Copy, Debug)]
enum Step {
    Set(usize),
    Erase(usize),
}

fn permutations(steps: &[Step]) -> Vec<Vec<Step>> {
    if steps.len() <= 1 {
        return vec![steps.to_vec()];
    }
    let mut all = Vec::new();
    for index in 0..steps.len() {
        let mut rest = steps.to_vec();
        let head = rest.remove(index);
        for mut tail in permutations(&rest) {
            tail.insert(0, head);
            all.push(tail);
        }
    }
    all
}

#[test]
fn interleaved_activation_never_exposes_erased_filter() {
    let steps = [Step::Set(0), Step::Erase(1), Step::Erase(0), Step::Set(1)];
    let orderings = permutations(&steps);
    assert_eq!(orderings.len(), 24);

    for ordering in orderings {
        let tracker = ActiveKeyEventFilterTracker::new();
        let (_, a) = recording();
        let (_, b) = recording();
        let handles = [filter_handle(&a), filter_handle(&b)];
        let mut last_was_set = [false, false];

        for step in &ordering {
            let before: Vec<bool> = handles.iter().map(|h| tracker.is_active(h)).collect();
            match *step {
                Step::Set(index) => {
                    tracker.set(&handles[index]);
                    last_was_set[index] = true;
                }
                Step::Erase(index) => {
                    tracker.erase(&handles[index]);
                    last_was_set[index] = false;
                    let other = 1 - index;
                    assert_eq!(
                        tracker.is_active(&handles[other]),
                        before[other],
                        "erase of {index} disturbed {other} in {ordering:?}"
                    );
                }
            }

            for (index, handle) in handles.iter().enumerate() {
                if tracker.is_active(handle) {
                    assert!(
                        last_was_set[index],
                        "tracker exposes erased filter {index} in {ordering:?}"
                    );
                }
            }
        }
    }
}

#[test]
fn forwards_events_to_active_filter_only() {
    let tracker = ActiveKeyEventFilterTracker::new();
    let (a_log, a) = recording();
    let (b_log, b) = recording();

    assert!(!tracker.on_key_down(0x1B, ModifierFlags::empty()));

    tracker.set(&filter_handle(&a));
    assert!(tracker.on_key_down(0x1B, ModifierFlags::empty()));
    tracker.set(&filter_handle(&b));
    assert!(tracker.on_key_up(0x1B, ModifierFlags::empty()));

    assert_eq!(a_log.events().len(), 1);
    assert_eq!(b_log.events().len(), 1);
}

#[test]
fn released_filter_is_not_reported() {
    let tracker = ActiveKeyEventFilterTracker::new();
    let (_, a) = recording();
    tracker.set(&filter_handle(&a));
    drop(a);

    assert!(current(&tracker).is_none());
    assert!(!tracker.on_key_down(0x09, ModifierFlags::ALT));
}

#[test]
fn retired_tracker_ignores_calls_from_any_thread() {
    let tracker = Arc::new(ActiveKeyEventFilterTracker::new());
    let (log, a) = recording();
    tracker.set(&filter_handle(&a));
    tracker.retire();
    assert!(current(&tracker).is_none());

    let handle = filter_handle(&a);
    let elsewhere = Arc::clone(&tracker);
    std::thread::spawn(move || {
        elsewhere.set(&handle);
        elsewhere.erase(&handle);
        assert!(!elsewhere.is_active(&handle));
        assert!(!elsewhere.on_key_down(0x1B, ModifierFlags::empty()));
    })
    .join()
    .expect("retired tracker accepts calls from other threads");

    assert!(log.events().is_empty());
}

fn tab_keeper(hook: &RecordingKeyHook, filter: &RecordingFilter) -> Arc<KeyHookStateKeeper> {
    Arc::new(KeyHookStateKeeper::new(
        Box::new(filter.clone()),
        Box::new(hook.clone()),
    ))
}

fn registrar_for(
    keeper: &Arc<KeyHookStateKeeper>,
    tracker: &Arc<ActiveKeyEventFilterTracker>,
) -> ActiveKeyEventFilterRegistrar {
    let filter = Arc::downgrade(keeper) as Weak<dyn KeyEventFilter>;
    ActiveKeyEventFilterRegistrar::new(Box::new(Arc::clone(keeper)), filter, Arc::downgrade(tracker))
}

#[test]
fn registrar_publishes_on_activate_and_withdraws_on_deactivate() {
    let tracker = Arc::new(ActiveKeyEventFilterTracker::new());
    let hook = RecordingKeyHook::new();
    let content = RecordingFilter::new();
    let keeper = tab_keeper(&hook, &content);
    let registrar = registrar_for(&keeper, &tracker);

    let (callback, mut rx) = completion_channel();
    registrar.register_key(&[0x1B], Some(callback));
    assert_eq!(rx.try_recv(), Ok(true));
    assert!(registrar.is_key_reserved(0x1B));

    registrar.activate(None);
    assert_eq!(hook.register_calls(), vec![vec![0x1B]]);
    assert!(tracker.on_key_down(0x1B, ModifierFlags::empty()));
    assert!(!tracker.on_key_down(0x09, ModifierFlags::empty()));
    assert_eq!(content.events().len(), 1);

    registrar.deactivate(None);
    assert!(current(&tracker).is_none());
    assert_eq!(hook.unregister_calls(), vec![vec![0x1B]]);
}

#[test]
fn late_deactivate_of_previous_tab_keeps_new_tab_active() {
    let tracker = Arc::new(ActiveKeyEventFilterTracker::new());
    let hook = RecordingKeyHook::new();
    let first = tab_keeper(&hook, &RecordingFilter::new());
    let second_content = RecordingFilter::new();
    let second = tab_keeper(&hook, &second_content);
    let first_registrar = registrar_for(&first, &tracker);
    let second_registrar = registrar_for(&second, &tracker);
    second_registrar.register_key(&[0x20], None);

    first_registrar.activate(None);
    second_registrar.activate(None);
    first_registrar.deactivate(None);

    assert!(tracker.on_key_down(0x20, ModifierFlags::empty()));
    assert_eq!(second_content.events().len(), 1);
}

#[test]
fn dropping_active_registrar_clears_tracker() {
    let tracker = Arc::new(ActiveKeyEventFilterTracker::new());
    let hook = RecordingKeyHook::new();
    let keeper = tab_keeper(&hook, &RecordingFilter::new());
    let registrar = registrar_for(&keeper, &tracker);
    registrar.register_key(&[0x1B], None);
    registrar.activate(None);
    drop(keeper);

    drop(registrar);
    assert!(current(&tracker).is_none());
    assert_eq!(hook.unregister_calls(), vec![vec![0x1B]]);
}

#[test]
fn registrar_outliving_tracker_is_harmless() {
    let tracker = Arc::new(ActiveKeyEventFilterTracker::new());
    let hook = RecordingKeyHook::new();
    let keeper = tab_keeper(&hook, &RecordingFilter::new());
    let registrar = registrar_for(&keeper, &tracker);
    drop(tracker);

    let (callback, mut rx) = completion_channel();
    registrar.activate(Some(callback));
    assert_eq!(rx.try_recv(), Ok(true));
    registrar.deactivate(None);
}
