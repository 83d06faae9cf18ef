use std::sync::{Arc, Weak};

use tracing::{trace, warn};

use crate::hook::{
    KeyCode, KeyEventFilter, KeyEventType, KeyHook, KeyHookActivator, ModifierFlags,
    ResultCallback,
};

use super::thread::TaskRunner;

/// Runs a filter on its own thread.
///
/// The real decision is not known when the event is dispatched, so every
/// event that was queued is reported as consumed.
pub struct KeyEventFilterThreadProxy {
    filter: Weak<dyn KeyEventFilter>,
    runner: TaskRunner,
}

impl KeyEventFilterThreadProxy {
    pub fn new(filter: Weak<dyn KeyEventFilter>, runner: TaskRunner) -> Self {
        Self { filter, runner }
    }

    fn post(&self, kind: KeyEventType, code: KeyCode, flags: ModifierFlags) -> bool {
        let filter = self.filter.clone();
        self.runner.post(move || {
            if let Some(filter) = filter.upgrade() {
                filter.on_key_event(kind, code, flags);
            } else {
                trace!(target: "key_hook", code, "filter released before event delivery");
            }
        })
    }
}

impl KeyEventFilter for KeyEventFilterThreadProxy {
    fn on_key_down(&self, code: KeyCode, flags: ModifierFlags) -> bool {
        self.post(KeyEventType::KeyDown, code, flags)
    }

    fn on_key_up(&self, code: KeyCode, flags: ModifierFlags) -> bool {
        self.post(KeyEventType::KeyUp, code, flags)
    }
}

/// Operation carried across threads by [`KeyHookActivatorThreadProxy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookCommand {
    Register(Vec<KeyCode>),
    Unregister(Vec<KeyCode>),
    Activate,
    Deactivate,
}

impl HookCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookCommand::Register(_) => "register",
            HookCommand::Unregister(_) => "unregister",
            HookCommand::Activate => "activate",
            HookCommand::Deactivate => "deactivate",
        }
    }

    pub fn apply(self, target: &dyn KeyHookActivator, on_result: Option<ResultCallback>) {
        match self {
            HookCommand::Register(codes) => target.register_key(&codes, on_result),
            HookCommand::Unregister(codes) => target.unregister_key(&codes, on_result),
            HookCommand::Activate => target.activate(on_result),
            HookCommand::Deactivate => target.deactivate(on_result),
        }
    }
}

/// Executes every [`KeyHookActivator`] call on `runner`'s thread.
///
/// With a reply runner, results are delivered back on that thread; a result
/// that cannot be delivered is dropped. A command that cannot be queued
/// fails immediately.
pub struct KeyHookActivatorThreadProxy {
    target: Arc<dyn KeyHookActivator>,
    runner: TaskRunner,
    reply_runner: Option<TaskRunner>,
}

impl KeyHookActivatorThreadProxy {
    pub fn new(
        target: Arc<dyn KeyHookActivator>,
        runner: TaskRunner,
        reply_runner: Option<TaskRunner>,
    ) -> Self {
        Self {
            target,
            runner,
            reply_runner,
        }
    }

    pub fn send(&self, command: HookCommand, on_result: Option<ResultCallback>) {
        let label = command.as_str();
        let target = Arc::clone(&self.target);
        let reply_runner = self.reply_runner.clone();

        let posted = self.runner.post_with_callback(on_result, move |on_result| {
            command.apply(target.as_ref(), reply_on(reply_runner, on_result));
        });
        if !posted {
            warn!(target: "key_hook", command = label, thread = self.runner.name(), "failed to post hook command");
        }
    }
}

fn reply_on(
    reply_runner: Option<TaskRunner>,
    on_result: Option<ResultCallback>,
) -> Option<ResultCallback> {
    let callback = on_result?;
    let Some(reply_runner) = reply_runner else {
        return Some(callback);
    };

    Some(Box::new(move |success| {
        if !reply_runner.post(move || callback(success)) {
            warn!(
                target: "key_hook",
                thread = reply_runner.name(),
                success,
                "dropping hook result; origin thread is gone"
            );
        }
    }))
}

impl KeyHook for KeyHookActivatorThreadProxy {
    fn register_key(&self, codes: &[KeyCode], on_result: Option<ResultCallback>) {
        self.send(HookCommand::Register(codes.to_vec()), on_result);
    }

    fn unregister_key(&self, codes: &[KeyCode], on_result: Option<ResultCallback>) {
        self.send(HookCommand::Unregister(codes.to_vec()), on_result);
    }
}

impl KeyHookActivator for KeyHookActivatorThreadProxy {
    fn activate(&self, on_result: Option<ResultCallback>) {
        self.send(HookCommand::Activate, on_result);
    }

    fn deactivate(&self, on_result: Option<ResultCallback>) {
        self.send(HookCommand::Deactivate, on_result);
    }

    fn is_key_reserved(&self, code: KeyCode) -> bool {
        self.target.is_key_reserved(code)
    }
}
