use serde::Serialize;
use tracing::{info, warn};

use crate::hook::{HookError, KeyCode};

pub(crate) const TARGET: &str = "telemetry::keyboard_lock";
pub(crate) const EVENT_RESERVATION: &str = "keyboard_lock_reservation";
pub(crate) const EVENT_ACTIVATION: &str = "keyboard_lock_activation";
pub(crate) const EVENT_HOOK_FAILURE: &str = "keyboard_lock_hook_failure";

#[derive(Debug, Serialize)]
pub struct ReservationEvent<'a> {
    pub tab_id: u64,
    pub operation: &'static str,
    pub codes: &'a [KeyCode],
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct ActivationEvent {
    pub tab_id: u64,
    pub active: bool,
    pub trigger: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HookFailureEvent<'a> {
    pub operation: &'static str,
    pub codes: &'a [KeyCode],
    pub error: String,
}

pub fn record_reservation(tab_id: u64, operation: &'static str, codes: &[KeyCode], success: bool) {
    let event = ReservationEvent {
        tab_id,
        operation,
        codes,
        success,
    };

    match serde_json::to_string(&event) {
        Ok(payload) => info!(
            target: TARGET,
            event = EVENT_RESERVATION,
            tab_id = event.tab_id,
            operation = event.operation,
            code_count = event.codes.len(),
            success = event.success,
            payload = %payload
        ),
        Err(err) => warn!(
            target: TARGET,
            event = EVENT_RESERVATION,
            %err,
            "failed to encode reservation event"
        ),
    }
}

pub fn record_activation(tab_id: u64, active: bool, trigger: &'static str) {
    let event = ActivationEvent {
        tab_id,
        active,
        trigger,
    };

    match serde_json::to_string(&event) {
        Ok(payload) => info!(
            target: TARGET,
            event = EVENT_ACTIVATION,
            tab_id = event.tab_id,
            active = event.active,
            trigger = event.trigger,
            payload = %payload
        ),
        Err(err) => warn!(
            target: TARGET,
            event = EVENT_ACTIVATION,
            %err,
            "failed to encode activation event"
        ),
    }
}

pub fn record_platform_hook_failure(operation: &'static str, codes: &[KeyCode], error: &HookError) {
    let event = HookFailureEvent {
        operation,
        codes,
        error: error.to_string(),
    };

    match serde_json::to_string(&event) {
        Ok(payload) => warn!(
            target: TARGET,
            event = EVENT_HOOK_FAILURE,
            operation = event.operation,
            error = %error,
            payload = %payload
        ),
        Err(err) => warn!(
            target: TARGET,
            event = EVENT_HOOK_FAILURE,
            %err,
            "failed to encode hook failure event"
        ),
    }
}
