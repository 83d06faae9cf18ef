use thiserror::Error;

use crate::hook::HookError;

use super::content::TabId;

/// Why a reservation request was refused before reaching any hook.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReservationError {
    #[error("{0} has no content to forward key events to")]
    UnknownTab(TabId),
    #[error("unknown key code name `{0}`")]
    UnknownKeyCode(String),
    #[error(transparent)]
    Hook(#[from] HookError),
    #[error("event thread `{0}` is no longer accepting tasks")]
    ThreadUnavailable(String),
}
