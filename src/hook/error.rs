use thiserror::Error;

use super::types::KeyCode;

/// Failure reported by a platform hook implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HookError {
    #[error("keyboard hook is not supported on this platform")]
    Unsupported,
    #[error("platform rejected key registration: {reason}")]
    Rejected { reason: String },
    #[error("key code {0} is outside the reservable range")]
    OutOfRange(KeyCode),
}

impl HookError {
    pub fn rejected<S: Into<String>>(reason: S) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}
