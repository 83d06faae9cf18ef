use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Numeric identifier of a physical key, independent of layout.
pub type KeyCode = u32;

/// Size of the fixed key-code table tracked per state keeper.
pub const KEY_CODE_COUNT: usize = 256;

pub fn is_valid_key_code(code: KeyCode) -> bool {
    (code as usize) < KEY_CODE_COUNT
}

bitflags! {
    /// Modifier state captured alongside a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ModifierFlags: u32 {
        const SHIFT = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2;
        const META = 1 << 3;
        const CAPS_LOCK = 1 << 4;
        const NUM_LOCK = 1 << 5;
        const EXTENDED = 1 << 6;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyEventType {
    KeyDown,
    KeyUp,
}

impl KeyEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyEventType::KeyDown => "key_down",
            KeyEventType::KeyUp => "key_up",
        }
    }
}

/// Raw event as delivered by the OS keyboard callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformKeyEvent {
    pub kind: KeyEventType,
    pub code: KeyCode,
    pub flags: ModifierFlags,
}

impl PlatformKeyEvent {
    pub fn key_down(code: KeyCode, flags: ModifierFlags) -> Self {
        Self {
            kind: KeyEventType::KeyDown,
            code,
            flags,
        }
    }

    pub fn key_up(code: KeyCode, flags: ModifierFlags) -> Self {
        Self {
            kind: KeyEventType::KeyUp,
            code,
            flags,
        }
    }
}
