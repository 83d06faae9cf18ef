use crate::hook::KeyCode;

/// Maps platform-native key identifiers to [`KeyCode`]s.
pub trait KeyCodeResolver: Send + Sync {
    fn resolve(&self, code: &str) -> Option<KeyCode>;
}

/// Resolves DOM `KeyboardEvent.code` names to Windows virtual-key numbers.
#[derive(Debug, Default, Clone, Copy)]
pub struct DomCodeResolver;

const NAMED_KEYS: &[(&str, KeyCode)] = &[
    ("Backspace", 0x08),
    ("Tab", 0x09),
    ("Enter", 0x0D),
    ("Pause", 0x13),
    ("CapsLock", 0x14),
    ("Escape", 0x1B),
    ("Space", 0x20),
    ("PageUp", 0x21),
    ("PageDown", 0x22),
    ("End", 0x23),
    ("Home", 0x24),
    ("ArrowLeft", 0x25),
    ("ArrowUp", 0x26),
    ("ArrowRight", 0x27),
    ("ArrowDown", 0x28),
    ("PrintScreen", 0x2C),
    ("Insert", 0x2D),
    ("Delete", 0x2E),
    ("MetaLeft", 0x5B),
    ("MetaRight", 0x5C),
    ("ContextMenu", 0x5D),
    ("NumLock", 0x90),
    ("ScrollLock", 0x91),
    ("ShiftLeft", 0xA0),
    ("ShiftRight", 0xA1),
    ("ControlLeft", 0xA2),
    ("ControlRight", 0xA3),
    ("AltLeft", 0xA4),
    ("AltRight", 0xA5),
    ("Semicolon", 0xBA),
    ("Equal", 0xBB),
    ("Comma", 0xBC),
    ("Minus", 0xBD),
    ("Period", 0xBE),
    ("Slash", 0xBF),
    ("Backquote", 0xC0),
    ("BracketLeft", 0xDB),
    ("Backslash", 0xDC),
    ("BracketRight", 0xDD),
    ("Quote", 0xDE),
];

impl KeyCodeResolver for DomCodeResolver {
    fn resolve(&self, code: &str) -> Option<KeyCode> {
        if let Some(letter) = code.strip_prefix("Key") {
            return single_char(letter)
                .filter(char::is_ascii_uppercase)
                .map(|c| c as KeyCode);
        }
        if let Some(digit) = code.strip_prefix("Digit") {
            return single_char(digit)
                .filter(char::is_ascii_digit)
                .map(|c| c as KeyCode);
        }
        if let Some(digit) = code.strip_prefix("Numpad") {
            if let Some(d) = single_char(digit).and_then(|c| c.to_digit(10)) {
                return Some(0x60 + d);
            }
        }
        if let Some(number) = code.strip_prefix('F') {
            if let Ok(n) = number.parse::<u32>() {
                return (1..=24).contains(&n).then(|| 0x6F + n);
            }
        }

        NAMED_KEYS
            .iter()
            .find(|(name, _)| *name == code)
            .map(|(_, value)| *value)
    }
}

fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
