//! Key name vocabulary
//!
//! Maps the human-readable key names accepted by the keyboard tools onto
//! enigo keys. Names longer than one character are case-insensitive; a
//! single character is typed as itself.

use enigo::Key;

/// Resolve a key name, or `None` if it is not in the vocabulary
pub fn lookup(name: &str) -> Option<Key> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(match c {
            '\n' | '\r' => Key::Return,
            '\t' => Key::Tab,
            ' ' => Key::Space,
            '\u{8}' => Key::Backspace,
            c => Key::Unicode(c),
        });
    }

    let key = match name.to_lowercase().as_str() {
        // Special keys
        "enter" | "return" => Key::Return,
        "esc" | "escape" => Key::Escape,
        "tab" => Key::Tab,
        "backspace" => Key::Backspace,
        "space" => Key::Space,
        "delete" | "del" => Key::Delete,
        #[cfg(not(target_os = "macos"))]
        "insert" => Key::Insert,
        "home" => Key::Home,
        "end" => Key::End,
        "pageup" | "pgup" => Key::PageUp,
        "pagedown" | "pgdn" => Key::PageDown,
        "capslock" => Key::CapsLock,

        // Arrow keys
        "up" => Key::UpArrow,
        "down" => Key::DownArrow,
        "left" => Key::LeftArrow,
        "right" => Key::RightArrow,

        // Modifiers
        "ctrl" | "control" | "ctrlleft" | "ctrlright" => Key::Control,
        "shift" | "shiftleft" | "shiftright" => Key::Shift,
        "alt" | "altleft" | "altright" | "option" => Key::Alt,
        "command" | "cmd" | "win" | "winleft" | "winright" | "super" | "meta" => Key::Meta,

        // Function keys
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        "f13" => Key::F13,
        "f14" => Key::F14,
        "f15" => Key::F15,
        "f16" => Key::F16,
        "f17" => Key::F17,
        "f18" => Key::F18,
        "f19" => Key::F19,
        "f20" => Key::F20,

        _ => return None,
    };
    Some(key)
}
