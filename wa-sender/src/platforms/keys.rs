//! Key names accepted by [`super::InputEngine::press_key`] and friends.
//!
//! Names are case-insensitive and follow the usual scripting spellings:
//! `enter`, `ctrl`, `shift`, `alt`, `cmd`, `tab`, `esc`, `space`, arrow
//! names, `f1`..`f12`, single letters and digits.

use crate::AutomationError;
use rdev::Key;

pub fn parse_key(name: &str) -> Result<Key, AutomationError> {
    let lowered = name.trim().to_ascii_lowercase();
    let key = match lowered.as_str() {
        "enter" | "return" => Key::Return,
        "ctrl" | "control" | "ctrlleft" => Key::ControlLeft,
        "ctrlright" => Key::ControlRight,
        "shift" | "shiftleft" => Key::ShiftLeft,
        "shiftright" => Key::ShiftRight,
        "alt" | "option" => Key::Alt,
        "altgr" => Key::AltGr,
        "cmd" | "command" | "win" | "super" | "meta" => Key::MetaLeft,
        "tab" => Key::Tab,
        "esc" | "escape" => Key::Escape,
        "space" => Key::Space,
        "backspace" => Key::Backspace,
        "delete" | "del" => Key::Delete,
        "home" => Key::Home,
        "end" => Key::End,
        "pageup" => Key::PageUp,
        "pagedown" => Key::PageDown,
        "up" => Key::UpArrow,
        "down" => Key::DownArrow,
        "left" => Key::LeftArrow,
        "right" => Key::RightArrow,
        other => {
            if let Some(key) = function_key(other) {
                key
            } else {
                single_char_key(other).ok_or_else(|| {
                    AutomationError::InvalidArgument(format!("unknown key name '{name}'"))
                })?
            }
        }
    };
    Ok(key)
}

fn function_key(name: &str) -> Option<Key> {
    let number: u8 = name.strip_prefix('f')?.parse().ok()?;
    Some(match number {
        1 => Key::F1,
        2 => Key::F2,
        3 => Key::F3,
        4 => Key::F4,
        5 => Key::F5,
        6 => Key::F6,
        7 => Key::F7,
        8 => Key::F8,
        9 => Key::F9,
        10 => Key::F10,
        11 => Key::F11,
        12 => Key::F12,
        _ => return None,
    })
}

fn single_char_key(name: &str) -> Option<Key> {
    let mut chars = name.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    Some(match c {
        'a' => Key::KeyA,
        'b' => Key::KeyB,
        'c' => Key::KeyC,
        'd' => Key::KeyD,
        'e' => Key::KeyE,
        'f' => Key::KeyF,
        'g' => Key::KeyG,
        'h' => Key::KeyH,
        'i' => Key::KeyI,
        'j' => Key::KeyJ,
        'k' => Key::KeyK,
        'l' => Key::KeyL,
        'm' => Key::KeyM,
        'n' => Key::KeyN,
        'o' => Key::KeyO,
        'p' => Key::KeyP,
        'q' => Key::KeyQ,
        'r' => Key::KeyR,
        's' => Key::KeyS,
        't' => Key::KeyT,
        'u' => Key::KeyU,
        'v' => Key::KeyV,
        'w' => Key::KeyW,
        'x' => Key::KeyX,
        'y' => Key::KeyY,
        'z' => Key::KeyZ,
        '0' => Key::Num0,
        '1' => Key::Num1,
        '2' => Key::Num2,
        '3' => Key::Num3,
        '4' => Key::Num4,
        '5' => Key::Num5,
        '6' => Key::Num6,
        '7' => Key::Num7,
        '8' => Key::Num8,
        '9' => Key::Num9,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_keys() {
        assert_eq!(parse_key("enter").unwrap(), Key::Return);
        assert_eq!(parse_key("Ctrl").unwrap(), Key::ControlLeft);
        assert_eq!(parse_key(" ESC ").unwrap(), Key::Escape);
        assert_eq!(parse_key("cmd").unwrap(), Key::MetaLeft);
    }

    #[test]
    fn letters_digits_and_function_keys() {
        assert_eq!(parse_key("w").unwrap(), Key::KeyW);
        assert_eq!(parse_key("V").unwrap(), Key::KeyV);
        assert_eq!(parse_key("7").unwrap(), Key::Num7);
        assert_eq!(parse_key("f5").unwrap(), Key::F5);
        assert_eq!(parse_key("F12").unwrap(), Key::F12);
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!(parse_key("f13").is_err());
        assert!(parse_key("ww").is_err());
        assert!(parse_key("").is_err());
        assert!(matches!(
            parse_key("hyper"),
            Err(AutomationError::InvalidArgument(_))
        ));
    }
}
