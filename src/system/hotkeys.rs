use std::sync::Mutex;

use tauri::{AppHandle, Manager, Runtime};
use tauri_plugin_global_shortcut::{Code, GlobalShortcutExt, Modifiers, Shortcut};

use crate::error::HostError;
use crate::settings::{EMERGENCY_QUIT_SHORTCUT, ESCAPE_SHORTCUT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyAction {
    ToggleDrawing,
    EmergencyQuit,
    Escape,
}

/// The shortcuts currently registered, so a press can be mapped to an action.
#[derive(Debug, Default)]
pub struct HotkeyBindings {
    toggle: Option<Shortcut>,
    emergency_quit: Option<Shortcut>,
    escape: Option<Shortcut>,
}

impl HotkeyBindings {
    pub fn action_for(&self, shortcut: &Shortcut) -> Option<HotkeyAction> {
        let is = |slot: &Option<Shortcut>| slot.as_ref() == Some(shortcut);
        if is(&self.emergency_quit) {
            Some(HotkeyAction::EmergencyQuit)
        } else if is(&self.toggle) {
            Some(HotkeyAction::ToggleDrawing)
        } else if is(&self.escape) {
            Some(HotkeyAction::Escape)
        } else {
            None
        }
    }
}

fn hotkey_error(accelerator: &str, reason: impl ToString) -> HostError {
    HostError::Hotkey {
        accelerator: accelerator.to_string(),
        reason: reason.to_string(),
    }
}

fn register<R: Runtime>(app: &AppHandle<R>, accelerator: &str) -> Result<Shortcut, HostError> {
    let shortcut = parse_hotkey(accelerator).map_err(|e| hotkey_error(accelerator, e))?;
    app.global_shortcut()
        .register(shortcut)
        .map_err(|e| hotkey_error(accelerator, e))?;
    Ok(shortcut)
}

fn with_bindings<R: Runtime>(app: &AppHandle<R>, update: impl FnOnce(&mut HotkeyBindings)) {
    let bindings = app.state::<Mutex<HotkeyBindings>>();
    let mut guard = match bindings.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    update(&mut guard);
}

/// Registers the toggle and emergency-quit shortcuts at startup.
///
/// A failed registration only disables that shortcut.
pub fn register_startup<R: Runtime>(app: &AppHandle<R>, toggle: &str) {
    match register(app, toggle) {
        Ok(shortcut) => {
            with_bindings(app, |b| b.toggle = Some(shortcut));
            log::info!("Toggle hotkey registered: {}", toggle);
        }
        Err(e) => log::warn!("Toggle hotkey unavailable: {}", e),
    }
    match register(app, EMERGENCY_QUIT_SHORTCUT) {
        Ok(shortcut) => {
            with_bindings(app, |b| b.emergency_quit = Some(shortcut));
            log::info!("Emergency quit registered: {}", EMERGENCY_QUIT_SHORTCUT);
        }
        Err(e) => log::warn!("Emergency quit hotkey unavailable: {}", e),
    }
}

/// Unregisters `old` first; a failure there does not stop `new` from binding.
pub fn rebind_toggle<R: Runtime>(app: &AppHandle<R>, old: &str, new: &str) -> Result<(), HostError> {
    if let Ok(old_shortcut) = parse_hotkey(old) {
        if let Err(e) = app.global_shortcut().unregister(old_shortcut) {
            log::warn!("Failed to unregister {}: {}", old, e);
        }
    }
    with_bindings(app, |b| b.toggle = None);

    let shortcut = register(app, new)?;
    with_bindings(app, |b| b.toggle = Some(shortcut));
    Ok(())
}

/// Escape is only grabbed while drawing so it is not swallowed system-wide.
pub fn set_escape_capture<R: Runtime>(app: &AppHandle<R>, capture: bool) -> Result<(), HostError> {
    if capture {
        let mut held = false;
        with_bindings(app, |b| held = b.escape.is_some());
        if held {
            return Ok(());
        }
        let shortcut = register(app, ESCAPE_SHORTCUT)?;
        with_bindings(app, |b| b.escape = Some(shortcut));
    } else {
        let mut previous = None;
        with_bindings(app, |b| previous = b.escape.take());
        if let Some(shortcut) = previous {
            app.global_shortcut()
                .unregister(shortcut)
                .map_err(|e| hotkey_error(ESCAPE_SHORTCUT, e))?;
        }
    }
    Ok(())
}

pub fn release_all<R: Runtime>(app: &AppHandle<R>) -> Result<(), HostError> {
    with_bindings(app, |b| *b = HotkeyBindings::default());
    app.global_shortcut()
        .unregister_all()
        .map_err(|e| hotkey_error("*", e))
}

/// Label for menus: `CommandOrControl` shown as the platform's key.
pub fn display_hotkey(hotkey: &str) -> String {
    let primary = if cfg!(target_os = "macos") { "⌘" } else { "Ctrl" };
    hotkey
        .replace("CommandOrControl", primary)
        .replace("Shift", if cfg!(target_os = "macos") { "⇧" } else { "Shift" })
}

/// Parse an accelerator like "CommandOrControl+Shift+H" into a Shortcut.
pub fn parse_hotkey(hotkey: &str) -> Result<Shortcut, String> {
    let parts: Vec<&str> = hotkey.split('+').map(|s| s.trim()).collect();
    if parts.iter().all(|p| p.is_empty()) {
        return Err("Empty hotkey".to_string());
    }

    let mut modifiers = Modifiers::empty();
    let mut key_code: Option<Code> = None;

    for part in &parts {
        match part.to_lowercase().as_str() {
            "commandorcontrol" | "cmdorctrl" => {
                if cfg!(target_os = "macos") {
                    modifiers |= Modifiers::SUPER
                } else {
                    modifiers |= Modifiers::CONTROL
                }
            }
            "ctrl" | "control" => modifiers |= Modifiers::CONTROL,
            "shift" => modifiers |= Modifiers::SHIFT,
            "alt" | "option" => modifiers |= Modifiers::ALT,
            "super" | "win" | "meta" | "cmd" | "command" => modifiers |= Modifiers::SUPER,
            key => {
                if key_code.is_some() {
                    return Err(format!("Multiple keys in hotkey: {}", hotkey));
                }
                key_code = Some(parse_key_code(key)?);
            }
        }
    }

    let code = key_code.ok_or_else(|| format!("No key specified in hotkey: {}", hotkey))?;
    let mods = if modifiers.is_empty() {
        None
    } else {
        Some(modifiers)
    };

    Ok(Shortcut::new(mods, code))
}

fn parse_key_code(key: &str) -> Result<Code, String> {
    const LETTERS: [Code; 26] = [
        Code::KeyA, Code::KeyB, Code::KeyC, Code::KeyD, Code::KeyE, Code::KeyF, Code::KeyG,
        Code::KeyH, Code::KeyI, Code::KeyJ, Code::KeyK, Code::KeyL, Code::KeyM, Code::KeyN,
        Code::KeyO, Code::KeyP, Code::KeyQ, Code::KeyR, Code::KeyS, Code::KeyT, Code::KeyU,
        Code::KeyV, Code::KeyW, Code::KeyX, Code::KeyY, Code::KeyZ,
    ];
    const DIGITS: [Code; 10] = [
        Code::Digit0, Code::Digit1, Code::Digit2, Code::Digit3, Code::Digit4,
        Code::Digit5, Code::Digit6, Code::Digit7, Code::Digit8, Code::Digit9,
    ];

    let lower = key.to_lowercase();
    let mut chars = lower.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_lowercase() {
            return Ok(LETTERS[(c as u8 - b'a') as usize]);
        }
        if c.is_ascii_digit() {
            return Ok(DIGITS[(c as u8 - b'0') as usize]);
        }
    }

    match lower.as_str() {
        "`" | "backquote" => Ok(Code::Backquote),
        "escape" | "esc" => Ok(Code::Escape),
        "space" => Ok(Code::Space),
        "enter" | "return" => Ok(Code::Enter),
        "tab" => Ok(Code::Tab),
        "-" | "minus" => Ok(Code::Minus),
        "=" | "equal" => Ok(Code::Equal),
        "[" | "bracketleft" => Ok(Code::BracketLeft),
        "]" | "bracketright" => Ok(Code::BracketRight),
        ";" | "semicolon" => Ok(Code::Semicolon),
        "'" | "quote" => Ok(Code::Quote),
        "," | "comma" => Ok(Code::Comma),
        "." | "period" => Ok(Code::Period),
        "/" | "slash" => Ok(Code::Slash),
        "f1" => Ok(Code::F1),
        "f2" => Ok(Code::F2),
        "f3" => Ok(Code::F3),
        "f4" => Ok(Code::F4),
        "f5" => Ok(Code::F5),
        "f6" => Ok(Code::F6),
        "f7" => Ok(Code::F7),
        "f8" => Ok(Code::F8),
        "f9" => Ok(Code::F9),
        "f10" => Ok(Code::F10),
        "f11" => Ok(Code::F11),
        "f12" => Ok(Code::F12),
        other => Err(format!("Unknown key: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SHORTCUT_CHOICES;

    fn primary() -> Modifiers {
        if cfg!(target_os = "macos") {
            Modifiers::SUPER
        } else {
            Modifiers::CONTROL
        }
    }

    #[test]
    fn every_offered_shortcut_parses() {
        for choice in SHORTCUT_CHOICES {
            assert!(parse_hotkey(choice).is_ok(), "{}", choice);
        }
        assert!(parse_hotkey(EMERGENCY_QUIT_SHORTCUT).is_ok());
        assert_eq!(
            parse_hotkey(ESCAPE_SHORTCUT).unwrap(),
            Shortcut::new(None, Code::Escape)
        );
    }

    #[test]
    fn command_or_control_maps_to_the_platform_modifier() {
        assert_eq!(
            parse_hotkey("CommandOrControl+Shift+H").unwrap(),
            Shortcut::new(Some(primary() | Modifiers::SHIFT), Code::KeyH)
        );
        assert_eq!(
            parse_hotkey("CommandOrControl+`").unwrap(),
            Shortcut::new(Some(primary()), Code::Backquote)
        );
    }

    #[test]
    fn rejects_malformed_accelerators() {
        assert!(parse_hotkey("").is_err());
        assert!(parse_hotkey("Ctrl+Shift").is_err());
        assert!(parse_hotkey("Ctrl+A+B").is_err());
        assert!(parse_hotkey("Ctrl+Nope").is_err());
    }

    #[test]
    fn bindings_map_presses_to_actions() {
        let toggle = parse_hotkey("CommandOrControl+D").unwrap();
        let quit = parse_hotkey(EMERGENCY_QUIT_SHORTCUT).unwrap();
        let bindings = HotkeyBindings {
            toggle: Some(toggle),
            emergency_quit: Some(quit),
            escape: None,
        };
        assert_eq!(bindings.action_for(&toggle), Some(HotkeyAction::ToggleDrawing));
        assert_eq!(bindings.action_for(&quit), Some(HotkeyAction::EmergencyQuit));
        assert_eq!(
            bindings.action_for(&Shortcut::new(None, Code::Escape)),
            None
        );
    }

    #[test]
    fn display_uses_platform_names() {
        let shown = display_hotkey("CommandOrControl+D");
        assert!(!shown.contains("CommandOrControl"));
        assert!(shown.ends_with("+D"));
    }
}
