use tauri::{
    image::Image,
    menu::{CheckMenuItem, IsMenuItem, Menu, MenuItem, PredefinedMenuItem, Submenu},
    tray::TrayIconBuilder,
    AppHandle, Runtime,
};

use crate::error::HostError;
use crate::overlay::border::{self, BorderFrame};
use crate::overlay::selection::Bounds;
use crate::settings::{EMERGENCY_QUIT_SHORTCUT, FADE_OUT_CHOICES, SHORTCUT_CHOICES};
use crate::state::StatusSnapshot;
use crate::system::hotkeys::display_hotkey;

pub const TRAY_ID: &str = "main";
const APP_TITLE: &str = "Selection Glow";
const ICON_SIZE: u32 = 32;

/// What a tray menu click asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum TrayAction {
    EnterDrawing,
    ExitDrawing,
    ToggleEnabled,
    SetFadeOut(f64),
    SetShortcut(String),
    Quit,
}

impl TrayAction {
    pub fn id(&self) -> String {
        match self {
            TrayAction::EnterDrawing => "enter_drawing".to_string(),
            TrayAction::ExitDrawing => "exit_drawing".to_string(),
            TrayAction::ToggleEnabled => "toggle_enabled".to_string(),
            TrayAction::SetFadeOut(seconds) => format!("fade:{}", seconds),
            TrayAction::SetShortcut(shortcut) => format!("shortcut:{}", shortcut),
            TrayAction::Quit => "quit".to_string(),
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "enter_drawing" => Some(TrayAction::EnterDrawing),
            "exit_drawing" => Some(TrayAction::ExitDrawing),
            "toggle_enabled" => Some(TrayAction::ToggleEnabled),
            "quit" => Some(TrayAction::Quit),
            _ => {
                if let Some(seconds) = id.strip_prefix("fade:") {
                    seconds.parse().ok().map(TrayAction::SetFadeOut)
                } else {
                    id.strip_prefix("shortcut:")
                        .map(|shortcut| TrayAction::SetShortcut(shortcut.to_string()))
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MenuEntry {
    Label(String),
    Action { action: TrayAction, label: String },
    Choice { action: TrayAction, label: String, checked: bool },
    Submenu { label: String, entries: Vec<MenuEntry> },
    Separator,
}

fn action(action: TrayAction, label: impl Into<String>) -> MenuEntry {
    MenuEntry::Action {
        action,
        label: label.into(),
    }
}

/// The tray menu for the given status, independent of any toolkit.
pub fn menu_model(status: &StatusSnapshot) -> Vec<MenuEntry> {
    let settings = &status.settings;
    let (status_label, primary) = if status.drawing_mode {
        ("● Drawing", action(TrayAction::ExitDrawing, "Pause Drawing"))
    } else if status.enabled {
        ("● Ready", action(TrayAction::EnterDrawing, "Start Drawing"))
    } else {
        ("○ Off", action(TrayAction::ToggleEnabled, "Turn On"))
    };

    let mut entries = vec![
        MenuEntry::Label(APP_TITLE.to_string()),
        MenuEntry::Separator,
        MenuEntry::Label(status_label.to_string()),
        MenuEntry::Separator,
        primary,
    ];
    // Disabling while drawing is not offered; pause first.
    if !status.drawing_mode {
        let label = if status.enabled { "Turn Off" } else { "Turn On" };
        entries.push(action(TrayAction::ToggleEnabled, label));
    }

    let mut settings_entries = vec![MenuEntry::Label(format!(
        "Fade out: {}s",
        settings.fade_out_duration
    ))];
    settings_entries.extend(FADE_OUT_CHOICES.iter().map(|&seconds| MenuEntry::Choice {
        action: TrayAction::SetFadeOut(seconds),
        label: format!("{:.1}s", seconds),
        checked: (settings.fade_out_duration - seconds).abs() < 1e-9,
    }));
    settings_entries.push(MenuEntry::Separator);
    settings_entries.push(MenuEntry::Label(format!(
        "Shortcut: {}",
        display_hotkey(&settings.shortcut)
    )));
    settings_entries.extend(SHORTCUT_CHOICES.iter().map(|&shortcut| MenuEntry::Choice {
        action: TrayAction::SetShortcut(shortcut.to_string()),
        label: display_hotkey(shortcut),
        checked: settings.shortcut == shortcut,
    }));

    entries.extend([
        MenuEntry::Separator,
        MenuEntry::Submenu {
            label: "Settings".to_string(),
            entries: settings_entries,
        },
        MenuEntry::Separator,
        MenuEntry::Label(format!("Shortcut: {}", display_hotkey(&settings.shortcut))),
        MenuEntry::Label(format!(
            "Emergency quit: {}",
            display_hotkey(EMERGENCY_QUIT_SHORTCUT)
        )),
        MenuEntry::Separator,
        action(TrayAction::Quit, "Quit"),
    ]);
    entries
}

pub fn tooltip(status: &StatusSnapshot) -> String {
    let state = if status.drawing_mode {
        "Drawing"
    } else if status.enabled {
        "Ready"
    } else {
        "Off"
    };
    format!("{} - {}", APP_TITLE, state)
}

fn build_items<R: Runtime>(
    app: &AppHandle<R>,
    entries: &[MenuEntry],
) -> tauri::Result<Vec<Box<dyn IsMenuItem<R>>>> {
    let mut items: Vec<Box<dyn IsMenuItem<R>>> = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            MenuEntry::Label(text) => {
                items.push(Box::new(MenuItem::new(app, text, false, None::<&str>)?));
            }
            MenuEntry::Action { action, label } => {
                items.push(Box::new(MenuItem::with_id(
                    app,
                    action.id(),
                    label,
                    true,
                    None::<&str>,
                )?));
            }
            MenuEntry::Choice {
                action,
                label,
                checked,
            } => {
                items.push(Box::new(CheckMenuItem::with_id(
                    app,
                    action.id(),
                    label,
                    true,
                    *checked,
                    None::<&str>,
                )?));
            }
            MenuEntry::Submenu { label, entries } => {
                let children = build_items(app, entries)?;
                let refs: Vec<&dyn IsMenuItem<R>> = children.iter().map(|c| c.as_ref()).collect();
                items.push(Box::new(Submenu::with_items(app, label, true, &refs)?));
            }
            MenuEntry::Separator => {
                items.push(Box::new(PredefinedMenuItem::separator(app)?));
            }
        }
    }
    Ok(items)
}

fn build_menu<R: Runtime>(app: &AppHandle<R>, status: &StatusSnapshot) -> tauri::Result<Menu<R>> {
    let items = build_items(app, &menu_model(status))?;
    let refs: Vec<&dyn IsMenuItem<R>> = items.iter().map(|i| i.as_ref()).collect();
    Menu::with_items(app, &refs)
}

/// A rainbow rounded square, drawn with the same painter as the overlay.
pub fn tray_icon() -> Image<'static> {
    let inner = (ICON_SIZE as f64) - 2.0 * border::BORDER_WIDTH;
    let frame = BorderFrame::new(
        0,
        Bounds {
            left: 0.0,
            top: 0.0,
            width: inner,
            height: inner,
        },
        8.0,
        0.0,
        1.0,
    );
    match border::rasterize(&frame) {
        Some(pixmap) => Image::new_owned(border::to_rgba(&pixmap), pixmap.width(), pixmap.height()),
        None => {
            let mut rgba = Vec::with_capacity((ICON_SIZE * ICON_SIZE * 4) as usize);
            for _ in 0..(ICON_SIZE * ICON_SIZE) {
                rgba.extend_from_slice(&[255, 59, 48, 255]);
            }
            Image::new_owned(rgba, ICON_SIZE, ICON_SIZE)
        }
    }
}

pub fn setup_tray<R: Runtime>(
    app: &AppHandle<R>,
    status: &StatusSnapshot,
    on_action: impl Fn(&AppHandle<R>, TrayAction) + Send + Sync + 'static,
) -> Result<(), Box<dyn std::error::Error>> {
    let menu = build_menu(app, status)?;

    let _tray = TrayIconBuilder::with_id(TRAY_ID)
        .icon(tray_icon())
        .menu(&menu)
        .show_menu_on_left_click(true)
        .tooltip(tooltip(status))
        .on_menu_event(move |app, event| match TrayAction::from_id(event.id.as_ref()) {
            Some(action) => on_action(app, action),
            None => log::debug!("Ignoring tray item {}", event.id.as_ref()),
        })
        .build(app)?;

    Ok(())
}

/// Rebuilds the menu and tooltip so they reflect `status`.
pub fn refresh<R: Runtime>(app: &AppHandle<R>, status: &StatusSnapshot) -> Result<(), HostError> {
    let Some(tray) = app.tray_by_id(TRAY_ID) else {
        return Ok(());
    };
    let menu = build_menu(app, status).map_err(|e| HostError::Tray(e.to_string()))?;
    tray.set_menu(Some(menu))
        .map_err(|e| HostError::Tray(e.to_string()))?;
    tray.set_tooltip(Some(tooltip(status)))
        .map_err(|e| HostError::Tray(e.to_string()))?;
    Ok(())
}

pub fn remove<R: Runtime>(app: &AppHandle<R>) {
    app.remove_tray_by_id(TRAY_ID);
}
