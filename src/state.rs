use crate::settings::Settings;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeState {
    Disabled,
    Idle,
    Drawing,
}

impl Default for ModeState {
    fn default() -> Self {
        ModeState::Idle
    }
}

impl ModeState {
    pub fn is_enabled(self) -> bool {
        !matches!(self, ModeState::Disabled)
    }

    pub fn is_drawing(self) -> bool {
        matches!(self, ModeState::Drawing)
    }
}

/// What the tray menu and the `get_status` command see.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub enabled: bool,
    pub drawing_mode: bool,
    pub settings: Settings,
}

impl StatusSnapshot {
    pub fn new(mode: ModeState, settings: &Settings) -> Self {
        Self {
            enabled: mode.is_enabled(),
            drawing_mode: mode.is_drawing(),
            settings: settings.clone(),
        }
    }
}

/// One-way notifications from the controller to the overlay surface.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayEvent {
    EnabledChanged(bool),
    DrawingModeChanged(bool),
    ConfigChanged(Settings),
}
