use std::sync::Mutex;

use tauri::{AppHandle, Emitter, Manager, PhysicalPosition, WebviewWindow};

use crate::error::HostError;
use crate::host::OverlayHost;
use crate::state::{OverlayEvent, StatusSnapshot};
use crate::system::{hotkeys, tray};
use crate::Renderer;

pub const OVERLAY_LABEL: &str = "overlay";

fn overlay(app: &AppHandle) -> Result<WebviewWindow, HostError> {
    app.get_webview_window(OVERLAY_LABEL)
        .ok_or(HostError::WindowMissing(OVERLAY_LABEL))
}

fn window_error(op: &'static str) -> impl Fn(tauri::Error) -> HostError {
    move |e| HostError::Window {
        op,
        reason: e.to_string(),
    }
}

/// Stretches the overlay over the primary monitor.
pub fn cover_primary_monitor(app: &AppHandle) -> Result<(), HostError> {
    let window = overlay(app)?;
    let monitor = window
        .primary_monitor()
        .map_err(window_error("primary_monitor"))?
        .ok_or(HostError::Window {
            op: "primary_monitor",
            reason: "no monitor reported".to_string(),
        })?;
    window
        .set_position(PhysicalPosition::new(0, 0))
        .map_err(window_error("set_position"))?;
    window
        .set_size(*monitor.size())
        .map_err(window_error("set_size"))?;
    window
        .set_visible_on_all_workspaces(true)
        .map_err(window_error("set_visible_on_all_workspaces"))?;
    Ok(())
}

/// The Tauri side of [`OverlayHost`]: the overlay window, hotkeys and tray.
#[derive(Clone)]
pub struct TauriHost {
    app: AppHandle,
}

impl TauriHost {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }

    fn with_renderer(&self, update: impl FnOnce(&mut Renderer)) {
        let renderer = self.app.state::<Mutex<Renderer>>();
        match renderer.lock() {
            Ok(mut guard) => update(&mut guard),
            Err(e) => log::warn!("Renderer lock poisoned: {}", e),
        };
    }

    fn emit<S: serde::Serialize + Clone>(&self, event: &str, payload: S) {
        if let Err(e) = self.app.emit_to(OVERLAY_LABEL, event, payload) {
            log::warn!("Failed to emit {}: {}", event, e);
        }
    }
}

impl OverlayHost for TauriHost {
    fn set_click_through(&self, click_through: bool) -> Result<(), HostError> {
        overlay(&self.app)?
            .set_ignore_cursor_events(click_through)
            .map_err(window_error("set_ignore_cursor_events"))
    }

    fn raise(&self) -> Result<(), HostError> {
        let window = overlay(&self.app)?;
        window
            .set_always_on_top(true)
            .map_err(window_error("set_always_on_top"))?;
        window.set_focus().map_err(window_error("set_focus"))
    }

    fn rebind_toggle_hotkey(&self, old: &str, new: &str) -> Result<(), HostError> {
        hotkeys::rebind_toggle(&self.app, old, new)
    }

    fn set_escape_capture(&self, capture: bool) -> Result<(), HostError> {
        hotkeys::set_escape_capture(&self.app, capture)
    }

    fn release_hotkeys(&self) -> Result<(), HostError> {
        hotkeys::release_all(&self.app)
    }

    fn teardown(&self) -> Result<(), HostError> {
        tray::remove(&self.app);
        overlay(&self.app)?
            .destroy()
            .map_err(window_error("destroy"))
    }

    fn publish(&self, event: OverlayEvent) {
        match event {
            OverlayEvent::EnabledChanged(enabled) => {
                self.with_renderer(|r| r.on_enabled_changed(enabled));
                self.emit("enabled-changed", enabled);
            }
            OverlayEvent::DrawingModeChanged(drawing) => {
                self.with_renderer(|r| r.on_drawing_mode_changed(drawing));
                self.emit("drawing-mode", drawing);
            }
            OverlayEvent::ConfigChanged(settings) => {
                self.with_renderer(|r| r.on_config_changed(&settings));
                self.emit("config-changed", settings);
            }
        }
    }

    fn refresh_status(&self, status: &StatusSnapshot) {
        if let Err(e) = tray::refresh(&self.app, status) {
            log::warn!("Failed to refresh tray: {}", e);
        }
    }

    fn exit(&self) {
        self.app.exit(0);
    }
}
