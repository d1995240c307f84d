use crate::error::HostError;
use crate::state::{OverlayEvent, StatusSnapshot};

/// The windowing, hotkey and tray side of the application.
///
/// The controller drives every side effect through this trait so the mode
/// state machine can be exercised without a real window.
pub trait OverlayHost {
    /// `true` lets clicks pass through the overlay to the windows beneath.
    fn set_click_through(&self, click_through: bool) -> Result<(), HostError>;

    /// Raises the overlay above every other window.
    fn raise(&self) -> Result<(), HostError>;

    /// Unregisters `old` before registering `new` as the toggle shortcut.
    fn rebind_toggle_hotkey(&self, old: &str, new: &str) -> Result<(), HostError>;

    /// Grabs Escape while drawing and gives it back afterwards. Must be
    /// idempotent.
    fn set_escape_capture(&self, capture: bool) -> Result<(), HostError>;

    fn release_hotkeys(&self) -> Result<(), HostError>;

    /// Destroys the tray icon and the overlay window.
    fn teardown(&self) -> Result<(), HostError>;

    fn publish(&self, event: OverlayEvent);

    /// Rebuilds the tray menu.
    fn refresh_status(&self, status: &StatusSnapshot);

    fn exit(&self);
}

/// Host work queued by the controller and applied once it is unlocked.
///
/// Menu rebuilds and shortcut registration wait on the main thread, which may
/// itself be waiting for the controller. Only the latest value of each is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Deferred {
    escape_capture: Option<bool>,
    status: Option<StatusSnapshot>,
}

impl Deferred {
    pub fn capture_escape(&mut self, capture: bool) {
        self.escape_capture = Some(capture);
    }

    pub fn refresh(&mut self, status: StatusSnapshot) {
        self.status = Some(status);
    }

    pub fn is_empty(&self) -> bool {
        self.escape_capture.is_none() && self.status.is_none()
    }

    pub fn apply<H: OverlayHost>(self, host: &H) {
        if let Some(capture) = self.escape_capture {
            if let Err(e) = host.set_escape_capture(capture) {
                log::warn!("Escape binding not updated: {}", e);
            }
        }
        if let Some(status) = self.status {
            host.refresh_status(&status);
        }
    }
}
