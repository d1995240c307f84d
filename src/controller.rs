use std::path::PathBuf;
use std::time::Duration;

use crate::clock::{Clock, Deadline};
use crate::error::{HostError, SettingsError};
use crate::host::{Deferred, OverlayHost};
use crate::settings::{self, Settings};
use crate::state::{ModeState, OverlayEvent, StatusSnapshot};

/// Drawing mode is left automatically after this long without an exit.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// How often click-through is re-asserted while not drawing.
pub const SAFETY_SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Which timers fired during a [`ModeController::poll`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollOutcome {
    pub idle_timeout: bool,
    pub safety_sweep: bool,
}

/// Owns the enabled / drawing-mode lifecycle and the persisted settings.
pub struct ModeController<H, C> {
    mode: ModeState,
    settings: Settings,
    settings_path: PathBuf,
    host: H,
    clock: C,
    idle_timeout: Deadline,
    safety_sweep: Deadline,
    deferred: Deferred,
    shut_down: bool,
}

impl<H: OverlayHost, C: Clock> ModeController<H, C> {
    pub fn new(host: H, clock: C, settings: Settings, settings_path: PathBuf) -> Self {
        let mut safety_sweep = Deadline::default();
        safety_sweep.arm(clock.now(), SAFETY_SWEEP_INTERVAL);
        Self {
            mode: ModeState::default(),
            settings,
            settings_path,
            host,
            clock,
            idle_timeout: Deadline::default(),
            safety_sweep,
            deferred: Deferred::default(),
            shut_down: false,
        }
    }

    /// Applies the startup side effects: click-through on, initial state out.
    pub fn start(&mut self) {
        guard("set click-through", self.host.set_click_through(true));
        self.host
            .publish(OverlayEvent::EnabledChanged(self.mode.is_enabled()));
        self.host
            .publish(OverlayEvent::ConfigChanged(self.settings.clone()));
        self.refresh();
    }

    pub fn mode(&self) -> ModeState {
        self.mode
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot::new(self.mode, &self.settings)
    }

    pub fn idle_timeout_armed(&self) -> bool {
        self.idle_timeout.is_armed()
    }

    /// Hands over the tray and Escape updates queued since the last call.
    /// Apply them only after releasing any lock around the controller.
    pub fn take_deferred(&mut self) -> Deferred {
        std::mem::take(&mut self.deferred)
    }

    pub fn toggle_enabled(&mut self) {
        let current = self.mode;
        self.mode = match current {
            ModeState::Drawing => {
                self.exit_drawing_mode();
                ModeState::Disabled
            }
            ModeState::Idle => ModeState::Disabled,
            ModeState::Disabled => ModeState::Idle,
        };
        log::info!(
            "Feature {}",
            if self.mode.is_enabled() { "enabled" } else { "disabled" }
        );
        self.host
            .publish(OverlayEvent::EnabledChanged(self.mode.is_enabled()));
        self.refresh();
    }

    pub fn toggle_drawing_mode(&mut self) {
        if self.mode.is_drawing() {
            self.exit_drawing_mode();
        } else {
            self.enter_drawing_mode();
        }
    }

    /// Returns false when not in `Idle` (disabled or already drawing).
    pub fn enter_drawing_mode(&mut self) -> bool {
        if self.mode != ModeState::Idle {
            return false;
        }
        self.mode = ModeState::Drawing;
        self.idle_timeout.arm(self.clock.now(), IDLE_TIMEOUT);

        guard("set click-through", self.host.set_click_through(false));
        guard("raise overlay", self.host.raise());
        self.host.publish(OverlayEvent::DrawingModeChanged(true));
        self.deferred.capture_escape(true);
        self.refresh();
        log::info!("Entered drawing mode");
        true
    }

    pub fn exit_drawing_mode(&mut self) -> bool {
        if self.mode != ModeState::Drawing {
            return false;
        }
        self.mode = ModeState::Idle;
        self.idle_timeout.clear();

        guard("set click-through", self.host.set_click_through(true));
        self.host.publish(OverlayEvent::DrawingModeChanged(false));
        self.deferred.capture_escape(false);
        self.refresh();
        log::info!("Exited drawing mode");
        true
    }

    pub fn escape(&mut self) {
        self.exit_drawing_mode();
    }

    /// Runs whichever timers are due.
    pub fn poll(&mut self) -> PollOutcome {
        let now = self.clock.now();
        let mut outcome = PollOutcome::default();

        if self.idle_timeout.fire(now) && self.mode.is_drawing() {
            log::warn!("Drawing mode timed out, leaving it");
            self.exit_drawing_mode();
            outcome.idle_timeout = true;
        }

        if self.safety_sweep.fire(now) {
            self.safety_sweep.arm(now, SAFETY_SWEEP_INTERVAL);
            if !self.mode.is_drawing() && !self.shut_down {
                guard("re-assert click-through", self.host.set_click_through(true));
                outcome.safety_sweep = true;
            }
        }

        outcome
    }

    pub fn set_fade_out_duration(&mut self, seconds: f64) -> Result<(), SettingsError> {
        let seconds =
            settings::fade_out_choice(seconds).ok_or(SettingsError::InvalidFadeOut { value: seconds })?;
        self.settings.fade_out_duration = seconds;
        self.persist();
        self.host
            .publish(OverlayEvent::ConfigChanged(self.settings.clone()));
        self.refresh();
        log::info!("Fade-out duration set to {}s", seconds);
        Ok(())
    }

    pub fn set_shortcut(&mut self, shortcut: &str) -> Result<(), SettingsError> {
        if !settings::is_shortcut_choice(shortcut) {
            return Err(SettingsError::InvalidShortcut(shortcut.to_string()));
        }
        if self.settings.shortcut == shortcut {
            return Ok(());
        }
        guard(
            "rebind toggle hotkey",
            self.host.rebind_toggle_hotkey(&self.settings.shortcut, shortcut),
        );
        self.settings.shortcut = shortcut.to_string();
        self.persist();
        self.host
            .publish(OverlayEvent::ConfigChanged(self.settings.clone()));
        self.refresh();
        log::info!("Shortcut set to {}", shortcut);
        Ok(())
    }

    /// Reverts every side effect. Each step runs even if an earlier one failed.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.idle_timeout.clear();
        // Releasing the hotkeys and removing the tray supersede anything queued.
        self.deferred = Deferred::default();
        if self.mode.is_drawing() {
            self.mode = ModeState::Idle;
        }

        guard("restore click-through", self.host.set_click_through(true));
        guard("release hotkeys", self.host.release_hotkeys());
        guard("tear down surfaces", self.host.teardown());
    }

    pub fn force_quit(&mut self) {
        log::info!("Force quit");
        self.shutdown();
        self.host.exit();
    }

    fn persist(&self) {
        if let Err(e) = self.settings.save(&self.settings_path) {
            log::warn!("Failed to save settings: {}", e);
        }
    }

    fn refresh(&mut self) {
        let status = self.status();
        self.deferred.refresh(status);
    }
}

fn guard(op: &str, result: Result<(), HostError>) {
    if let Err(e) = result {
        log::warn!("Failed to {}: {}", op, e);
    }
}
