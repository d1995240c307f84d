#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use selection_glow_lib::clock::ManualClock;
use selection_glow_lib::controller::ModeController;
use selection_glow_lib::error::HostError;
use selection_glow_lib::host::OverlayHost;
use selection_glow_lib::overlay::OverlayRenderer;
use selection_glow_lib::settings::Settings;
use selection_glow_lib::state::{OverlayEvent, StatusSnapshot};

pub type TestRenderer = OverlayRenderer<ManualClock, StdRng>;

#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    ClickThrough(bool),
    Raise,
    Rebind { old: String, new: String },
    EscapeCapture(bool),
    ReleaseHotkeys,
    Teardown,
    Publish(OverlayEvent),
    Refresh(StatusSnapshot),
    Exit,
}

/// Records every call and forwards notifications to an optional renderer.
#[derive(Default)]
pub struct RecordingHost {
    pub calls: RefCell<Vec<HostCall>>,
    pub failing: RefCell<Vec<&'static str>>,
    pub renderer: Option<Rc<RefCell<TestRenderer>>>,
}

impl RecordingHost {
    pub fn failing(ops: &[&'static str]) -> Self {
        Self {
            failing: RefCell::new(ops.to_vec()),
            ..Default::default()
        }
    }

    fn record(&self, op: &'static str, call: HostCall) -> Result<(), HostError> {
        self.calls.borrow_mut().push(call);
        if self.failing.borrow().contains(&op) {
            return Err(HostError::WindowMissing("overlay"));
        }
        Ok(())
    }

    pub fn take_calls(&self) -> Vec<HostCall> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    pub fn click_through_calls(&self) -> Vec<bool> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                HostCall::ClickThrough(v) => Some(*v),
                _ => None,
            })
            .collect()
    }
}

impl OverlayHost for RecordingHost {
    fn set_click_through(&self, click_through: bool) -> Result<(), HostError> {
        self.record("click_through", HostCall::ClickThrough(click_through))
    }

    fn raise(&self) -> Result<(), HostError> {
        self.record("raise", HostCall::Raise)
    }

    fn rebind_toggle_hotkey(&self, old: &str, new: &str) -> Result<(), HostError> {
        self.record(
            "rebind",
            HostCall::Rebind {
                old: old.to_string(),
                new: new.to_string(),
            },
        )
    }

    fn set_escape_capture(&self, capture: bool) -> Result<(), HostError> {
        self.record("escape_capture", HostCall::EscapeCapture(capture))
    }

    fn release_hotkeys(&self) -> Result<(), HostError> {
        self.record("release_hotkeys", HostCall::ReleaseHotkeys)
    }

    fn teardown(&self) -> Result<(), HostError> {
        self.record("teardown", HostCall::Teardown)
    }

    fn publish(&self, event: OverlayEvent) {
        if let Some(renderer) = &self.renderer {
            let mut renderer = renderer.borrow_mut();
            match &event {
                OverlayEvent::EnabledChanged(enabled) => renderer.on_enabled_changed(*enabled),
                OverlayEvent::DrawingModeChanged(drawing) => {
                    renderer.on_drawing_mode_changed(*drawing)
                }
                OverlayEvent::ConfigChanged(settings) => renderer.on_config_changed(settings),
            }
        }
        self.calls.borrow_mut().push(HostCall::Publish(event));
    }

    fn refresh_status(&self, status: &StatusSnapshot) {
        self.calls.borrow_mut().push(HostCall::Refresh(status.clone()));
    }

    fn exit(&self) {
        self.calls.borrow_mut().push(HostCall::Exit);
    }
}

pub fn renderer(clock: &ManualClock) -> TestRenderer {
    OverlayRenderer::new(clock.clone(), StdRng::seed_from_u64(0x5e1ec7), &Settings::default())
}

pub struct Harness {
    pub controller: ModeController<RecordingHost, ManualClock>,
    pub renderer: Rc<RefCell<TestRenderer>>,
    pub clock: ManualClock,
    pub dir: tempfile::TempDir,
}

/// A started controller wired to a renderer the way the app wires them.
pub fn harness() -> Harness {
    let dir = tempfile::tempdir().expect("tempdir");
    let clock = ManualClock::new();
    let renderer = Rc::new(RefCell::new(renderer(&clock)));
    let host = RecordingHost {
        renderer: Some(renderer.clone()),
        ..Default::default()
    };
    let mut controller = ModeController::new(
        host,
        clock.clone(),
        Settings::default(),
        dir.path().join("config.json"),
    );
    controller.start();
    controller.take_deferred().apply(controller.host());
    controller.host().take_calls();
    Harness {
        controller,
        renderer,
        clock,
        dir,
    }
}
