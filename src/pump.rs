use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tauri::{AppHandle, Emitter, Manager};

use crate::system::window::OVERLAY_LABEL;
use crate::{with_controller, Renderer};

const FRAME_INTERVAL: Duration = Duration::from_millis(16);
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Tracks whether the frame task is running so at most one exists.
#[derive(Default)]
pub struct FramePump {
    running: AtomicBool,
}

/// Starts the per-frame task unless it is already running.
///
/// The task stops itself once the renderer has nothing left to draw; it
/// clears `running` while holding the renderer lock, so a drag started
/// right after is never left without frames.
pub fn ensure_frames(app: &AppHandle) {
    let pump = app.state::<FramePump>();
    if pump.running.swap(true, Ordering::SeqCst) {
        return;
    }

    let app = app.clone();
    tauri::async_runtime::spawn(async move {
        let mut interval = tokio::time::interval(FRAME_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let (frames, idle) = {
                let renderer = app.state::<Mutex<Renderer>>();
                let Ok(mut renderer) = renderer.lock() else {
                    app.state::<FramePump>().running.store(false, Ordering::SeqCst);
                    return;
                };
                let frames = renderer.tick();
                let idle = renderer.is_idle();
                if idle {
                    app.state::<FramePump>().running.store(false, Ordering::SeqCst);
                }
                (frames, idle)
            };

            if let Err(e) = app.emit_to(OVERLAY_LABEL, "overlay-frame", &frames) {
                log::warn!("Failed to emit frame: {}", e);
            }
            if idle {
                log::debug!("Frame pump idle, stopping");
                return;
            }
        }
    });
}

/// Drives the controller's idle timeout and safety sweep.
pub fn spawn_safety_loop(app: &AppHandle) {
    let app = app.clone();
    tauri::async_runtime::spawn(async move {
        let mut interval = tokio::time::interval(POLL_INTERVAL);
        loop {
            interval.tick().await;
            let outcome = with_controller(&app, |c| c.poll());
            if outcome.safety_sweep {
                log::trace!("Click-through re-asserted");
            }
        }
    });
}
