use std::sync::Mutex;
use tauri::{AppHandle, State};

use crate::overlay::DragEnd;
use crate::pump;
use crate::state::StatusSnapshot;
use crate::{with_controller, Renderer};

#[tauri::command]
pub fn pointer_down(
    app: AppHandle,
    x: f64,
    y: f64,
    renderer: State<'_, Mutex<Renderer>>,
) -> Result<bool, String> {
    let started = {
        let mut r = renderer.lock().map_err(|e| e.to_string())?;
        r.on_pointer_down(x, y)
    };
    if started {
        pump::ensure_frames(&app);
    }
    Ok(started)
}

#[tauri::command]
pub fn pointer_move(x: f64, y: f64, renderer: State<'_, Mutex<Renderer>>) -> Result<(), String> {
    let mut r = renderer.lock().map_err(|e| e.to_string())?;
    r.on_pointer_move(x, y);
    Ok(())
}

#[tauri::command]
pub fn pointer_up(
    app: AppHandle,
    x: f64,
    y: f64,
    renderer: State<'_, Mutex<Renderer>>,
) -> Result<(), String> {
    let end = {
        let mut r = renderer.lock().map_err(|e| e.to_string())?;
        r.on_pointer_up(x, y)
    };
    match end {
        DragEnd::Fading { removal_in } => {
            log::debug!("Selection fading, removed in {:?}", removal_in);
            pump::ensure_frames(&app);
        }
        DragEnd::Discarded => log::debug!("Selection discarded"),
        DragEnd::Ignored => {}
    }
    Ok(())
}

// The controller commands are async so they run on the runtime instead of
// the main thread; see `with_controller`.

#[tauri::command]
pub async fn get_status(app: AppHandle) -> StatusSnapshot {
    with_controller(&app, |c| c.status())
}

#[tauri::command]
pub async fn toggle_enabled(app: AppHandle) -> StatusSnapshot {
    with_controller(&app, |c| {
        c.toggle_enabled();
        c.status()
    })
}

#[tauri::command]
pub async fn toggle_drawing_mode(app: AppHandle) -> StatusSnapshot {
    with_controller(&app, |c| {
        c.toggle_drawing_mode();
        c.status()
    })
}

#[tauri::command]
pub async fn set_fade_out_duration(app: AppHandle, seconds: f64) -> Result<StatusSnapshot, String> {
    with_controller(&app, |c| {
        c.set_fade_out_duration(seconds).map_err(|e| e.to_string())?;
        Ok(c.status())
    })
}

#[tauri::command]
pub async fn set_shortcut(app: AppHandle, shortcut: String) -> Result<StatusSnapshot, String> {
    with_controller(&app, |c| {
        c.set_shortcut(&shortcut).map_err(|e| e.to_string())?;
        Ok(c.status())
    })
}
