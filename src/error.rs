use thiserror::Error;

/// Failures reported by the windowing / hotkey collaborator.
///
/// These never abort a mode transition: callers log them and carry on.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("overlay window `{0}` is not available")]
    WindowMissing(&'static str),
    #[error("window operation `{op}` failed: {reason}")]
    Window { op: &'static str, reason: String },
    #[error("hotkey `{accelerator}`: {reason}")]
    Hotkey { accelerator: String, reason: String },
    #[error("tray: {0}")]
    Tray(String),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings encoding: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{value} is not one of the offered fade-out durations")]
    InvalidFadeOut { value: f64 },
    #[error("`{0}` is not one of the offered shortcuts")]
    InvalidShortcut(String),
}
