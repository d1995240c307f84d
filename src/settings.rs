use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Fade-out durations offered in the tray, in seconds.
pub const FADE_OUT_CHOICES: [f64; 5] = [0.5, 0.8, 1.0, 1.5, 2.0];

/// Toggle shortcuts offered in the tray.
pub const SHORTCUT_CHOICES: [&str; 4] = [
    "CommandOrControl+`",
    "CommandOrControl+D",
    "CommandOrControl+E",
    "CommandOrControl+Shift+H",
];

/// Always registered, never remappable.
pub const EMERGENCY_QUIT_SHORTCUT: &str = "CommandOrControl+Shift+Q";

pub const ESCAPE_SHORTCUT: &str = "Escape";

const DEFAULT_FADE_OUT: f64 = 1.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_shortcut")]
    pub shortcut: String,
    #[serde(default = "default_fade_out")]
    pub fade_out_duration: f64,
}

fn default_shortcut() -> String {
    SHORTCUT_CHOICES[0].to_string()
}

fn default_fade_out() -> f64 {
    DEFAULT_FADE_OUT
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            shortcut: default_shortcut(),
            fade_out_duration: default_fade_out(),
        }
    }
}

/// Returns the offered duration equal to `seconds`, if any.
pub fn fade_out_choice(seconds: f64) -> Option<f64> {
    FADE_OUT_CHOICES
        .iter()
        .copied()
        .find(|choice| (choice - seconds).abs() < 1e-9)
}

pub fn is_shortcut_choice(shortcut: &str) -> bool {
    SHORTCUT_CHOICES.contains(&shortcut)
}

impl Settings {
    /// Reads the settings file. Anything unreadable falls back to defaults.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(contents) => match serde_json::from_str::<Settings>(&contents) {
                    Ok(settings) => return settings.sanitized(),
                    Err(e) => log::warn!("Failed to parse settings: {}, using defaults", e),
                },
                Err(e) => log::warn!("Failed to read settings: {}, using defaults", e),
            }
        }
        Self::default()
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Keeps hand-edited values; only a duration that cannot drive a fade is
    /// replaced. The shortcut is checked when it is registered.
    fn sanitized(mut self) -> Self {
        if !self.fade_out_duration.is_finite() || self.fade_out_duration < 0.0 {
            log::warn!(
                "Fade-out duration {} is unusable, using {}",
                self.fade_out_duration,
                DEFAULT_FADE_OUT
            );
            self.fade_out_duration = DEFAULT_FADE_OUT;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("config.json"));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.shortcut, "CommandOrControl+`");
        assert_eq!(settings.fade_out_duration, 1.5);
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let settings = Settings {
            shortcut: "CommandOrControl+D".to_string(),
            fade_out_duration: 0.8,
        };
        settings.save(&path).unwrap();

        assert_eq!(Settings::load(&path), settings);
    }

    #[test]
    fn corrupt_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ shortcut: ").unwrap();

        assert_eq!(Settings::load(&path), Settings::default());
    }

    #[test]
    fn missing_fields_take_individual_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "fadeOutDuration": 2.0 }"#).unwrap();

        let settings = Settings::load(&path);
        assert_eq!(settings.shortcut, "CommandOrControl+`");
        assert_eq!(settings.fade_out_duration, 2.0);
    }

    #[test]
    fn unlisted_values_survive_a_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let settings = Settings {
            shortcut: "X".to_string(),
            fade_out_duration: 0.8,
        };
        settings.save(&path).unwrap();

        assert_eq!(Settings::load(&path), settings);
    }

    #[test]
    fn hand_edited_values_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "shortcut": "Alt+F4", "fadeOutDuration": 7.25 }"#,
        )
        .unwrap();

        let settings = Settings::load(&path);
        assert_eq!(settings.shortcut, "Alt+F4");
        assert_eq!(settings.fade_out_duration, 7.25);
    }

    #[test]
    fn negative_duration_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "fadeOutDuration": -1.0 }"#).unwrap();

        assert_eq!(Settings::load(&path).fade_out_duration, 1.5);
    }

    #[test]
    fn file_uses_camel_case_keys() {
        let json = serde_json::to_string(&Settings::default()).unwrap();
        assert!(json.contains("\"fadeOutDuration\""));
        assert!(json.contains("\"shortcut\""));
    }
}
