use directories::ProjectDirs;
use std::path::PathBuf;

const SETTINGS_FILE_NAME: &str = "config.json";

pub struct AppConfig {
    pub config_dir: PathBuf,
}

impl AppConfig {
    pub fn new() -> Self {
        let config_dir = match ProjectDirs::from("com", "selection-glow", "SelectionGlow") {
            Some(dirs) => dirs.config_dir().to_path_buf(),
            None => {
                log::warn!("No home directory found, keeping config next to the executable");
                std::env::current_exe()
                    .ok()
                    .and_then(|exe| exe.parent().map(|p| p.to_path_buf()))
                    .unwrap_or_else(|| PathBuf::from("."))
            }
        };
        Self { config_dir }
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config_dir)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE_NAME)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}
