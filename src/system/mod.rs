pub mod hotkeys;
pub mod tray;
pub mod window;
