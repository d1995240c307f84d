pub mod clock;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod host;
pub mod overlay;
pub mod pump;
pub mod settings;
pub mod state;
pub mod system;

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tauri::{AppHandle, Manager, RunEvent};

use clock::SystemClock;
use config::AppConfig;
use controller::ModeController;
use overlay::OverlayRenderer;
use pump::FramePump;
use settings::Settings;
use system::hotkeys::{self, HotkeyAction, HotkeyBindings};
use system::tray::{self, TrayAction};
use system::window::{self, TauriHost};

pub type Renderer = OverlayRenderer<SystemClock, StdRng>;
pub type Controller = ModeController<TauriHost, SystemClock>;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    env_logger::init();

    let app = tauri::Builder::default()
        .plugin(
            tauri_plugin_global_shortcut::Builder::new()
                .with_handler(|app, shortcut, event| {
                    use tauri_plugin_global_shortcut::ShortcutState;
                    if !matches!(event.state, ShortcutState::Pressed) {
                        return;
                    }
                    let action = {
                        let bindings = app.state::<Mutex<HotkeyBindings>>();
                        let guard = bindings.lock();
                        guard.ok().and_then(|b| b.action_for(shortcut))
                    };
                    let Some(action) = action else {
                        return;
                    };
                    log::info!("Hotkey {:?} pressed", action);
                    // Leave the plugin's handler before touching registrations.
                    let app = app.clone();
                    tauri::async_runtime::spawn(async move {
                        on_hotkey(&app, action);
                    });
                })
                .build(),
        )
        .setup(|app| {
            #[cfg(target_os = "macos")]
            app.set_activation_policy(tauri::ActivationPolicy::Accessory);

            let config = AppConfig::new();
            if let Err(e) = config.ensure_dirs() {
                log::warn!("Failed to create config directory: {}", e);
            }
            let settings = Settings::load(&config.settings_path());
            log::info!(
                "Loaded settings: shortcut={} fade_out={}s",
                settings.shortcut,
                settings.fade_out_duration
            );

            app.manage(Mutex::new(HotkeyBindings::default()));
            app.manage(FramePump::default());
            app.manage(Mutex::new(Renderer::new(
                SystemClock,
                StdRng::from_entropy(),
                &settings,
            )));

            if let Err(e) = window::cover_primary_monitor(app.handle()) {
                log::warn!("Overlay not resized to the screen: {}", e);
            }

            let mut controller = Controller::new(
                TauriHost::new(app.handle().clone()),
                SystemClock,
                settings.clone(),
                config.settings_path(),
            );
            tray::setup_tray(app.handle(), &controller.status(), on_tray_action)?;
            controller.start();
            controller.take_deferred().apply(controller.host());
            app.manage(Mutex::new(controller));
            app.manage(config);

            hotkeys::register_startup(app.handle(), &settings.shortcut);
            pump::spawn_safety_loop(app.handle());

            log::info!(
                "Selection Glow running; emergency quit: {}",
                settings::EMERGENCY_QUIT_SHORTCUT
            );
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::pointer_down,
            commands::pointer_move,
            commands::pointer_up,
            commands::get_status,
            commands::toggle_enabled,
            commands::toggle_drawing_mode,
            commands::set_fade_out_duration,
            commands::set_shortcut,
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(|app, event| {
        if let RunEvent::Exit = event {
            let Some(controller) = app.try_state::<Mutex<Controller>>() else {
                return;
            };
            match controller.try_lock() {
                Ok(mut c) => c.shutdown(),
                Err(e) => log::warn!("Skipping shutdown cleanup: {}", e),
            };
        }
    });
}

/// Runs `act` on the locked controller, then applies the host work it queued.
///
/// Tauri answers menu and shortcut calls on the main thread, so this must only
/// run on a runtime task, never from a main-thread callback.
pub(crate) fn with_controller<T>(app: &AppHandle, act: impl FnOnce(&mut Controller) -> T) -> T {
    let controller = app.state::<Mutex<Controller>>();
    let (result, deferred, host) = {
        let mut guard = match controller.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let result = act(&mut guard);
        (result, guard.take_deferred(), guard.host().clone())
    };
    deferred.apply(&host);
    result
}

fn on_hotkey(app: &AppHandle, action: HotkeyAction) {
    with_controller(app, |c| match action {
        HotkeyAction::ToggleDrawing => c.toggle_drawing_mode(),
        HotkeyAction::Escape => c.escape(),
        HotkeyAction::EmergencyQuit => c.force_quit(),
    });
}

fn on_tray_action(app: &AppHandle, action: TrayAction) {
    // Menu events arrive on the main thread.
    let app = app.clone();
    tauri::async_runtime::spawn(async move {
        with_controller(&app, |c| match action {
            TrayAction::EnterDrawing => {
                c.enter_drawing_mode();
            }
            TrayAction::ExitDrawing => {
                c.exit_drawing_mode();
            }
            TrayAction::ToggleEnabled => c.toggle_enabled(),
            TrayAction::SetFadeOut(seconds) => {
                if let Err(e) = c.set_fade_out_duration(seconds) {
                    log::warn!("{}", e);
                }
            }
            TrayAction::SetShortcut(shortcut) => {
                if let Err(e) = c.set_shortcut(&shortcut) {
                    log::warn!("{}", e);
                }
            }
            TrayAction::Quit => c.force_quit(),
        });
    });
}
