#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod backend_bridge;
mod controller;
mod ui;

use crossbeam_channel::bounded;
use eframe::egui;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::app::{PersistedConnectionSettings, RecordsGuiApp, SETTINGS_STORAGE_KEY};

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);

    backend_bridge::runtime::launch(cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Medical Records Desktop")
            .with_inner_size([980.0, 720.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Medical Records Desktop",
        options,
        Box::new(move |cc| {
            let persisted = cc
                .storage
                .and_then(|storage| storage.get_string(SETTINGS_STORAGE_KEY))
                .and_then(|text| {
                    serde_json::from_str::<PersistedConnectionSettings>(&text).ok()
                });
            Ok(Box::new(RecordsGuiApp::new(cmd_tx, ui_rx, persisted)))
        }),
    )
}
