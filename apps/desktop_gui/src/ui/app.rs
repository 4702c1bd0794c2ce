use std::path::PathBuf;

use arboard::Clipboard;
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use serde::{Deserialize, Serialize};
use shared::domain::{MedicalRecord, RecordCategory};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{
    classify_connect_failure, err_label, UiError, UiErrorContext, UiEvent,
};
use crate::controller::orchestration::dispatch_backend_command;

pub const SETTINGS_STORAGE_KEY: &str = "medrec_desktop_settings";
const DEFAULT_HOST: &str = "http://127.0.0.1:4943";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedConnectionSettings {
    pub host: String,
    pub canister_id: String,
    pub identity_pem: String,
}

impl Default for PersistedConnectionSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            canister_id: String::new(),
            identity_pem: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionStatus {
    Idle,
    Connecting,
    Connected,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppViewState {
    Connect,
    Main,
}

#[derive(Debug, Clone)]
struct StatusBanner {
    message: String,
}

fn host_environment_label(host: &str) -> &'static str {
    let host = host.to_ascii_lowercase();
    if host.contains("127.0.0.1") || host.contains("localhost") {
        "Local replica"
    } else if host.contains("testnet") || host.contains("staging") {
        "Testnet"
    } else {
        "Mainnet"
    }
}

pub struct RecordsGuiApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,

    host: String,
    canister_id: String,
    identity_pem_input: String,
    connection: ConnectionStatus,
    connected_canister: Option<String>,

    category: RecordCategory,
    content: String,

    share_record_id: String,
    share_provider: String,

    my_records: Vec<MedicalRecord>,
    shared_records: Vec<MedicalRecord>,

    status: String,
    status_banner: Option<StatusBanner>,
    view_state: AppViewState,
}

impl RecordsGuiApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        persisted: Option<PersistedConnectionSettings>,
    ) -> Self {
        let persisted = persisted.unwrap_or_default();
        Self {
            cmd_tx,
            ui_rx,
            host: persisted.host,
            canister_id: persisted.canister_id,
            identity_pem_input: persisted.identity_pem,
            connection: ConnectionStatus::Idle,
            connected_canister: None,
            category: RecordCategory::Diagnosis,
            content: String::new(),
            share_record_id: String::new(),
            share_provider: String::new(),
            my_records: Vec::new(),
            shared_records: Vec::new(),
            status: "Not connected".to_string(),
            status_banner: None,
            view_state: AppViewState::Connect,
        }
    }

    fn persisted_settings(&self) -> PersistedConnectionSettings {
        PersistedConnectionSettings {
            host: self.host.clone(),
            canister_id: self.canister_id.clone(),
            identity_pem: self.identity_pem_input.clone(),
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::ConnectedOk { canister_id } => {
                    self.connection = ConnectionStatus::Connected;
                    self.view_state = AppViewState::Main;
                    self.status = format!("Connected to canister {canister_id}");
                    self.status_banner = None;
                    self.connected_canister = Some(canister_id);
                    self.my_records.clear();
                    self.shared_records.clear();
                    dispatch_backend_command(
                        &self.cmd_tx,
                        BackendCommand::LoadRecords,
                        &mut self.status,
                    );
                    dispatch_backend_command(
                        &self.cmd_tx,
                        BackendCommand::LoadSharedRecords,
                        &mut self.status,
                    );
                }
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::Error(err) => self.handle_error(err),
                UiEvent::RecordAdded { record_id } => {
                    self.status = format!("Record added with ID: {record_id}");
                    self.content.clear();
                    // Pre-fill the sharing form and the clipboard so the id
                    // can be handed to a provider immediately.
                    self.share_record_id = record_id.clone();
                    if let Ok(mut clipboard) = Clipboard::new() {
                        let _ = clipboard.set_text(record_id);
                    }
                    dispatch_backend_command(
                        &self.cmd_tx,
                        BackendCommand::LoadRecords,
                        &mut self.status,
                    );
                }
                UiEvent::RecordsLoaded(records) => {
                    self.status = format!("Loaded {} records", records.len());
                    self.my_records = records;
                }
                UiEvent::SharedRecordsLoaded(records) => {
                    self.status = format!("Loaded {} shared records", records.len());
                    self.shared_records = records;
                }
                UiEvent::ShareCompleted { granted } => {
                    if granted {
                        self.status = "Record shared successfully".to_string();
                        dispatch_backend_command(
                            &self.cmd_tx,
                            BackendCommand::LoadRecords,
                            &mut self.status,
                        );
                    } else {
                        self.status =
                            "Failed to share record (not found or not yours)".to_string();
                    }
                }
                UiEvent::RevokeCompleted { revoked } => {
                    if revoked {
                        self.status = "Access revoked".to_string();
                        dispatch_backend_command(
                            &self.cmd_tx,
                            BackendCommand::LoadRecords,
                            &mut self.status,
                        );
                    } else {
                        self.status =
                            "Failed to revoke access (not found or not yours)".to_string();
                    }
                }
            }
        }
    }

    fn handle_error(&mut self, err: UiError) {
        match err.context() {
            UiErrorContext::Connect => {
                self.connection = ConnectionStatus::Error;
                self.view_state = AppViewState::Connect;
                self.status = classify_connect_failure(err.message());
                self.status_banner = Some(StatusBanner {
                    message: self.status.clone(),
                });
            }
            UiErrorContext::BackendStartup => {
                self.connection = ConnectionStatus::Error;
                self.status = err.message().to_string();
                self.status_banner = Some(StatusBanner {
                    message: self.status.clone(),
                });
            }
            _ => {
                self.status = format!("{} error: {}", err_label(err.category()), err.message());
            }
        }
    }

    fn try_connect(&mut self) {
        let canister_id = self.canister_id.trim().to_string();
        if canister_id.is_empty() {
            self.status = "Canister id is required".to_string();
            self.status_banner = Some(StatusBanner {
                message: "Please enter the canister id to connect to.".to_string(),
            });
            return;
        }

        let host = self.host.trim().to_string();
        if host.is_empty() {
            self.status = "Host URL is required".to_string();
            self.status_banner = Some(StatusBanner {
                message: "Please enter a replica host URL.".to_string(),
            });
            return;
        }

        let identity_pem = {
            let trimmed = self.identity_pem_input.trim();
            (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
        };

        self.connection = ConnectionStatus::Connecting;
        self.status_banner = None;
        let fetch_root_key = client_core::host_is_local(&host);
        dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::Connect {
                host,
                canister_id,
                identity_pem,
                fetch_root_key,
            },
            &mut self.status,
        );
    }

    fn connection_badge(&self) -> (&'static str, egui::Color32) {
        match self.connection {
            ConnectionStatus::Idle => ("not connected", egui::Color32::GRAY),
            ConnectionStatus::Connecting => ("connecting", egui::Color32::YELLOW),
            ConnectionStatus::Connected => ("connected", egui::Color32::GREEN),
            ConnectionStatus::Error => ("error", egui::Color32::RED),
        }
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        if let Some(banner) = self.status_banner.clone() {
            egui::Frame::NONE
                .fill(egui::Color32::from_rgb(111, 53, 53))
                .stroke(egui::Stroke::new(
                    1.0,
                    egui::Color32::from_rgb(175, 96, 96),
                ))
                .corner_radius(8.0)
                .inner_margin(egui::Margin::symmetric(10, 8))
                .show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        ui.label(egui::RichText::new(&banner.message).color(egui::Color32::WHITE));
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("Dismiss").clicked() {
                                self.status_banner = None;
                            }
                        });
                    });
                });
        }
    }

    fn show_connect_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let avail = ui.available_size();
            ui.add_space((avail.y * 0.12).clamp(18.0, 90.0));

            ui.vertical_centered(|ui| {
                ui.set_width(avail.x.clamp(440.0, 560.0));

                egui::Frame::NONE
                    .fill(ui.visuals().panel_fill)
                    .corner_radius(14.0)
                    .stroke(egui::Stroke::new(
                        1.0,
                        ui.visuals().widgets.noninteractive.bg_stroke.color,
                    ))
                    .inner_margin(egui::Margin::symmetric(20, 18))
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.label(egui::RichText::new("🩺").size(24.0));
                            ui.vertical(|ui| {
                                ui.heading("Medical Records");
                                ui.weak("Connect to your records canister.");
                            });
                        });

                        ui.add_space(8.0);
                        self.show_status_banner(ui);

                        ui.label(egui::RichText::new("Host URL").strong());
                        ui.add(
                            egui::TextEdit::singleline(&mut self.host)
                                .hint_text(DEFAULT_HOST)
                                .desired_width(f32::INFINITY),
                        );
                        ui.add_space(6.0);

                        ui.label(egui::RichText::new("Canister id").strong());
                        ui.add(
                            egui::TextEdit::singleline(&mut self.canister_id)
                                .hint_text("uxrrr-q7777-77774-qaaaq-cai")
                                .desired_width(f32::INFINITY),
                        );
                        ui.add_space(6.0);

                        ui.label(egui::RichText::new("Identity PEM (optional)").strong());
                        ui.add(
                            egui::TextEdit::singleline(&mut self.identity_pem_input)
                                .hint_text("Leave empty for the anonymous identity")
                                .desired_width(f32::INFINITY),
                        );

                        ui.add_space(10.0);
                        let is_busy = self.connection == ConnectionStatus::Connecting;
                        let connect_btn = egui::Button::new(
                            egui::RichText::new("Connect").strong().size(16.0),
                        )
                        .min_size(egui::vec2(ui.available_width(), 40.0));
                        if ui.add_enabled(!is_busy, connect_btn).clicked() {
                            self.try_connect();
                        }

                        ui.add_space(10.0);
                        ui.separator();
                        ui.horizontal_wrapped(|ui| {
                            ui.small("Status:");
                            ui.small(egui::RichText::new(&self.status).weak());
                        });
                    });
            });
        });
    }

    fn show_main_view(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Medical Records");
                let (badge, color) = self.connection_badge();
                ui.label(egui::RichText::new(format!("● {badge}")).color(color));
                if let Some(canister) = &self.connected_canister {
                    ui.small(format!(
                        "{canister} · {}",
                        host_environment_label(&self.host)
                    ));
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Change connection").clicked() {
                        self.view_state = AppViewState::Connect;
                        self.connection = ConnectionStatus::Idle;
                        self.connected_canister = None;
                        self.status = "Not connected".to_string();
                    }
                    if ui.button("Test connection").clicked() {
                        dispatch_backend_command(
                            &self.cmd_tx,
                            BackendCommand::Probe,
                            &mut self.status,
                        );
                    }
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_status_banner(ui);
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.show_add_record_section(ui);
                ui.add_space(10.0);
                self.show_my_records_section(ui);
                ui.add_space(10.0);
                self.show_sharing_section(ui);
                ui.add_space(10.0);
                self.show_shared_records_section(ui);
            });
        });
    }

    fn show_add_record_section(&mut self, ui: &mut egui::Ui) {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.label(egui::RichText::new("Add record").strong());
            ui.horizontal(|ui| {
                ui.label("Category");
                egui::ComboBox::from_id_salt("record_category")
                    .selected_text(self.category.label())
                    .show_ui(ui, |ui| {
                        for category in RecordCategory::ALL {
                            ui.selectable_value(&mut self.category, category, category.label());
                        }
                    });
            });
            ui.add(
                egui::TextEdit::multiline(&mut self.content)
                    .hint_text("Record content")
                    .desired_rows(3)
                    .desired_width(f32::INFINITY),
            );
            if ui.button("Add record").clicked() {
                if self.content.trim().is_empty() {
                    self.status = "Please enter record content".to_string();
                } else {
                    dispatch_backend_command(
                        &self.cmd_tx,
                        BackendCommand::AddRecord {
                            category: self.category.as_str().to_string(),
                            content: self.content.clone(),
                        },
                        &mut self.status,
                    );
                }
            }
        });
    }

    fn show_my_records_section(&mut self, ui: &mut egui::Ui) {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("My records").strong());
                if ui.button("Refresh").clicked() {
                    dispatch_backend_command(
                        &self.cmd_tx,
                        BackendCommand::LoadRecords,
                        &mut self.status,
                    );
                }
            });
            let records = self.my_records.clone();
            self.show_record_list(ui, &records);
        });
    }

    fn show_sharing_section(&mut self, ui: &mut egui::Ui) {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.label(egui::RichText::new("Sharing").strong());
            ui.horizontal(|ui| {
                ui.label("Record id");
                ui.add(
                    egui::TextEdit::singleline(&mut self.share_record_id)
                        .desired_width(260.0),
                );
            });
            ui.horizontal(|ui| {
                ui.label("Provider principal");
                ui.add(
                    egui::TextEdit::singleline(&mut self.share_provider)
                        .hint_text("e.g. 2vxsx-fae")
                        .desired_width(260.0),
                );
            });
            ui.horizontal(|ui| {
                let share_clicked = ui.button("Share").clicked();
                let revoke_clicked = ui.button("Revoke").clicked();
                if share_clicked || revoke_clicked {
                    if self.share_record_id.trim().is_empty()
                        || self.share_provider.trim().is_empty()
                    {
                        self.status =
                            "Please enter both record ID and provider ID".to_string();
                    } else if share_clicked {
                        dispatch_backend_command(
                            &self.cmd_tx,
                            BackendCommand::Share {
                                record_id: self.share_record_id.clone(),
                                provider: self.share_provider.clone(),
                            },
                            &mut self.status,
                        );
                    } else {
                        dispatch_backend_command(
                            &self.cmd_tx,
                            BackendCommand::Revoke {
                                record_id: self.share_record_id.clone(),
                                provider: self.share_provider.clone(),
                            },
                            &mut self.status,
                        );
                    }
                }
            });
        });
    }

    fn show_shared_records_section(&mut self, ui: &mut egui::Ui) {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Shared with me").strong());
                if ui.button("Refresh").clicked() {
                    dispatch_backend_command(
                        &self.cmd_tx,
                        BackendCommand::LoadSharedRecords,
                        &mut self.status,
                    );
                }
            });
            let records = self.shared_records.clone();
            self.show_record_list(ui, &records);
        });
    }

    fn show_record_list(&mut self, ui: &mut egui::Ui, records: &[MedicalRecord]) {
        if records.is_empty() {
            ui.weak("No records found.");
            return;
        }
        for record in records {
            self.show_record_card(ui, record);
        }
    }

    fn show_record_card(&mut self, ui: &mut egui::Ui, record: &MedicalRecord) {
        egui::Frame::NONE
            .fill(ui.visuals().faint_bg_color)
            .corner_radius(8.0)
            .inner_margin(egui::Margin::symmetric(10, 8))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new(record.record_type.to_uppercase())
                            .strong()
                            .color(egui::Color32::LIGHT_BLUE),
                    );
                    let created = record
                        .created_at()
                        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                        .unwrap_or_else(|| format!("{} ns", record.timestamp));
                    ui.small(format!("Created: {created}"));
                });
                ui.horizontal(|ui| {
                    ui.monospace(&record.id);
                    if ui.small_button("Copy id").clicked() {
                        ui.ctx().copy_text(record.id.clone());
                        self.status = "Copied record id to clipboard".to_string();
                    }
                });
                ui.label(&record.content);
                ui.small(format!(
                    "Shared with: {} provider(s)",
                    record.authorized_providers.len()
                ));
            });
    }
}

impl eframe::App for RecordsGuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let (badge, color) = self.connection_badge();
                ui.label(egui::RichText::new("●").color(color));
                ui.small(badge);
                ui.separator();
                ui.small(&self.status);
            });
        });

        match self.view_state {
            AppViewState::Connect => self.show_connect_screen(ctx),
            AppViewState::Main => self.show_main_view(ctx),
        }

        // Backend events arrive without user input; keep polling.
        ctx.request_repaint_after(std::time::Duration::from_millis(200));
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        if let Ok(text) = serde_json::to_string(&self.persisted_settings()) {
            storage.set_string(SETTINGS_STORAGE_KEY, text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persisted_settings_round_trip_through_json() {
        let settings = PersistedConnectionSettings {
            host: "https://icp0.io".to_string(),
            canister_id: "uxrrr-q7777-77774-qaaaq-cai".to_string(),
            identity_pem: "/home/me/identity.pem".to_string(),
        };
        let text = serde_json::to_string(&settings).unwrap();
        let restored: PersistedConnectionSettings = serde_json::from_str(&text).unwrap();
        assert_eq!(restored, settings);
    }

    #[test]
    fn persisted_settings_tolerate_missing_fields() {
        let restored: PersistedConnectionSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(restored.host, DEFAULT_HOST);
        assert!(restored.canister_id.is_empty());
    }

    #[test]
    fn environment_label_distinguishes_local_from_mainnet() {
        assert_eq!(host_environment_label("http://127.0.0.1:4943"), "Local replica");
        assert_eq!(host_environment_label("http://localhost:4943"), "Local replica");
        assert_eq!(host_environment_label("https://icp0.io"), "Mainnet");
        assert_eq!(
            host_environment_label("https://testnet.example"),
            "Testnet"
        );
    }
}
