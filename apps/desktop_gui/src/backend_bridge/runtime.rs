//! Backend worker: owns the tokio runtime and the canister actor, drains the
//! UI command queue, and answers over the UI event channel.

use std::thread;

use client_core::{
    build_record_input, parse_principal, sort_newest_first, validate_record_id, CanisterActor,
    ConnectOptions, RecordsActor,
};
use crossbeam_channel::{Receiver, Sender};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(run_command_loop(cmd_rx, ui_tx));
    });
}

fn not_connected(ui_tx: &Sender<UiEvent>, context: UiErrorContext) {
    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
        context,
        "connect to the canister first",
    )));
}

fn send_error(ui_tx: &Sender<UiEvent>, context: UiErrorContext, err: impl std::fmt::Display) {
    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
        context,
        err.to_string(),
    )));
}

async fn run_command_loop(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

    // One connection handle reused across calls; None until Connect succeeds.
    let mut actor: Option<CanisterActor> = None;

    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            BackendCommand::Connect {
                host,
                canister_id,
                identity_pem,
                fetch_root_key,
            } => {
                let _ = ui_tx.try_send(UiEvent::Info(format!("Connecting to {host}...")));
                let options = ConnectOptions {
                    host,
                    canister_id,
                    identity_pem,
                    fetch_root_key,
                };
                match CanisterActor::connect(&options).await {
                    Ok(connected) => {
                        let canister_id = connected.canister_id().to_text();
                        actor = Some(connected);
                        let _ = ui_tx.try_send(UiEvent::ConnectedOk { canister_id });
                    }
                    Err(err) => {
                        actor = None;
                        send_error(&ui_tx, UiErrorContext::Connect, err);
                    }
                }
            }
            BackendCommand::Probe => {
                let Some(actor) = actor.as_ref() else {
                    not_connected(&ui_tx, UiErrorContext::Probe);
                    continue;
                };
                match actor.greet("diagnostics").await {
                    Ok(echo) => {
                        let _ = ui_tx.try_send(UiEvent::Info(format!("Canister responded: {echo}")));
                    }
                    Err(err) => send_error(&ui_tx, UiErrorContext::Probe, err),
                }
            }
            BackendCommand::AddRecord { category, content } => {
                let Some(actor) = actor.as_ref() else {
                    not_connected(&ui_tx, UiErrorContext::AddRecord);
                    continue;
                };
                let input = match build_record_input(&category, &content) {
                    Ok(input) => input,
                    Err(err) => {
                        send_error(&ui_tx, UiErrorContext::AddRecord, err);
                        continue;
                    }
                };
                match actor.add_record(input).await {
                    Ok(record_id) => {
                        let _ = ui_tx.try_send(UiEvent::RecordAdded { record_id });
                    }
                    Err(err) => send_error(&ui_tx, UiErrorContext::AddRecord, err),
                }
            }
            BackendCommand::LoadRecords => {
                let Some(actor) = actor.as_ref() else {
                    not_connected(&ui_tx, UiErrorContext::LoadRecords);
                    continue;
                };
                match actor.get_my_records().await {
                    Ok(mut records) => {
                        sort_newest_first(&mut records);
                        let _ = ui_tx.try_send(UiEvent::RecordsLoaded(records));
                    }
                    Err(err) => send_error(&ui_tx, UiErrorContext::LoadRecords, err),
                }
            }
            BackendCommand::Share {
                record_id,
                provider,
            } => {
                let Some(actor) = actor.as_ref() else {
                    not_connected(&ui_tx, UiErrorContext::Share);
                    continue;
                };
                let outcome = validate_record_id(&record_id)
                    .and_then(|record_id| Ok((record_id, parse_principal(&provider)?)));
                let (record_id, provider) = match outcome {
                    Ok(parts) => parts,
                    Err(err) => {
                        send_error(&ui_tx, UiErrorContext::Share, err);
                        continue;
                    }
                };
                match actor.share_with_provider(&record_id, provider).await {
                    Ok(granted) => {
                        let _ = ui_tx.try_send(UiEvent::ShareCompleted { granted });
                    }
                    Err(err) => send_error(&ui_tx, UiErrorContext::Share, err),
                }
            }
            BackendCommand::LoadSharedRecords => {
                let Some(actor) = actor.as_ref() else {
                    not_connected(&ui_tx, UiErrorContext::LoadSharedRecords);
                    continue;
                };
                match actor.get_shared_records().await {
                    Ok(mut records) => {
                        sort_newest_first(&mut records);
                        let _ = ui_tx.try_send(UiEvent::SharedRecordsLoaded(records));
                    }
                    Err(err) => send_error(&ui_tx, UiErrorContext::LoadSharedRecords, err),
                }
            }
            BackendCommand::Revoke {
                record_id,
                provider,
            } => {
                let Some(actor) = actor.as_ref() else {
                    not_connected(&ui_tx, UiErrorContext::Revoke);
                    continue;
                };
                let outcome = validate_record_id(&record_id)
                    .and_then(|record_id| Ok((record_id, parse_principal(&provider)?)));
                let (record_id, provider) = match outcome {
                    Ok(parts) => parts,
                    Err(err) => {
                        send_error(&ui_tx, UiErrorContext::Revoke, err);
                        continue;
                    }
                };
                match actor.revoke_access(&record_id, provider).await {
                    Ok(revoked) => {
                        let _ = ui_tx.try_send(UiEvent::RevokeCompleted { revoked });
                    }
                    Err(err) => send_error(&ui_tx, UiErrorContext::Revoke, err),
                }
            }
        }
    }
}
