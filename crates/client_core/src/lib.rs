use std::path::PathBuf;

use async_trait::async_trait;
use candid::Principal;
use shared::domain::{MedicalRecord, RecordCategory, RecordInput, UnknownCategory};
use thiserror::Error;

mod actor;
pub use actor::CanisterActor;

/// Everything needed to establish a connection handle to the canister.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Replica or gateway URL, e.g. `http://127.0.0.1:4943`.
    pub host: String,
    /// Canister id in textual form, e.g. `uxrrr-q7777-77774-qaaaq-cai`.
    pub canister_id: String,
    /// Optional Ed25519 or secp256k1 PEM file; the agent stays anonymous
    /// without one.
    pub identity_pem: Option<PathBuf>,
    /// Must only be set against a local replica. The mainnet root key ships
    /// with the agent; fetching it from an untrusted gateway defeats
    /// certificate validation.
    pub fetch_root_key: bool,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid canister id '{text}': {reason}")]
    InvalidCanisterId { text: String, reason: String },
    #[error("invalid provider principal '{text}': {reason}")]
    InvalidPrincipal { text: String, reason: String },
    #[error("invalid replica host '{host}': {reason}")]
    InvalidHost { host: String, reason: String },
    #[error("record content must not be empty")]
    EmptyContent,
    #[error("record id must not be empty")]
    EmptyRecordId,
    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategory),
    #[error("failed to load identity from '{path}': {reason}")]
    IdentityLoad { path: String, reason: String },
    #[error("failed to build agent for {host}: {source}")]
    AgentSetup {
        host: String,
        #[source]
        source: ic_agent::AgentError,
    },
    #[error("failed to fetch root key from {host}: {source}")]
    RootKeyFetch {
        host: String,
        #[source]
        source: ic_agent::AgentError,
    },
    #[error("canister call '{method}' failed: {source}")]
    Call {
        method: &'static str,
        #[source]
        source: ic_agent::AgentError,
    },
    #[error("failed to encode arguments for '{method}': {source}")]
    EncodeArgs {
        method: &'static str,
        #[source]
        source: candid::Error,
    },
    #[error("failed to decode response of '{method}': {source}")]
    DecodeResponse {
        method: &'static str,
        #[source]
        source: candid::Error,
    },
}

/// The canister actor as seen by the apps: one method per operation of the
/// service's interface description. Object safe so UIs can hold it behind a
/// trait object and tests can substitute a stub.
#[async_trait]
pub trait RecordsActor: Send + Sync {
    /// Diagnostic echo call.
    async fn greet(&self, name: &str) -> Result<String, ClientError>;
    /// Submits a new record; returns the backend-generated record id.
    async fn add_record(&self, input: RecordInput) -> Result<String, ClientError>;
    /// Records owned by the calling identity.
    async fn get_my_records(&self) -> Result<Vec<MedicalRecord>, ClientError>;
    /// Grants `provider` access to the record. `false` means the backend
    /// refused (unknown record, or the caller does not own it).
    async fn share_with_provider(
        &self,
        record_id: &str,
        provider: Principal,
    ) -> Result<bool, ClientError>;
    /// Records other identities have shared with the caller.
    async fn get_shared_records(&self) -> Result<Vec<MedicalRecord>, ClientError>;
    /// Revokes a previously granted access; `false` means the backend refused.
    async fn revoke_access(
        &self,
        record_id: &str,
        provider: Principal,
    ) -> Result<bool, ClientError>;
}

pub fn parse_canister_id(text: &str) -> Result<Principal, ClientError> {
    Principal::from_text(text.trim()).map_err(|err| ClientError::InvalidCanisterId {
        text: text.trim().to_string(),
        reason: err.to_string(),
    })
}

pub fn parse_principal(text: &str) -> Result<Principal, ClientError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ClientError::InvalidPrincipal {
            text: String::new(),
            reason: "empty principal text".to_string(),
        });
    }
    Principal::from_text(trimmed).map_err(|err| ClientError::InvalidPrincipal {
        text: trimmed.to_string(),
        reason: err.to_string(),
    })
}

/// Form validation shared by the CLI and the GUI: known category, non-empty
/// content. Whitespace-only content counts as empty, matching the original
/// front-end behavior.
pub fn build_record_input(category: &str, content: &str) -> Result<RecordInput, ClientError> {
    let category: RecordCategory = category.parse()?;
    let content = content.trim();
    if content.is_empty() {
        return Err(ClientError::EmptyContent);
    }
    Ok(RecordInput {
        record_type: category.as_str().to_string(),
        content: content.to_string(),
    })
}

pub fn validate_record_id(record_id: &str) -> Result<String, ClientError> {
    let trimmed = record_id.trim();
    if trimmed.is_empty() {
        return Err(ClientError::EmptyRecordId);
    }
    Ok(trimmed.to_string())
}

/// True for loopback hosts, where fetching the root key is appropriate.
pub fn host_is_local(host: &str) -> bool {
    let Ok(url) = url::Url::parse(host.trim()) else {
        return false;
    };
    matches!(
        url.host_str(),
        Some("localhost") | Some("127.0.0.1") | Some("[::1]") | Some("::1")
    )
}

/// Display order for record lists: newest first, id as a stable tie-break.
pub fn sort_newest_first(records: &mut [MedicalRecord]) {
    records.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests;
