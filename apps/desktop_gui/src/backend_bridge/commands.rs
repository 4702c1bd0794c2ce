//! Backend commands queued from UI to backend worker.

use std::path::PathBuf;

pub enum BackendCommand {
    Connect {
        host: String,
        canister_id: String,
        identity_pem: Option<PathBuf>,
        fetch_root_key: bool,
    },
    /// Diagnostic echo call against the connected canister.
    Probe,
    AddRecord {
        category: String,
        content: String,
    },
    LoadRecords,
    Share {
        record_id: String,
        provider: String,
    },
    LoadSharedRecords,
    Revoke {
        record_id: String,
        provider: String,
    },
}
