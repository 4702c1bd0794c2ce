//! UI/backend events and error modeling for the desktop GUI controller.

use shared::domain::MedicalRecord;

pub enum UiEvent {
    ConnectedOk { canister_id: String },
    Info(String),
    Error(UiError),
    RecordAdded { record_id: String },
    RecordsLoaded(Vec<MedicalRecord>),
    SharedRecordsLoaded(Vec<MedicalRecord>),
    ShareCompleted { granted: bool },
    RevokeCompleted { revoked: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Validation,
    Canister,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Connect,
    AddRecord,
    LoadRecords,
    LoadSharedRecords,
    Share,
    Revoke,
    Probe,
}

pub fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Transport => "Transport",
        UiErrorCategory::Validation => "Validation",
        UiErrorCategory::Canister => "Canister",
        UiErrorCategory::Unknown => "Unexpected",
    }
}

/// Friendlier phrasing for the connect screen; never rewrites the
/// underlying message away, only frames it.
pub fn classify_connect_failure(message: &str) -> String {
    let lower = message.to_ascii_lowercase();
    if lower.contains("failed to fetch root key") {
        format!("Root key fetch failed; is the local replica running? ({message})")
    } else if lower.contains("failed to connect")
        || lower.contains("connection refused")
        || lower.contains("dns")
        || lower.contains("timed out")
    {
        format!("Replica unreachable; check the host URL and retry. ({message})")
    } else {
        format!("Connect error: {message}")
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_ascii_lowercase();
        let category = if lower.contains("invalid")
            || lower.contains("empty")
            || lower.contains("must not be")
            || lower.contains("unknown record category")
            || lower.contains("connect to the canister first")
        {
            UiErrorCategory::Validation
        } else if lower.contains("reject")
            || lower.contains("canister call")
            || lower.contains("certificate")
        {
            UiErrorCategory::Canister
        } else if lower.contains("connection")
            || lower.contains("timed out")
            || lower.contains("timeout")
            || lower.contains("dns")
            || lower.contains("network")
            || lower.contains("transport")
            || lower.contains("unreachable")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_failures_are_classified_before_transport() {
        let err = UiError::from_message(
            UiErrorContext::Share,
            "invalid provider principal 'x': bad checksum",
        );
        assert_eq!(err.category(), UiErrorCategory::Validation);
    }

    #[test]
    fn replica_rejections_count_as_canister_errors() {
        let err = UiError::from_message(
            UiErrorContext::AddRecord,
            "canister call 'add_record' failed: reject code 5",
        );
        assert_eq!(err.category(), UiErrorCategory::Canister);
    }

    #[test]
    fn network_failures_count_as_transport() {
        let err = UiError::from_message(UiErrorContext::Connect, "connection refused");
        assert_eq!(err.category(), UiErrorCategory::Transport);
    }

    #[test]
    fn shared_list_failures_carry_their_own_context() {
        let err = UiError::from_message(UiErrorContext::LoadSharedRecords, "connection reset");
        assert_eq!(err.context(), UiErrorContext::LoadSharedRecords);
        assert_ne!(err.context(), UiErrorContext::LoadRecords);
    }

    #[test]
    fn connect_failure_classification_keeps_the_original_message() {
        let friendly = classify_connect_failure("connection refused by 127.0.0.1:4943");
        assert!(friendly.contains("Replica unreachable"));
        assert!(friendly.contains("connection refused by 127.0.0.1:4943"));
    }
}
