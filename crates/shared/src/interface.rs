//! Static description of the medical-records canister service. The actor
//! layer dispatches query vs update calls through this table instead of
//! hard-coding method strings at every call site.

/// Whether a method is a certified state change or a fast read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    /// Read-only; answered by a single replica without consensus.
    Query,
    /// State-changing; goes through consensus and must be awaited.
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Greet,
    AddRecord,
    GetMyRecords,
    ShareWithProvider,
    GetSharedRecords,
    RevokeAccess,
}

impl Method {
    pub const ALL: [Method; 6] = [
        Method::Greet,
        Method::AddRecord,
        Method::GetMyRecords,
        Method::ShareWithProvider,
        Method::GetSharedRecords,
        Method::RevokeAccess,
    ];

    /// The method name as exported by the canister.
    pub fn name(self) -> &'static str {
        match self {
            Method::Greet => "greet",
            Method::AddRecord => "add_record",
            Method::GetMyRecords => "get_my_records",
            Method::ShareWithProvider => "share_with_provider",
            Method::GetSharedRecords => "get_shared_records",
            Method::RevokeAccess => "revoke_access",
        }
    }

    pub fn mode(self) -> CallMode {
        match self {
            Method::Greet | Method::GetMyRecords | Method::GetSharedRecords => CallMode::Query,
            Method::AddRecord | Method::ShareWithProvider | Method::RevokeAccess => {
                CallMode::Update
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_canister_exports() {
        let names: Vec<&str> = Method::ALL.iter().map(|m| m.name()).collect();
        assert_eq!(
            names,
            vec![
                "greet",
                "add_record",
                "get_my_records",
                "share_with_provider",
                "get_shared_records",
                "revoke_access",
            ]
        );
    }

    #[test]
    fn reads_are_queries_and_writes_are_updates() {
        assert_eq!(Method::Greet.mode(), CallMode::Query);
        assert_eq!(Method::GetMyRecords.mode(), CallMode::Query);
        assert_eq!(Method::GetSharedRecords.mode(), CallMode::Query);
        assert_eq!(Method::AddRecord.mode(), CallMode::Update);
        assert_eq!(Method::ShareWithProvider.mode(), CallMode::Update);
        assert_eq!(Method::RevokeAccess.mode(), CallMode::Update);
    }
}
