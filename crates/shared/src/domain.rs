use std::fmt;
use std::str::FromStr;

use candid::{CandidType, Principal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A record as stored by the canister. The client never mutates these
/// locally; uniqueness and access control live on the backend.
#[derive(Debug, Clone, PartialEq, CandidType, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub id: String,
    pub patient_id: Principal,
    pub record_type: String,
    pub content: String,
    /// Nanoseconds since the Unix epoch, as produced by `ic_cdk::api::time`.
    pub timestamp: u64,
    pub authorized_providers: Vec<Principal>,
}

impl MedicalRecord {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        created_at(self.timestamp)
    }
}

#[derive(Debug, Clone, PartialEq, CandidType, Serialize, Deserialize)]
pub struct RecordInput {
    pub record_type: String,
    pub content: String,
}

/// Converts a canister timestamp (ns since epoch) to a wall-clock time.
/// Returns `None` for values chrono cannot represent.
pub fn created_at(timestamp_ns: u64) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(timestamp_ns / 1_000_000_000).ok()?;
    let nanos = (timestamp_ns % 1_000_000_000) as u32;
    DateTime::from_timestamp(secs, nanos)
}

/// The record categories the backend understands. The wire field is plain
/// text; this enum only constrains what the client offers and accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordCategory {
    Diagnosis,
    Prescription,
    LabResult,
}

impl RecordCategory {
    pub const ALL: [RecordCategory; 3] = [
        RecordCategory::Diagnosis,
        RecordCategory::Prescription,
        RecordCategory::LabResult,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RecordCategory::Diagnosis => "diagnosis",
            RecordCategory::Prescription => "prescription",
            RecordCategory::LabResult => "lab_result",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RecordCategory::Diagnosis => "Diagnosis",
            RecordCategory::Prescription => "Prescription",
            RecordCategory::LabResult => "Lab result",
        }
    }
}

impl fmt::Display for RecordCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown record category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for RecordCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "diagnosis" => Ok(RecordCategory::Diagnosis),
            "prescription" => Ok(RecordCategory::Prescription),
            "lab_result" | "lab-result" => Ok(RecordCategory::LabResult),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_wire_text() {
        for category in RecordCategory::ALL {
            assert_eq!(category.as_str().parse::<RecordCategory>(), Ok(category));
        }
    }

    #[test]
    fn category_parsing_is_case_insensitive_and_trims() {
        assert_eq!(
            " Diagnosis ".parse::<RecordCategory>(),
            Ok(RecordCategory::Diagnosis)
        );
        assert_eq!(
            "LAB-RESULT".parse::<RecordCategory>(),
            Ok(RecordCategory::LabResult)
        );
    }

    #[test]
    fn category_parsing_rejects_unknown_labels() {
        let err = "x-ray".parse::<RecordCategory>().unwrap_err();
        assert_eq!(err, UnknownCategory("x-ray".to_string()));
    }

    #[test]
    fn created_at_converts_nanosecond_timestamps() {
        // 2021-05-06T12:00:00Z in ns, plus half a second.
        let ns = 1_620_302_400_500_000_000u64;
        let ts = created_at(ns).unwrap();
        assert_eq!(ts.timestamp(), 1_620_302_400);
        assert_eq!(ts.timestamp_subsec_nanos(), 500_000_000);
    }

    #[test]
    fn created_at_handles_zero() {
        assert_eq!(created_at(0).unwrap().timestamp(), 0);
    }
}
