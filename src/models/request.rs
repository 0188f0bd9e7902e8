use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{PositionReading, SosCategory};

/// Snapshot handed to the send collaborator. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    pub category: SosCategory,
    pub amount: Option<u32>,
    pub reading: Option<PositionReading>,
    pub submitted_at: DateTime<Utc>,
}

impl SubmissionRequest {
    pub fn new(category: SosCategory, amount: Option<u32>, reading: Option<PositionReading>) -> Self {
        Self {
            category,
            amount,
            reading,
            submitted_at: Utc::now(),
        }
    }

    pub fn has_location(&self) -> bool {
        self.reading.is_some()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ReceiptStatus {
    Ok,
    Error,
}

/// Acknowledgement returned by the send collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub status: ReceiptStatus,
    pub sos_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub message: Option<String>,
}
