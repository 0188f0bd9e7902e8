use serde::Serialize;
use uuid::Uuid;

use crate::location::AcquisitionError;
use crate::models::{PositionReading, SubmissionReceipt, SubmissionRequest};

/// Observable lifecycle of one user-initiated SOS action.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum CoordinatorState {
    Idle,
    #[serde(rename_all = "camelCase")]
    AcquiringLocation { action_id: Uuid, category_id: String },
    #[serde(rename_all = "camelCase")]
    Submitting {
        action_id: Uuid,
        request: SubmissionRequest,
        attached_location: bool,
        /// Why no reading was attached, when acquisition failed.
        location_error: Option<AcquisitionError>,
    },
    #[serde(rename_all = "camelCase")]
    Completed {
        action_id: Uuid,
        request: SubmissionRequest,
        receipt: SubmissionReceipt,
        attached_location: bool,
        location_error: Option<AcquisitionError>,
    },
    /// Send failed; the UI offers a retry.
    #[serde(rename_all = "camelCase")]
    Aborted {
        action_id: Uuid,
        error: AcquisitionError,
        message: String,
    },
}

impl Default for CoordinatorState {
    fn default() -> Self {
        CoordinatorState::Idle
    }
}

impl CoordinatorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoordinatorState::Idle => "Idle",
            CoordinatorState::AcquiringLocation { .. } => "AcquiringLocation",
            CoordinatorState::Submitting { .. } => "Submitting",
            CoordinatorState::Completed { .. } => "Completed",
            CoordinatorState::Aborted { .. } => "Aborted",
        }
    }

    pub fn action_id(&self) -> Option<Uuid> {
        match self {
            CoordinatorState::Idle => None,
            CoordinatorState::AcquiringLocation { action_id, .. }
            | CoordinatorState::Submitting { action_id, .. }
            | CoordinatorState::Completed { action_id, .. }
            | CoordinatorState::Aborted { action_id, .. } => Some(*action_id),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CoordinatorState::Completed { .. } | CoordinatorState::Aborted { .. }
        )
    }

    pub fn attached_location(&self) -> bool {
        match self {
            CoordinatorState::Submitting {
                attached_location, ..
            }
            | CoordinatorState::Completed {
                attached_location, ..
            } => *attached_location,
            _ => false,
        }
    }

    pub fn reading(&self) -> Option<PositionReading> {
        match self {
            CoordinatorState::Submitting { request, .. }
            | CoordinatorState::Completed { request, .. } => request.reading,
            _ => None,
        }
    }

    pub fn location_error(&self) -> Option<AcquisitionError> {
        match self {
            CoordinatorState::Submitting { location_error, .. }
            | CoordinatorState::Completed { location_error, .. } => *location_error,
            _ => None,
        }
    }
}
