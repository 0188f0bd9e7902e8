use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::models::PositionReading;

use super::error::PlatformErrorCode;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
    Unknown,
}

impl Default for PermissionState {
    fn default() -> Self {
        PermissionState::Unknown
    }
}

/// Synchronous facts about the platform, read before any sampling starts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStatus {
    pub geolocation_supported: bool,
    pub online: bool,
    pub secure_context: bool,
    /// Some platforms only expose positioning over a secure transport.
    pub secure_context_required: bool,
    pub permission: PermissionState,
}

impl Default for PlatformStatus {
    fn default() -> Self {
        Self {
            geolocation_supported: true,
            online: true,
            secure_context: true,
            secure_context_required: true,
            permission: PermissionState::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    pub high_accuracy: bool,
    /// Oldest cached fix the platform may hand back, in milliseconds.
    pub maximum_age_ms: u64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            maximum_age_ms: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PositionEvent {
    Reading(PositionReading),
    Error(PlatformErrorCode),
}

/// An open, continuous position subscription.
///
/// Dropping the watch cancels it; the platform side stops delivering and
/// releases its resources once it observes the token.
pub struct PositionWatch {
    events: mpsc::UnboundedReceiver<PositionEvent>,
    cancel_token: CancellationToken,
}

impl PositionWatch {
    pub fn new(events: mpsc::UnboundedReceiver<PositionEvent>, cancel_token: CancellationToken) -> Self {
        Self {
            events,
            cancel_token,
        }
    }

    /// Next event in arrival order, or `None` once the platform closed the stream.
    pub async fn next_event(&mut self) -> Option<PositionEvent> {
        self.events.recv().await
    }

    pub fn close(&mut self) {
        self.cancel_token.cancel();
        self.events.close();
    }
}

impl Drop for PositionWatch {
    fn drop(&mut self) {
        self.close();
    }
}

/// The platform positioning API.
pub trait PositionSource: Send + Sync {
    fn status(&self) -> PlatformStatus;

    fn watch_position(&self, options: WatchOptions) -> PositionWatch;
}
