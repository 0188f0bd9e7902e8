use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Numeric error codes reported by the platform positioning API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformErrorCode(pub u16);

impl PlatformErrorCode {
    pub const PERMISSION_DENIED: PlatformErrorCode = PlatformErrorCode(1);
    pub const POSITION_UNAVAILABLE: PlatformErrorCode = PlatformErrorCode(2);
    pub const TIMEOUT: PlatformErrorCode = PlatformErrorCode(3);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AcquisitionError {
    #[error("geolocation is not available on this device")]
    Unsupported,
    #[error("device is offline; geolocation unavailable")]
    Offline,
    #[error("geolocation permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    Unavailable,
    #[error("timed out waiting for a position")]
    TimedOut,
    #[error("a secure context (HTTPS) is required for geolocation")]
    InsecureContext,
    #[error("unknown geolocation error")]
    Unknown,
}

impl AcquisitionError {
    pub fn from_platform_code(code: PlatformErrorCode) -> Self {
        match code {
            PlatformErrorCode::PERMISSION_DENIED => AcquisitionError::PermissionDenied,
            PlatformErrorCode::POSITION_UNAVAILABLE => AcquisitionError::Unavailable,
            PlatformErrorCode::TIMEOUT => AcquisitionError::TimedOut,
            _ => AcquisitionError::Unknown,
        }
    }
}
