//! Location readiness report for support and troubleshooting.

use std::sync::Arc;

use serde::Serialize;

use crate::location::{
    AcquisitionError, AcquisitionOutcome, PermissionState, PositionAcquirer, PositionSource,
};
use crate::models::AccuracyBand;
use crate::settings::AcquisitionSettings;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CheckStatus {
    Pass,
    Fail,
    Warn,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticCheck {
    pub name: &'static str,
    pub status: CheckStatus,
    pub details: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GpsProbe {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy_meters: Option<f64>,
    pub band: Option<AccuracyBand>,
    pub error: Option<AcquisitionError>,
}

impl From<AcquisitionOutcome> for GpsProbe {
    fn from(outcome: AcquisitionOutcome) -> Self {
        match outcome.reading() {
            Some(reading) => GpsProbe {
                latitude: Some(reading.latitude),
                longitude: Some(reading.longitude),
                accuracy_meters: reading.accuracy_meters,
                band: Some(reading.band()),
                error: None,
            },
            None => GpsProbe {
                latitude: None,
                longitude: None,
                accuracy_meters: None,
                band: None,
                error: outcome.error(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticReport {
    pub checks: Vec<DiagnosticCheck>,
    /// Only attempted when geolocation exists and the context is secure.
    pub gps: Option<GpsProbe>,
}

impl DiagnosticReport {
    pub fn check(&self, name: &str) -> Option<&DiagnosticCheck> {
        self.checks.iter().find(|check| check.name == name)
    }
}

fn check(name: &'static str, status: CheckStatus, details: impl Into<String>) -> DiagnosticCheck {
    DiagnosticCheck {
        name,
        status,
        details: details.into(),
    }
}

pub async fn run_diagnostics(
    source: Arc<dyn PositionSource>,
    settings: &AcquisitionSettings,
) -> DiagnosticReport {
    let status = source.status();
    let secure = status.secure_context || !status.secure_context_required;

    let mut checks = vec![
        if status.geolocation_supported {
            check("geolocation", CheckStatus::Pass, "Geolocation API available")
        } else {
            check("geolocation", CheckStatus::Fail, "Geolocation API not available")
        },
        if status.online {
            check("online", CheckStatus::Pass, "Internet connection active")
        } else {
            check("online", CheckStatus::Fail, "Offline")
        },
        if secure {
            check("secureContext", CheckStatus::Pass, "Secure context")
        } else {
            check("secureContext", CheckStatus::Fail, "HTTPS required for geolocation")
        },
    ];

    checks.push(match status.permission {
        PermissionState::Granted => check("permission", CheckStatus::Pass, "Permission granted"),
        PermissionState::Denied => check(
            "permission",
            CheckStatus::Fail,
            "Permission denied; re-enable it in the device settings",
        ),
        PermissionState::Prompt => {
            check("permission", CheckStatus::Warn, "Permission not requested yet")
        }
        PermissionState::Unknown => {
            check("permission", CheckStatus::Warn, "Unable to query permission state")
        }
    });

    let gps = if status.geolocation_supported && secure {
        let acquirer = PositionAcquirer::new(source, settings.for_diagnostics());
        Some(GpsProbe::from(acquirer.acquire_best_position().await))
    } else {
        None
    };

    DiagnosticReport { checks, gps }
}
