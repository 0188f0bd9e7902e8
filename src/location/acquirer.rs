use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::models::PositionReading;
use crate::settings::AcquisitionSettings;

use super::best::BestReading;
use super::error::AcquisitionError;
use super::source::{PositionEvent, PositionSource, WatchOptions};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum AcquisitionOutcome {
    /// A reading met the excellent-accuracy threshold.
    Success(PositionReading),
    /// Best reading accepted after the deadline or a platform error.
    Degraded(PositionReading),
    Failure(AcquisitionError),
}

impl AcquisitionOutcome {
    pub fn reading(&self) -> Option<PositionReading> {
        match self {
            AcquisitionOutcome::Success(reading) | AcquisitionOutcome::Degraded(reading) => {
                Some(*reading)
            }
            AcquisitionOutcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<AcquisitionError> {
        match self {
            AcquisitionOutcome::Failure(error) => Some(*error),
            _ => None,
        }
    }
}

/// Bounded-time, best-effort position sampling over a [`PositionSource`].
#[derive(Clone)]
pub struct PositionAcquirer {
    source: Arc<dyn PositionSource>,
    settings: AcquisitionSettings,
}

impl PositionAcquirer {
    pub fn new(source: Arc<dyn PositionSource>, settings: AcquisitionSettings) -> Self {
        Self { source, settings }
    }

    /// Fast-fail checks performed before any subscription is opened.
    pub fn preflight(&self) -> Result<(), AcquisitionError> {
        let status = self.source.status();
        if !status.geolocation_supported {
            return Err(AcquisitionError::Unsupported);
        }
        if !status.online {
            return Err(AcquisitionError::Offline);
        }
        if status.secure_context_required && !status.secure_context {
            return Err(AcquisitionError::InsecureContext);
        }
        Ok(())
    }

    pub async fn acquire_best_position(&self) -> AcquisitionOutcome {
        let never_cancelled = CancellationToken::new();
        self.acquire_with_cancel(&never_cancelled)
            .await
            .unwrap_or(AcquisitionOutcome::Failure(AcquisitionError::Unknown))
    }

    /// Samples until early-accept, error, deadline or cancellation.
    ///
    /// Returns `None` only when `cancel_token` fired first. The watch is closed
    /// on every exit path.
    pub async fn acquire_with_cancel(
        &self,
        cancel_token: &CancellationToken,
    ) -> Option<AcquisitionOutcome> {
        if let Err(error) = self.preflight() {
            log_warn!("location preflight failed: {error}");
            return Some(AcquisitionOutcome::Failure(error));
        }

        let started = Instant::now();
        let deadline = time::sleep(self.settings.deadline());
        tokio::pin!(deadline);

        let mut watch = self.source.watch_position(WatchOptions::default());
        let mut best = BestReading::new();
        log_info!(
            "location sampling started (deadline {}ms, excellent < {}m)",
            self.settings.deadline_ms,
            self.settings.excellent_accuracy_m
        );

        let outcome = loop {
            tokio::select! {
                biased;

                _ = cancel_token.cancelled() => {
                    watch.close();
                    log_info!("location sampling cancelled after {}ms", started.elapsed().as_millis());
                    return None;
                }
                event = watch.next_event() => match event {
                    Some(PositionEvent::Reading(reading)) => {
                        if best.offer(reading) {
                            log_debug!("new best reading: {:?}m", reading.accuracy_meters);
                        }
                        if reading.is_within(self.settings.excellent_accuracy_m) {
                            break AcquisitionOutcome::Success(reading);
                        }
                    }
                    Some(PositionEvent::Error(code)) => {
                        let error = AcquisitionError::from_platform_code(code);
                        log_warn!("platform reported {error} (code {})", code.0);
                        break match best.get() {
                            Some(reading) => AcquisitionOutcome::Degraded(reading),
                            None => AcquisitionOutcome::Failure(error),
                        };
                    }
                    None => {
                        log_warn!("platform closed the position stream");
                        break match best.get() {
                            Some(reading) => AcquisitionOutcome::Degraded(reading),
                            None => AcquisitionOutcome::Failure(AcquisitionError::Unavailable),
                        };
                    }
                },
                _ = &mut deadline => {
                    break match best.get() {
                        Some(reading) => AcquisitionOutcome::Degraded(reading),
                        None => AcquisitionOutcome::Failure(AcquisitionError::TimedOut),
                    };
                }
            }
        };

        watch.close();
        log_info!(
            "location sampling finished in {}ms after {} readings: {:?}",
            started.elapsed().as_millis(),
            best.offered(),
            outcome
        );
        Some(outcome)
    }
}
