use serde::{Deserialize, Serialize};

/// Readings tighter than this are shown as excellent.
pub const EXCELLENT_ACCURACY_M: f64 = 20.0;
/// Readings tighter than this (but not excellent) are shown as good.
pub const GOOD_ACCURACY_M: f64 = 50.0;

/// One latitude/longitude sample from the positioning source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PositionReading {
    pub latitude: f64,
    pub longitude: f64,
    /// Radius in meters; lower is better. `None` when the platform omits it.
    pub accuracy_meters: Option<f64>,
}

impl PositionReading {
    pub fn new(latitude: f64, longitude: f64, accuracy_meters: Option<f64>) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_meters,
        }
    }

    /// Accuracy if the platform reported a usable one. NaN, infinite and
    /// negative values count as missing.
    pub fn usable_accuracy(&self) -> Option<f64> {
        self.accuracy_meters
            .filter(|accuracy| accuracy.is_finite() && *accuracy >= 0.0)
    }

    /// True when `self` should displace `current` as the best reading.
    ///
    /// A missing accuracy never displaces a present one, and equal accuracy
    /// keeps the earlier reading.
    pub fn improves_on(&self, current: &PositionReading) -> bool {
        match (self.usable_accuracy(), current.usable_accuracy()) {
            (Some(candidate), Some(best)) => candidate < best,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    pub fn is_within(&self, threshold_m: f64) -> bool {
        self.usable_accuracy()
            .map(|accuracy| accuracy < threshold_m)
            .unwrap_or(false)
    }

    pub fn band(&self) -> AccuracyBand {
        AccuracyBand::classify(self.usable_accuracy())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AccuracyBand {
    Excellent,
    Good,
    Coarse,
    Unknown,
}

impl AccuracyBand {
    pub fn classify(accuracy_meters: Option<f64>) -> Self {
        match accuracy_meters {
            Some(m) if m < EXCELLENT_ACCURACY_M => AccuracyBand::Excellent,
            Some(m) if m < GOOD_ACCURACY_M => AccuracyBand::Good,
            Some(_) => AccuracyBand::Coarse,
            None => AccuracyBand::Unknown,
        }
    }
}
