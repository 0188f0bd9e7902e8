pub mod acquirer;
pub mod best;
pub mod error;
pub mod simulated;
pub mod source;

pub use acquirer::{AcquisitionOutcome, PositionAcquirer};
pub use best::BestReading;
pub use error::{AcquisitionError, PlatformErrorCode};
pub use simulated::SimulatedSource;
pub use source::{
    PermissionState, PlatformStatus, PositionEvent, PositionSource, PositionWatch, WatchOptions,
};
