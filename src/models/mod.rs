pub mod category;
pub mod reading;
pub mod request;

pub use category::{Priority, SosCategory};
pub use reading::{AccuracyBand, PositionReading};
pub use request::{ReceiptStatus, SubmissionReceipt, SubmissionRequest};
