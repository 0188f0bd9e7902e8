use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use log::info;
use uuid::Uuid;

use crate::models::{ReceiptStatus, SubmissionReceipt, SubmissionRequest};

/// Delivers a finished request to whoever answers the SOS.
pub trait SosSender: Send + Sync + 'static {
    fn send(
        &self,
        request: SubmissionRequest,
    ) -> impl Future<Output = Result<SubmissionReceipt>> + Send;
}

/// Stand-in for the delivery backend: waits, logs the payload, acknowledges.
pub struct SimulatedSender {
    holder_name: String,
    delay: Duration,
}

impl SimulatedSender {
    pub fn new(holder_name: impl Into<String>, delay: Duration) -> Self {
        Self {
            holder_name: holder_name.into(),
            delay,
        }
    }
}

impl SosSender for SimulatedSender {
    async fn send(&self, request: SubmissionRequest) -> Result<SubmissionReceipt> {
        tokio::time::sleep(self.delay).await;

        let payload = serde_json::to_string(&payload(&request))
            .context("failed to serialize SOS payload")?;
        info!("SOS sent to {}: {payload}", self.holder_name);

        Ok(SubmissionReceipt {
            status: ReceiptStatus::Ok,
            sos_id: Some(Uuid::new_v4().to_string()),
            timestamp: Utc::now(),
            message: None,
        })
    }
}

fn payload(request: &SubmissionRequest) -> serde_json::Value {
    serde_json::json!({
        "type": request.category.id,
        "priority": request.category.priority.as_str(),
        "amount": request.amount,
        "message": request.category.message,
        "location": request.reading,
        "timestamp": request.submitted_at.to_rfc3339(),
    })
}
