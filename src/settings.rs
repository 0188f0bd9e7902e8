use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{Arc, RwLock},
    time::Duration,
};

use crate::models::{reading::EXCELLENT_ACCURACY_M, SosCategory};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AcquisitionSettings {
    /// Readings tighter than this end sampling immediately.
    pub excellent_accuracy_m: f64,
    pub deadline_ms: u64,
    /// Shorter budget used by the diagnostics GPS probe.
    pub diagnostic_deadline_ms: u64,
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self {
            excellent_accuracy_m: EXCELLENT_ACCURACY_M,
            deadline_ms: 15_000,
            diagnostic_deadline_ms: 10_000,
        }
    }
}

impl AcquisitionSettings {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    /// Same thresholds with the diagnostics deadline in place of the normal one.
    pub fn for_diagnostics(&self) -> Self {
        Self {
            deadline_ms: self.diagnostic_deadline_ms,
            ..*self
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmissionSettings {
    pub simulated_delay_ms: u64,
}

impl Default for SubmissionSettings {
    fn default() -> Self {
        Self {
            simulated_delay_ms: 1_500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Person alerted by every SOS.
    pub holder_name: String,
    pub categories: Vec<SosCategory>,
    pub acquisition: AcquisitionSettings,
    pub submission: SubmissionSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            holder_name: "Marie".into(),
            categories: SosCategory::defaults(),
            acquisition: AcquisitionSettings::default(),
            submission: SubmissionSettings::default(),
        }
    }
}

impl AppConfig {
    pub fn category(&self, id: &str) -> Option<&SosCategory> {
        self.categories.iter().find(|category| category.id == id)
    }

    /// Prompt shown under the buttons, specific to the picked category if any.
    pub fn help_message(&self, category_id: Option<&str>) -> &str {
        category_id
            .and_then(|id| self.category(id))
            .map(|category| category.help_message.as_str())
            .unwrap_or("Appuyez sur un bouton pour envoyer votre SOS.")
    }
}

/// Loaded once at startup. Readers get an immutable snapshot; updates swap the
/// whole config.
pub struct ConfigStore {
    path: PathBuf,
    data: RwLock<Arc<AppConfig>>,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring unreadable config {}: {err}", path.display());
                AppConfig::default()
            })
        } else {
            AppConfig::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(Arc::new(data)),
        })
    }

    pub fn current(&self) -> Arc<AppConfig> {
        match self.data.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn replace(&self, config: AppConfig) -> Result<Arc<AppConfig>> {
        self.persist(&config)?;
        let snapshot = Arc::new(config);
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Arc::clone(&snapshot);
        Ok(snapshot)
    }

    fn persist(&self, data: &AppConfig) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write config to {}", self.path.display()))
    }
}
