pub mod diagnostics;
pub mod location;
pub mod models;
pub mod settings;
pub mod sos;
mod utils;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use log::{info, warn};

use location::{PositionSource, SimulatedSource};
use settings::ConfigStore;
use sos::{CoordinatorState, SimulatedSender, SosCoordinator};

const DEFAULT_CONFIG_FILE: &str = "sos-connect.json";
// Simulated fixes wander around central Paris.
const DEMO_LATITUDE: f64 = 48.8566;
const DEMO_LONGITUDE: f64 = 2.3522;

/// Entry point of the `sos-connect` binary.
///
/// `sos-connect [category] [amount]` runs one SOS against a simulated
/// platform; `sos-connect diagnose` prints the location diagnostics report.
pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    info!("SOS Connect starting up...");

    let config_path = std::env::var("SOS_CONNECT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
    let store = ConfigStore::new(config_path)?;
    let config = store.current();

    let mut args = std::env::args().skip(1);
    let command = args.next().unwrap_or_else(|| "danger".to_string());
    let amount = args
        .next()
        .map(|raw| raw.parse::<u32>())
        .transpose()
        .context("amount must be a whole number")?;

    // Everything runs on one cooperative scheduler.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    let source: Arc<dyn PositionSource> =
        Arc::new(SimulatedSource::wandering(DEMO_LATITUDE, DEMO_LONGITUDE));

    if command == "diagnose" {
        let report =
            runtime.block_on(diagnostics::run_diagnostics(source, &config.acquisition));
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let sender = SimulatedSender::new(
        config.holder_name.clone(),
        Duration::from_millis(config.submission.simulated_delay_ms),
    );
    let coordinator = SosCoordinator::new(Arc::clone(&config), source, sender);

    runtime.block_on(run_sos(coordinator, &command, amount))
}

async fn run_sos(
    coordinator: SosCoordinator<SimulatedSender>,
    category_id: &str,
    amount: Option<u32>,
) -> Result<()> {
    info!("{}", coordinator.config().help_message(Some(category_id)));
    let mut action = coordinator.start_by_id(category_id, amount).await?;

    let mut states = action.states.clone();
    loop {
        let state = states.borrow_and_update().clone();
        println!("{}", serde_json::to_string(&state)?);
        if state.is_terminal() || state.action_id() != Some(action.id) {
            break;
        }
        if states.changed().await.is_err() {
            break;
        }
    }

    match action.wait_finished().await {
        CoordinatorState::Completed {
            attached_location, ..
        } => {
            if attached_location {
                info!("Position shared with {}", coordinator.config().holder_name);
            } else {
                warn!("SOS delivered without location");
            }
            Ok(())
        }
        CoordinatorState::Aborted { message, .. } => Err(anyhow!("SOS failed: {message}")),
        other => Err(anyhow!("SOS ended in unexpected state {}", other.as_str())),
    }
}
