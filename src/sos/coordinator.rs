use std::sync::Arc;

use log::{debug, info, warn};
use thiserror::Error;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::location::{AcquisitionError, PositionAcquirer, PositionSource};
use crate::models::{SosCategory, SubmissionRequest};
use crate::settings::AppConfig;

use super::{CoordinatorState, SosSender};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("unknown SOS category '{0}'")]
    UnknownCategory(String),
    #[error("category '{0}' requires an amount")]
    AmountRequired(String),
    #[error("amount must be greater than zero")]
    InvalidAmount,
}

/// A started action: its id plus a view of the coordinator state.
pub struct SosAction {
    pub id: Uuid,
    pub states: watch::Receiver<CoordinatorState>,
}

impl SosAction {
    /// Resolves once this action completes or aborts, or once a reset or a
    /// newer action replaces it. Returns the state observed at that point.
    pub async fn wait_finished(&mut self) -> CoordinatorState {
        let id = self.id;
        let finished = self
            .states
            .wait_for(|state| state.action_id() != Some(id) || state.is_terminal())
            .await
            .map(|state| state.clone());
        finished.unwrap_or_else(|_| self.states.borrow().clone())
    }
}

struct ActiveAction {
    id: Uuid,
    cancel_token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Sequences location acquisition and submission for one SOS at a time.
pub struct SosCoordinator<S: SosSender> {
    config: Arc<AppConfig>,
    acquirer: PositionAcquirer,
    sender: Arc<S>,
    state_tx: Arc<watch::Sender<CoordinatorState>>,
    active: Arc<Mutex<Option<ActiveAction>>>,
}

impl<S: SosSender> Clone for SosCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            acquirer: self.acquirer.clone(),
            sender: Arc::clone(&self.sender),
            state_tx: Arc::clone(&self.state_tx),
            active: Arc::clone(&self.active),
        }
    }
}

impl<S: SosSender> SosCoordinator<S> {
    pub fn new(config: Arc<AppConfig>, source: Arc<dyn PositionSource>, sender: S) -> Self {
        let acquirer = PositionAcquirer::new(source, config.acquisition);
        let (state_tx, _) = watch::channel(CoordinatorState::Idle);

        Self {
            config,
            acquirer,
            sender: Arc::new(sender),
            state_tx: Arc::new(state_tx),
            active: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn state(&self) -> CoordinatorState {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CoordinatorState> {
        self.state_tx.subscribe()
    }

    pub async fn start_by_id(
        &self,
        category_id: &str,
        amount: Option<u32>,
    ) -> Result<SosAction, StartError> {
        let category = self
            .config
            .category(category_id)
            .cloned()
            .ok_or_else(|| StartError::UnknownCategory(category_id.to_string()))?;
        self.start_sos_request(&category, amount).await
    }

    /// Starts a new action, cancelling any action still in flight.
    ///
    /// Validation failures leave the current state untouched.
    pub async fn start_sos_request(
        &self,
        category: &SosCategory,
        amount: Option<u32>,
    ) -> Result<SosAction, StartError> {
        let amount = validate_amount(category, amount)?;

        self.reset().await;

        let id = Uuid::new_v4();
        let cancel_token = CancellationToken::new();
        let mut active = self.active.lock().await;
        if let Some(stale) = active.take() {
            stale.cancel_token.cancel();
            stale.handle.abort();
        }

        let (initial, prepared) = if category.requires_location {
            let state = CoordinatorState::AcquiringLocation {
                action_id: id,
                category_id: category.id.clone(),
            };
            (state, None)
        } else {
            let request = SubmissionRequest::new(category.clone(), amount, None);
            let state = CoordinatorState::Submitting {
                action_id: id,
                request: request.clone(),
                attached_location: false,
                location_error: None,
            };
            (state, Some(request))
        };

        info!(
            "SOS action {id} started for '{}' -> {}",
            category.id,
            initial.as_str()
        );
        self.state_tx.send_replace(initial);

        let handle = tokio::spawn(drive_action(
            self.clone(),
            id,
            cancel_token.clone(),
            category.clone(),
            amount,
            prepared,
        ));

        *active = Some(ActiveAction {
            id,
            cancel_token,
            handle,
        });

        Ok(SosAction {
            id,
            states: self.state_tx.subscribe(),
        })
    }

    /// Cancels any in-flight action and returns to `Idle`. Once this resolves
    /// the action's position watch is closed and it can no longer publish.
    pub async fn reset(&self) {
        let previous = {
            let mut active = self.active.lock().await;
            let previous = active.take();
            if let Some(action) = &previous {
                action.cancel_token.cancel();
            }
            if self.state_tx.borrow().action_id().is_some() {
                info!("SOS coordinator reset to Idle");
            }
            self.state_tx.send_replace(CoordinatorState::Idle);
            previous
        };

        if let Some(action) = previous {
            if let Err(err) = action.handle.await {
                if !err.is_cancelled() {
                    warn!("SOS action {} ended abnormally: {err}", action.id);
                }
            }
        }
    }

    /// Publishes `state` only while `action_id` is still the active action.
    async fn publish(&self, action_id: Uuid, state: CoordinatorState) -> bool {
        let active = self.active.lock().await;
        match active.as_ref() {
            Some(action) if action.id == action_id => {
                info!("SOS action {action_id} -> {}", state.as_str());
                self.state_tx.send_replace(state);
                true
            }
            _ => {
                debug!("dropping {} from superseded action {action_id}", state.as_str());
                false
            }
        }
    }
}

fn validate_amount(category: &SosCategory, amount: Option<u32>) -> Result<Option<u32>, StartError> {
    if !category.requires_amount() {
        if amount.is_some() {
            debug!("ignoring amount for category '{}'", category.id);
        }
        return Ok(None);
    }

    match amount {
        None => Err(StartError::AmountRequired(category.id.clone())),
        Some(0) => Err(StartError::InvalidAmount),
        Some(value) => Ok(Some(value)),
    }
}

async fn drive_action<S: SosSender>(
    coordinator: SosCoordinator<S>,
    action_id: Uuid,
    cancel_token: CancellationToken,
    category: SosCategory,
    amount: Option<u32>,
    prepared: Option<SubmissionRequest>,
) {
    let (request, location_error) = match prepared {
        Some(request) => (request, None),
        None => {
            let Some(outcome) = coordinator.acquirer.acquire_with_cancel(&cancel_token).await
            else {
                return;
            };

            let location_error = outcome.error();
            if let Some(error) = location_error {
                warn!("SOS action {action_id} continues without location: {error}");
            }

            let request = SubmissionRequest::new(category, amount, outcome.reading());
            let submitting = CoordinatorState::Submitting {
                action_id,
                request: request.clone(),
                attached_location: request.has_location(),
                location_error,
            };
            if !coordinator.publish(action_id, submitting).await {
                return;
            }
            (request, location_error)
        }
    };

    let result = tokio::select! {
        biased;
        _ = cancel_token.cancelled() => return,
        result = coordinator.sender.send(request.clone()) => result,
    };

    let terminal = match result {
        Ok(receipt) => CoordinatorState::Completed {
            action_id,
            attached_location: request.has_location(),
            request,
            receipt,
            location_error,
        },
        Err(err) => {
            warn!("SOS action {action_id} failed to send: {err:#}");
            CoordinatorState::Aborted {
                action_id,
                error: AcquisitionError::Unknown,
                message: format!("{err:#}"),
            }
        }
    };
    coordinator.publish(action_id, terminal).await;
}
