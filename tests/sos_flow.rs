use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::Utc;
use tokio::sync::Notify;

use sos_connect_lib::location::{
    AcquisitionError, PlatformErrorCode, PlatformStatus, PositionEvent, SimulatedSource,
};
use sos_connect_lib::models::{
    PositionReading, ReceiptStatus, SubmissionReceipt, SubmissionRequest,
};
use sos_connect_lib::settings::AppConfig;
use sos_connect_lib::sos::{CoordinatorState, SimulatedSender, SosCoordinator, SosSender, StartError};

/// Holds every send until the test opens the gate.
#[derive(Clone, Default)]
struct GatedSender {
    gate: Arc<Notify>,
    sent: Arc<AtomicUsize>,
    fail: bool,
}

impl SosSender for GatedSender {
    async fn send(&self, _request: SubmissionRequest) -> Result<SubmissionReceipt> {
        self.gate.notified().await;
        self.sent.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow!("backend unreachable"));
        }
        Ok(SubmissionReceipt {
            status: ReceiptStatus::Ok,
            sos_id: Some("sos-1".into()),
            timestamp: Utc::now(),
            message: None,
        })
    }
}

fn reading(accuracy: f64) -> PositionEvent {
    PositionEvent::Reading(PositionReading::new(48.8566, 2.3522, Some(accuracy)))
}

fn source(script: Vec<(Duration, PositionEvent)>) -> Arc<SimulatedSource> {
    Arc::new(SimulatedSource::scripted(PlatformStatus::default(), script))
}

fn instant_sender() -> SimulatedSender {
    SimulatedSender::new("Marie", Duration::from_millis(1_500))
}

#[tokio::test(start_paused = true)]
async fn excellent_reading_is_attached() {
    let source = source(vec![
        (Duration::from_secs(1), reading(80.0)),
        (Duration::from_secs(1), reading(45.0)),
        (Duration::from_secs(1), reading(15.0)),
        (Duration::from_secs(1), reading(4.0)),
    ]);
    let coordinator = SosCoordinator::new(
        Arc::new(AppConfig::default()),
        source.clone(),
        instant_sender(),
    );

    let mut action = coordinator.start_by_id("danger", None).await.expect("start");
    assert!(matches!(
        coordinator.state(),
        CoordinatorState::AcquiringLocation { .. }
    ));

    let finished = action.wait_finished().await;
    let CoordinatorState::Completed {
        request,
        attached_location,
        location_error,
        ..
    } = finished
    else {
        panic!("expected Completed, got {finished:?}");
    };
    assert!(attached_location);
    assert_eq!(location_error, None);
    assert_eq!(request.reading.and_then(|r| r.accuracy_meters), Some(15.0));
    assert_eq!(request.category.id, "danger");
    assert_eq!(source.active_watches(), 0);
}

#[tokio::test(start_paused = true)]
async fn permission_denied_still_submits_without_location() {
    let source = source(vec![(
        Duration::from_millis(200),
        PositionEvent::Error(PlatformErrorCode::PERMISSION_DENIED),
    )]);
    let sender = GatedSender::default();
    let coordinator =
        SosCoordinator::new(Arc::new(AppConfig::default()), source.clone(), sender.clone());

    let mut action = coordinator.start_by_id("medical", None).await.expect("start");
    let submitting = action
        .states
        .wait_for(|state| matches!(state, CoordinatorState::Submitting { .. }))
        .await
        .expect("state channel")
        .clone();

    assert!(!submitting.attached_location());
    assert_eq!(submitting.reading(), None);
    assert_eq!(
        submitting.location_error(),
        Some(AcquisitionError::PermissionDenied)
    );

    sender.gate.notify_one();
    let finished = action.wait_finished().await;
    assert!(matches!(finished, CoordinatorState::Completed { .. }));
    assert!(!finished.attached_location());
    assert_eq!(
        finished.location_error(),
        Some(AcquisitionError::PermissionDenied)
    );
}

#[tokio::test(start_paused = true)]
async fn financial_without_amount_stays_idle() {
    let source = source(vec![]);
    let coordinator = SosCoordinator::new(
        Arc::new(AppConfig::default()),
        source.clone(),
        instant_sender(),
    );

    let result = coordinator.start_by_id("financial", None).await;

    assert!(matches!(result, Err(StartError::AmountRequired(ref id)) if id == "financial"));
    assert_eq!(coordinator.state(), CoordinatorState::Idle);
    assert_eq!(source.watches_opened(), 0);
}

#[tokio::test(start_paused = true)]
async fn financial_with_amount_skips_acquisition() {
    let source = source(vec![(Duration::from_secs(1), reading(5.0))]);
    let coordinator = SosCoordinator::new(
        Arc::new(AppConfig::default()),
        source.clone(),
        instant_sender(),
    );

    let mut action = coordinator
        .start_by_id("financial", Some(50))
        .await
        .expect("start");
    assert!(matches!(
        coordinator.state(),
        CoordinatorState::Submitting {
            attached_location: false,
            ..
        }
    ));

    let finished = action.wait_finished().await;
    let CoordinatorState::Completed {
        request,
        attached_location,
        ..
    } = finished
    else {
        panic!("expected Completed, got {finished:?}");
    };
    assert!(!attached_location);
    assert_eq!(request.amount, Some(50));
    assert_eq!(request.reading, None);
    assert_eq!(source.watches_opened(), 0);
}

#[tokio::test(start_paused = true)]
async fn deadline_degrades_and_attaches_best_reading() {
    let source = source(vec![(Duration::from_secs(3), reading(60.0))]);
    let coordinator = SosCoordinator::new(
        Arc::new(AppConfig::default()),
        source.clone(),
        instant_sender(),
    );

    let started = tokio::time::Instant::now();
    let mut action = coordinator.start_by_id("pickup", None).await.expect("start");
    let finished = action.wait_finished().await;

    assert!(started.elapsed() >= Duration::from_secs(15));
    assert!(finished.attached_location());
    assert_eq!(
        finished.reading().and_then(|r| r.accuracy_meters),
        Some(60.0)
    );
    assert_eq!(finished.location_error(), None);
    assert_eq!(source.active_watches(), 0);
}

#[tokio::test(start_paused = true)]
async fn send_failure_aborts() {
    let sender = GatedSender {
        fail: true,
        ..GatedSender::default()
    };
    let coordinator = SosCoordinator::new(
        Arc::new(AppConfig::default()),
        source(vec![]),
        sender.clone(),
    );

    let mut action = coordinator
        .start_by_id("financial", Some(20))
        .await
        .expect("start");
    sender.gate.notify_one();

    let finished = action.wait_finished().await;
    let CoordinatorState::Aborted { error, message, .. } = finished else {
        panic!("expected Aborted, got {finished:?}");
    };
    assert_eq!(error, AcquisitionError::Unknown);
    assert!(message.contains("backend unreachable"));
}

#[tokio::test(start_paused = true)]
async fn reset_cancels_in_flight_acquisition() {
    let source = source(vec![(Duration::from_secs(10), reading(5.0))]);
    let coordinator = SosCoordinator::new(
        Arc::new(AppConfig::default()),
        source.clone(),
        instant_sender(),
    );

    let mut action = coordinator.start_by_id("danger", None).await.expect("start");
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(source.active_watches(), 1);

    coordinator.reset().await;
    assert_eq!(source.active_watches(), 0);
    assert_eq!(coordinator.state(), CoordinatorState::Idle);

    // Well past the point the cancelled watch would have resolved.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(coordinator.state(), CoordinatorState::Idle);
    assert_eq!(action.wait_finished().await, CoordinatorState::Idle);
}

#[tokio::test(start_paused = true)]
async fn new_action_supersedes_previous_one() {
    let source = source(vec![(Duration::from_secs(10), reading(70.0))]);
    let sender = GatedSender::default();
    let coordinator =
        SosCoordinator::new(Arc::new(AppConfig::default()), source.clone(), sender.clone());

    let mut first = coordinator.start_by_id("danger", None).await.expect("start");
    tokio::time::sleep(Duration::from_secs(1)).await;

    let mut second = coordinator
        .start_by_id("financial", Some(100))
        .await
        .expect("start second");
    assert_eq!(source.active_watches(), 0);

    let superseded = first.wait_finished().await;
    assert_eq!(superseded.action_id(), Some(second.id));

    tokio::time::sleep(Duration::from_secs(20)).await;
    sender.gate.notify_one();
    let finished = second.wait_finished().await;
    assert_eq!(finished.action_id(), Some(second.id));
    assert!(matches!(finished, CoordinatorState::Completed { .. }));
    assert_eq!(sender.sent.load(Ordering::SeqCst), 1);
    assert_eq!(source.watches_opened(), 1);
}

#[tokio::test(start_paused = true)]
async fn unknown_category_is_rejected() {
    let coordinator = SosCoordinator::new(
        Arc::new(AppConfig::default()),
        source(vec![]),
        instant_sender(),
    );
    let result = coordinator.start_by_id("teleport", None).await;
    assert!(matches!(result, Err(StartError::UnknownCategory(_))));
    assert_eq!(coordinator.state(), CoordinatorState::Idle);
}
