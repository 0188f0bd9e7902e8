use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::models::PositionReading;

use super::source::{PlatformStatus, PositionEvent, PositionSource, PositionWatch, WatchOptions};

/// One scripted delivery: wait `delay` after the previous step, then emit.
pub type ScriptStep = (Duration, PositionEvent);

struct OpenedWatch {
    options: WatchOptions,
    cancel_token: CancellationToken,
}

/// A [`PositionSource`] that replays a fixed script on each watch.
///
/// Every watch gets its own emitter task. The task stops as soon as the watch
/// is cancelled. After the script runs out it stays subscribed, like a real
/// platform watch would, unless the source was built with
/// [`SimulatedSource::closing_after_script`].
pub struct SimulatedSource {
    status: PlatformStatus,
    script: Vec<ScriptStep>,
    close_after_script: bool,
    watches: Arc<Mutex<Vec<OpenedWatch>>>,
}

impl SimulatedSource {
    pub fn scripted(status: PlatformStatus, script: Vec<ScriptStep>) -> Self {
        Self {
            status,
            script,
            close_after_script: false,
            watches: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The platform ends the stream once the last step has been delivered.
    pub fn closing_after_script(mut self) -> Self {
        self.close_after_script = true;
        self
    }

    /// A fix that converges from a coarse network estimate towards GPS
    /// accuracy around `(latitude, longitude)`.
    pub fn wandering(latitude: f64, longitude: f64) -> Self {
        let mut rng = rand::thread_rng();
        let mut accuracy: f64 = rng.gen_range(150.0..400.0);
        let mut script = Vec::new();

        while accuracy > 8.0 && script.len() < 12 {
            let jitter = accuracy / 111_000.0;
            let reading = PositionReading::new(
                latitude + rng.gen_range(-jitter..jitter),
                longitude + rng.gen_range(-jitter..jitter),
                Some(accuracy),
            );
            let delay = Duration::from_millis(rng.gen_range(400..2_500));
            script.push((delay, PositionEvent::Reading(reading)));
            accuracy *= rng.gen_range(0.35..0.85);
        }

        Self::scripted(PlatformStatus::default(), script)
    }

    /// Watches opened so far, closed or not.
    pub fn watches_opened(&self) -> usize {
        self.lock_watches().len()
    }

    /// Watches that have not been closed yet.
    pub fn active_watches(&self) -> usize {
        self.lock_watches()
            .iter()
            .filter(|watch| !watch.cancel_token.is_cancelled())
            .count()
    }

    /// Options requested by the most recent watch.
    pub fn last_options(&self) -> Option<WatchOptions> {
        self.lock_watches().last().map(|watch| watch.options)
    }

    fn lock_watches(&self) -> std::sync::MutexGuard<'_, Vec<OpenedWatch>> {
        match self.watches.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl PositionSource for SimulatedSource {
    fn status(&self) -> PlatformStatus {
        self.status
    }

    fn watch_position(&self, options: WatchOptions) -> PositionWatch {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel_token = CancellationToken::new();
        self.lock_watches().push(OpenedWatch {
            options,
            cancel_token: cancel_token.clone(),
        });

        let script = self.script.clone();
        let close_after_script = self.close_after_script;
        let token = cancel_token.clone();
        tokio::spawn(async move {
            for (delay, event) in script {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(delay) => {}
                }
                if tx.send(event).is_err() {
                    return;
                }
            }
            if close_after_script {
                return;
            }
            token.cancelled().await;
        });

        PositionWatch::new(rx, cancel_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wandering_script_converges() {
        let source = SimulatedSource::wandering(48.8566, 2.3522);
        let accuracies: Vec<f64> = source
            .script
            .iter()
            .filter_map(|(_, event)| match event {
                PositionEvent::Reading(reading) => reading.accuracy_meters,
                PositionEvent::Error(_) => None,
            })
            .collect();

        assert!(!accuracies.is_empty());
        assert!(accuracies.windows(2).all(|pair| pair[1] < pair[0]));
    }

    #[tokio::test(start_paused = true)]
    async fn replays_script_in_order() {
        let first = PositionReading::new(1.0, 2.0, Some(30.0));
        let second = PositionReading::new(1.0, 2.0, Some(10.0));
        let source = SimulatedSource::scripted(
            PlatformStatus::default(),
            vec![
                (Duration::from_millis(500), PositionEvent::Reading(first)),
                (Duration::from_millis(500), PositionEvent::Reading(second)),
            ],
        );

        let mut watch = source.watch_position(WatchOptions::default());
        assert_eq!(watch.next_event().await, Some(PositionEvent::Reading(first)));
        assert_eq!(watch.next_event().await, Some(PositionEvent::Reading(second)));
        assert_eq!(source.active_watches(), 1);

        drop(watch);
        assert_eq!(source.active_watches(), 0);
        assert_eq!(source.watches_opened(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn closing_source_ends_stream_after_script() {
        let only = PositionReading::new(1.0, 2.0, Some(30.0));
        let source = SimulatedSource::scripted(
            PlatformStatus::default(),
            vec![(Duration::from_millis(500), PositionEvent::Reading(only))],
        )
        .closing_after_script();

        let options = WatchOptions {
            high_accuracy: false,
            maximum_age_ms: 60_000,
        };
        let mut watch = source.watch_position(options);
        assert_eq!(source.last_options(), Some(options));
        assert_eq!(watch.next_event().await, Some(PositionEvent::Reading(only)));
        assert_eq!(watch.next_event().await, None);
    }
}
