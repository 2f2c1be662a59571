use std::{sync::Arc, time::Duration};

use shared::domain::{CardDetection, Uid};
use tokio::{
    sync::oneshot,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, warn};

use crate::CardReader;

/// How long an emitted UID stays suppressed before the same card counts as a new tap.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub interval: Duration,
    pub debounce: Duration,
}

impl PollerConfig {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            debounce: DEBOUNCE_WINDOW,
        }
    }
}

/// Suppresses repeats of the last emitted UID until the window elapses.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last: Option<(Uid, Instant)>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// Returns true when `uid` should be emitted as a new detection.
    pub fn observe(&mut self, uid: &Uid, now: Instant) -> bool {
        if let Some((_, emitted_at)) = &self.last {
            if now.saturating_duration_since(*emitted_at) >= self.window {
                self.last = None;
            }
        }
        if matches!(&self.last, Some((last_uid, _)) if last_uid == uid) {
            return false;
        }
        self.last = Some((uid.clone(), now));
        true
    }

    pub fn last_seen(&self) -> Option<&Uid> {
        self.last.as_ref().map(|(uid, _)| uid)
    }
}

pub struct CardPoller {
    reader: Arc<dyn CardReader>,
    config: PollerConfig,
}

impl CardPoller {
    pub fn new(reader: Arc<dyn CardReader>, config: PollerConfig) -> Self {
        Self { reader, config }
    }

    /// Starts the repeating read task. Reads never overlap: each tick awaits
    /// the previous read before the next one is scheduled.
    pub fn spawn<F>(self, on_detect: F) -> PollHandle
    where
        F: Fn(CardDetection) + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let Self { reader, config } = self;

        let task = tokio::spawn(async move {
            let mut ticker = time::interval(config.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut debouncer = Debouncer::new(config.debounce);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {}
                }

                match reader.read_once().await {
                    Ok(Some(uid)) => {
                        if debouncer.observe(&uid, Instant::now()) {
                            debug!(%uid, "card detected");
                            on_detect(CardDetection::now(uid));
                        }
                    }
                    Ok(None) => {}
                    Err(error) => warn!(%error, "card read failed; polling continues"),
                }
            }
            debug!("card poller stopped");
        });

        PollHandle {
            stop: Some(stop_tx),
            task,
        }
    }
}

/// Owns a running poll task. Dropping the handle stops the task.
pub struct PollHandle {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Signals the task and waits for an in-flight read to finish.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        let _ = (&mut self.task).await;
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

#[cfg(test)]
#[path = "tests/poller_tests.rs"]
mod tests;
