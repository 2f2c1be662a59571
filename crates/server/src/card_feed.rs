use std::{sync::Arc, time::Duration};

use rfid::{CardPoller, CardReader, PollHandle, PollerConfig};
use shared::protocol::ServerEvent;
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

const EVENT_BUFFER: usize = 16;

/// One poller per reader, shared by every open socket. It runs while at least
/// one socket is subscribed and stops with the last one.
pub(crate) struct CardFeed {
    reader: Option<Arc<dyn CardReader>>,
    poll_interval: Duration,
    events: broadcast::Sender<ServerEvent>,
    poller: Mutex<FeedPoller>,
}

#[derive(Default)]
struct FeedPoller {
    subscribers: usize,
    handle: Option<PollHandle>,
}

impl CardFeed {
    pub(crate) fn new(reader: Option<Arc<dyn CardReader>>, poll_interval: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            reader,
            poll_interval,
            events,
            poller: Mutex::new(FeedPoller::default()),
        }
    }

    pub(crate) async fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        let rx = self.events.subscribe();
        let mut poller = self.poller.lock().await;
        poller.subscribers += 1;

        if poller.handle.is_none() {
            if let Some(reader) = self.reader.clone() {
                let events = self.events.clone();
                let config = PollerConfig::new(self.poll_interval);
                poller.handle = Some(CardPoller::new(reader, config).spawn(move |detection| {
                    let _ = events.send(ServerEvent::CardDetected {
                        uid: detection.uid,
                        timestamp: detection.timestamp,
                    });
                }));
                debug!(interval = ?self.poll_interval, "card poller started");
            }
        }
        rx
    }

    pub(crate) async fn unsubscribe(&self) {
        let mut poller = self.poller.lock().await;
        poller.subscribers = poller.subscribers.saturating_sub(1);
        if poller.subscribers == 0 {
            if let Some(handle) = poller.handle.take() {
                handle.stop().await;
                debug!("card poller stopped; no sockets left");
            }
        }
    }

    pub(crate) async fn subscribers(&self) -> usize {
        self.poller.lock().await.subscribers
    }
}

#[cfg(test)]
#[path = "tests/card_feed_tests.rs"]
mod tests;
