use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::*;
use crate::{MockCardReader, ReaderError, ReaderKind};

fn uid(raw: &str) -> Uid {
    Uid::from(raw)
}

fn spawn_collecting(
    reader: Arc<dyn CardReader>,
    interval: Duration,
) -> (PollHandle, mpsc::UnboundedReceiver<CardDetection>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = CardPoller::new(reader, PollerConfig::new(interval)).spawn(move |detection| {
        let _ = tx.send(detection);
    });
    (handle, rx)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<CardDetection>) -> Vec<Uid> {
    let mut uids = Vec::new();
    while let Ok(detection) = rx.try_recv() {
        uids.push(detection.uid);
    }
    uids
}

struct CountingReader {
    inner: MockCardReader,
    reads: Arc<AtomicUsize>,
}

#[async_trait]
impl CardReader for CountingReader {
    fn kind(&self) -> ReaderKind {
        ReaderKind::Mock
    }

    async fn read_once(&self) -> Result<Option<Uid>, ReaderError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read_once().await
    }
}

struct FlakyReader {
    calls: AtomicUsize,
}

#[async_trait]
impl CardReader for FlakyReader {
    fn kind(&self) -> ReaderKind {
        ReaderKind::Hardware
    }

    async fn read_once(&self) -> Result<Option<Uid>, ReaderError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(ReaderError::ReadFailed("transient".into()))
        } else {
            Ok(Some(uid("CAFEBABE")))
        }
    }
}

#[test]
fn debouncer_suppresses_same_uid_inside_window() {
    let start = Instant::now();
    let mut debouncer = Debouncer::new(DEBOUNCE_WINDOW);

    assert!(debouncer.observe(&uid("AA"), start));
    assert!(!debouncer.observe(&uid("AA"), start + Duration::from_secs(1)));
    assert!(!debouncer.observe(&uid("AA"), start + Duration::from_millis(4999)));
    assert!(debouncer.observe(&uid("AA"), start + DEBOUNCE_WINDOW));
}

#[test]
fn debouncer_emits_a_different_uid_immediately() {
    let start = Instant::now();
    let mut debouncer = Debouncer::new(DEBOUNCE_WINDOW);

    assert!(debouncer.observe(&uid("AA"), start));
    assert!(debouncer.observe(&uid("BB"), start + Duration::from_millis(10)));
    assert!(debouncer.observe(&uid("AA"), start + Duration::from_millis(20)));
    assert_eq!(debouncer.last_seen(), Some(&uid("AA")));
}

#[tokio::test(start_paused = true)]
async fn held_card_is_reported_once_per_window() {
    let reader = Arc::new(MockCardReader::new([uid("A1B2C3D4")]));
    let (handle, mut rx) = spawn_collecting(reader, Duration::from_secs(1));

    time::sleep(Duration::from_millis(4500)).await;
    assert_eq!(drain(&mut rx), vec![uid("A1B2C3D4")]);

    time::sleep(Duration::from_secs(1)).await;
    assert_eq!(drain(&mut rx), vec![uid("A1B2C3D4")]);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn alternating_cards_are_each_reported() {
    let reader = Arc::new(MockCardReader::new([uid("AA"), uid("BB")]));
    let (handle, mut rx) = spawn_collecting(reader, Duration::from_secs(1));

    time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(
        drain(&mut rx),
        vec![uid("AA"), uid("BB"), uid("AA"), uid("BB")]
    );

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn empty_reads_do_not_reset_the_window() {
    let reader = Arc::new(MockCardReader::scripted(vec![Some(uid("AA")), None]));
    let (handle, mut rx) = spawn_collecting(reader, Duration::from_secs(1));

    time::sleep(Duration::from_millis(4500)).await;
    assert_eq!(drain(&mut rx), vec![uid("AA")]);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn read_errors_are_skipped() {
    let reader = Arc::new(FlakyReader {
        calls: AtomicUsize::new(0),
    });
    let (handle, mut rx) = spawn_collecting(reader, Duration::from_secs(1));

    time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(drain(&mut rx), vec![uid("CAFEBABE")]);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn stopped_poller_reads_no_more() {
    let reads = Arc::new(AtomicUsize::new(0));
    let reader = Arc::new(CountingReader {
        inner: MockCardReader::new([uid("AA")]),
        reads: Arc::clone(&reads),
    });
    let (handle, _rx) = spawn_collecting(reader, Duration::from_secs(1));

    time::sleep(Duration::from_millis(2500)).await;
    handle.stop().await;
    let after_stop = reads.load(Ordering::SeqCst);
    assert_eq!(after_stop, 3);

    time::sleep(Duration::from_secs(10)).await;
    assert_eq!(reads.load(Ordering::SeqCst), after_stop);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_stops_polling() {
    let reads = Arc::new(AtomicUsize::new(0));
    let reader = Arc::new(CountingReader {
        inner: MockCardReader::new([uid("AA")]),
        reads: Arc::clone(&reads),
    });
    let (handle, _rx) = spawn_collecting(reader, Duration::from_secs(1));

    time::sleep(Duration::from_millis(1500)).await;
    drop(handle);
    time::sleep(Duration::from_millis(10)).await;
    let after_drop = reads.load(Ordering::SeqCst);

    time::sleep(Duration::from_secs(10)).await;
    assert_eq!(reads.load(Ordering::SeqCst), after_drop);
}
