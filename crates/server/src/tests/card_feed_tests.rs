use super::*;
use rfid::MockCardReader;
use shared::domain::Uid;
use tokio::time::timeout;

fn feed_with(uids: &[&str]) -> CardFeed {
    let reader: Arc<dyn CardReader> =
        Arc::new(MockCardReader::new(uids.iter().map(|uid| Uid::from(*uid))));
    CardFeed::new(Some(reader), Duration::from_millis(10))
}

async fn next_uid(rx: &mut broadcast::Receiver<ServerEvent>) -> Uid {
    match timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("event in time")
        .expect("feed open")
    {
        ServerEvent::CardDetected { uid, .. } => uid,
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn subscribers_receive_the_same_detection() {
    let feed = feed_with(&["A1B2C3D4"]);
    let mut first = feed.subscribe().await;
    let mut second = feed.subscribe().await;

    assert_eq!(feed.subscribers().await, 2);
    assert_eq!(next_uid(&mut first).await, Uid::from("A1B2C3D4"));
    assert_eq!(next_uid(&mut second).await, Uid::from("A1B2C3D4"));
}

#[tokio::test]
async fn poller_runs_until_the_last_subscriber_leaves() {
    let feed = feed_with(&["A1B2C3D4", "E5F6A7B8"]);
    let mut first = feed.subscribe().await;
    let _second = feed.subscribe().await;
    next_uid(&mut first).await;

    feed.unsubscribe().await;
    assert!(feed.poller.lock().await.handle.is_some());
    next_uid(&mut first).await;

    feed.unsubscribe().await;
    assert_eq!(feed.subscribers().await, 0);
    assert!(feed.poller.lock().await.handle.is_none());
}

#[tokio::test]
async fn feed_without_reader_never_polls() {
    let feed = CardFeed::new(None, Duration::from_millis(10));
    let mut rx = feed.subscribe().await;

    assert!(feed.poller.lock().await.handle.is_none());
    assert!(timeout(Duration::from_millis(100), rx.recv()).await.is_err());
    feed.unsubscribe().await;
}
