use super::*;

#[tokio::test]
async fn rotation_wraps_around() {
    let reader = MockCardReader::new([Uid::from("AA"), Uid::from("BB")]);
    let mut seen = Vec::new();
    for _ in 0..5 {
        seen.push(reader.read_once().await.expect("read"));
    }
    let expected: Vec<Option<Uid>> = ["AA", "BB", "AA", "BB", "AA"]
        .into_iter()
        .map(|raw| Some(Uid::from(raw)))
        .collect();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn empty_rotation_never_sees_a_card() {
    let reader = MockCardReader::scripted(Vec::new());
    assert_eq!(reader.read_once().await.expect("read"), None);
    assert_eq!(reader.kind(), ReaderKind::Mock);
}

#[tokio::test]
async fn demo_rotation_starts_with_first_demo_card() {
    let reader = MockCardReader::demo();
    assert_eq!(
        reader.read_once().await.expect("read"),
        Some(Uid::from(DEMO_ROTATION[0]))
    );
}
