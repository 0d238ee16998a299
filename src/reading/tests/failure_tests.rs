use super::*;

async fn opened_bytes(name: &str, content: &'static [u8]) -> FileEngine {
    let mut engine = FileEngine::new(memory_bytes(name, content).await);
    engine.open().await.unwrap();
    engine
}

#[tokio::test]
async fn test_failed_scan_leaves_engine_open_and_unindexed() {
    let mut engine = opened_bytes("bad-scan.csv", b"a,b\n1,2\n\xff,x\n5,6\n").await;

    let err = engine.build_index(BuildOptions::default()).await.unwrap_err();
    assert!(err.is_io(), "{}", err);
    let message = err.to_string();
    assert!(message.starts_with("FileEngine.build_index(memory://reading/bad-scan.csv)"), "{}", message);
    assert!(message.contains("line 3 is not valid UTF-8"), "{}", message);

    assert_eq!(engine.state(), EngineState::Open);
    assert!(!engine.is_indexed());
    assert!(engine.lines().unwrap_err().is_state());

    // The stream was reset, so a new pass starts at the first data row
    let mut rows = engine.iterator().unwrap();
    let first = rows.next_row().await.unwrap().unwrap();
    assert_eq!(first.index, 1);
    assert_eq!(first.value("a"), Some("1"));
}

#[tokio::test]
async fn test_undecodable_row_keeps_later_numbering() {
    let mut engine = opened_bytes("bad-row.csv", b"a,b\n1,2\n\xff,x\n5,6\n").await;
    let mut rows = engine.iterator().unwrap();

    assert_eq!(rows.next_row().await.unwrap().unwrap().index, 1);

    let err = rows.next_row().await.unwrap_err();
    assert!(err.is_io(), "{}", err);
    assert!(err.to_string().starts_with("FileEngine.iterator(memory://reading/bad-row.csv)"), "{}", err);
    assert_eq!(rows.rows_read(), 2);

    let third = rows.next_row().await.unwrap().unwrap();
    assert_eq!(third.index, 3);
    assert_eq!(third.line.as_deref(), Some("5,6"));
    assert_eq!(third.value("a"), Some("5"));
    assert!(rows.next_row().await.unwrap().is_none());
}

#[tokio::test]
async fn test_undecodable_header_is_never_replaced_by_a_data_row() {
    let mut engine = opened_bytes("bad-header.csv", b"a,\xff\n1,2\n3,4\n").await;
    let mut rows = engine.iterator().unwrap();

    let err = rows.next_row().await.unwrap_err();
    assert!(err.is_io(), "{}", err);
    assert!(err.to_string().contains("line 1 is not valid UTF-8"), "{}", err);

    // Later rows keep their own numbers and are not decoded against a made-up header
    let err = rows.next_row().await.unwrap_err();
    assert!(err.is_state(), "{}", err);
    assert!(err.to_string().contains("row 1 "), "{}", err);
    assert_eq!(rows.rows_read(), 1);

    let err = rows.next_row().await.unwrap_err();
    assert!(err.to_string().contains("row 2 "), "{}", err);
    assert!(rows.next_row().await.unwrap().is_none());
}

#[tokio::test]
async fn test_failed_get_line_keeps_index() {
    let path = memory_file("bad-get-line.csv", "a,b\n1,2\n3,4\n").await;
    let mut engine = FileEngine::new(path.as_str());
    engine.open().await.unwrap();
    engine.build_index(BuildOptions::default()).await.unwrap();

    // Same length, so the spans still fit, but row 2 no longer decodes
    memory_bytes("bad-get-line.csv", b"a,b\n1,2\n\xff,4\n").await;

    let err = engine.get_line(2).await.unwrap_err();
    assert!(err.is_io(), "{}", err);
    assert!(err.to_string().starts_with("FileEngine.get_line(memory://reading/bad-get-line.csv)"), "{}", err);
    assert!(err.to_string().contains("row 2 is not valid UTF-8"), "{}", err);

    assert_eq!(engine.state(), EngineState::Indexed);
    assert_eq!(engine.lines().unwrap(), 2);
    assert_eq!(engine.get_line(1).await.unwrap().value("b"), Some("2"));
}
