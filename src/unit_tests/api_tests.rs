use bytes::Bytes;
use crate::utils::file_interaction_local_and_cloud::register_memory_file;
use crate::{
    build_and_save_index, get_index_info, index_exists, read_row, validate_index, BuildOptions,
    EngineError, EngineOptions, LineDivisor,
};

const CONTENT: &str = "id,name,city\n1,ada,london\n2,grace,\n3,alan,wilmslow,uk\n";

async fn memory_file(name: &str, content: &str) -> String {
    let path = format!("memory://api/{}", name);
    register_memory_file(&path, Bytes::from(content.to_string()))
        .await
        .unwrap();
    path
}

#[tokio::test]
async fn test_build_and_save_reports_info() {
    let path = memory_file("build.csv", CONTENT).await;
    assert!(!index_exists(&path, None).await);

    let info = build_and_save_index(&path, EngineOptions::default(), BuildOptions::default(), None)
        .await
        .unwrap();
    assert!(index_exists(&path, None).await);

    assert_eq!(info.version, 1);
    assert_eq!(info.lines, 3);
    assert_eq!(info.num_columns, 3);
    assert_eq!(info.columns, vec!["id", "name", "city"]);
    assert_eq!(info.size, CONTENT.len() as u64);
    assert_eq!(info.source_size, CONTENT.len() as u64);
    assert_eq!(info.line_divisor, LineDivisor::Lf);
    assert_eq!(info.delimiter, ',');
    assert_eq!(info.offsets_size, 3 * 12);
    assert_eq!(info.total_size, info.meta_size + info.offsets_size);
    assert!(info.complete);

    let again = get_index_info(&path, None).await.unwrap();
    assert_eq!(again.lines, info.lines);
    assert_eq!(again.source_etag, info.source_etag);
}

#[tokio::test]
async fn test_validate_index_tracks_source_changes() {
    let path = memory_file("validate.csv", CONTENT).await;
    assert!(!validate_index(&path, None).await.unwrap());

    build_and_save_index(&path, EngineOptions::default(), BuildOptions::default(), None)
        .await
        .unwrap();
    assert!(validate_index(&path, None).await.unwrap());

    memory_file("validate.csv", "id\n1\n").await;
    assert!(!validate_index(&path, None).await.unwrap());
}

#[tokio::test]
async fn test_get_index_info_without_index() {
    let path = memory_file("no-info.csv", CONTENT).await;
    let err = get_index_info(&path, None).await.unwrap_err();
    assert!(matches!(err, EngineError::IndexFile(_)), "{}", err);
}

#[tokio::test]
async fn test_read_row_with_and_without_saved_index() {
    let path = memory_file("read-row.csv", CONTENT).await;

    let scanned = read_row(&path, 3, EngineOptions::default(), None).await.unwrap();
    assert!(scanned.has_excess_cells);
    assert_eq!(scanned.unnamed, vec![Some("uk".to_string())]);

    build_and_save_index(&path, EngineOptions::default(), BuildOptions::with_max(2), Some("head_"))
        .await
        .unwrap();
    let loaded = read_row(&path, 2, EngineOptions::default(), Some("head_")).await.unwrap();
    assert_eq!(loaded.value("name"), Some("grace"));
    assert_eq!(loaded.value("city"), None);

    // The saved index only covers two rows and says so
    let err = read_row(&path, 3, EngineOptions::default(), Some("head_")).await.unwrap_err();
    assert!(err.is_range());
    let info = get_index_info(&path, Some("head_")).await.unwrap();
    assert_eq!(info.lines, 2);
    assert!(!info.complete);
}

#[tokio::test]
async fn test_read_row_missing_file() {
    let err = read_row("memory://api/missing.csv", 1, EngineOptions::default(), None)
        .await
        .unwrap_err();
    assert!(err.is_io());
}

#[tokio::test]
async fn test_build_and_save_rejects_bad_options() {
    let path = memory_file("bad-options.csv", CONTENT).await;
    let options = EngineOptions { delimiter: '\n', ..Default::default() };
    let err = build_and_save_index(&path, options, BuildOptions::default(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument(_)));
}
