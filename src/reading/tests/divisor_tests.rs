use super::*;

const CRLF_SAMPLE: &str = "a,b\r\n1,2\r\n3,4,5\r\n6\r\n";

#[tokio::test]
async fn test_crlf_detected_and_counted() {
    let engine = indexed("crlf.csv", CRLF_SAMPLE).await;
    assert_eq!(engine.line_divisor(), Some(LineDivisor::CrLf));
    assert_eq!(engine.lines().unwrap(), 3);
    assert_eq!(engine.size().unwrap(), CRLF_SAMPLE.len() as u64);
    assert_eq!(engine.max_row_length().unwrap(), 7);
}

#[tokio::test]
async fn test_crlf_paths_agree() {
    let mut engine = indexed("crlf-agree.csv", CRLF_SAMPLE).await;
    let pass = full_pass(&mut engine).await;
    assert_eq!(pass.len(), 3);
    for (i, record) in pass.iter().enumerate() {
        let row = engine.get_line(i as u64 + 1).await.unwrap();
        assert_eq!(&row, record);
        assert!(!row.line.as_deref().unwrap_or_default().ends_with('\r'));
    }
    assert_eq!(pass[1].unnamed, vec![Some("5".to_string())]);
}

#[tokio::test]
async fn test_configured_divisor_skips_detection() {
    let path = memory_file("configured.csv", CRLF_SAMPLE).await;
    let options = EngineOptions { line_divisor: Some(LineDivisor::CrLf), ..Default::default() };
    let mut engine = FileEngine::with_options(path, options).unwrap();
    assert_eq!(engine.line_divisor(), Some(LineDivisor::CrLf));
    engine.open().await.unwrap();
    engine.build_index(BuildOptions::default()).await.unwrap();
    assert_eq!(engine.get_line(3).await.unwrap().value("a"), Some("6"));
}

#[tokio::test]
async fn test_divisor_outside_sniff_window_defaults_to_lf() {
    let path = memory_file("short-sniff.csv", CRLF_SAMPLE).await;
    let options = EngineOptions { sniff_bytes: 2, ..Default::default() };
    let mut engine = FileEngine::with_options(path, options).unwrap();
    engine.open().await.unwrap();
    assert_eq!(engine.line_divisor(), Some(LineDivisor::Lf));

    // Each line keeps its '\r', counted as one byte of text, so offsets still line up and
    // trimming hides the '\r' from both read paths
    engine.build_index(BuildOptions::default()).await.unwrap();
    assert_eq!(engine.size().unwrap(), CRLF_SAMPLE.len() as u64);
    let pass = full_pass(&mut engine).await;
    assert_eq!(engine.get_line(2).await.unwrap(), pass[1]);
    assert_eq!(pass[2].value("a"), Some("6"));
}

#[tokio::test]
async fn test_divisor_detected_once() {
    let mut engine = indexed("detect-once.csv", CRLF_SAMPLE).await;
    engine.rewind().await.unwrap();
    engine.close(CloseOptions::default()).unwrap();
    engine.open().await.unwrap();
    assert_eq!(engine.line_divisor(), Some(LineDivisor::CrLf));
}

/// Mixed divisors are unsupported: the divisor detected from the first line is assumed for
/// every row, so offsets after an LF-only row are off by one and random access disagrees with
/// the sequential pass from that point on.
#[tokio::test]
async fn test_mixed_divisors_misalign_offsets() {
    let content = "a,b\r\n1,2\n3,4\r\n";
    let mut engine = indexed("mixed.csv", content).await;
    assert_eq!(engine.line_divisor(), Some(LineDivisor::CrLf));
    assert_eq!(engine.lines().unwrap(), 2);
    assert_eq!(engine.size().unwrap(), content.len() as u64 + 1);

    let pass = full_pass(&mut engine).await;
    assert_eq!(pass[1].value("a"), Some("3"));
    assert_eq!(pass[1].value("b"), Some("4"));

    let misread = engine.get_line(2).await.unwrap();
    assert_ne!(misread, pass[1]);
    assert_eq!(misread.line.as_deref(), Some(",4"));
    assert_eq!(misread.value("a"), None);
    assert_eq!(misread.value("b"), Some("4"));
}
