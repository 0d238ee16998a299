use super::*;

fn header(line: &str) -> Header {
    Header::from_line(line, DEFAULT_DELIMITER)
}

#[test]
fn test_excess_cells_go_to_unnamed() {
    let row = decode_row("3,4,5", 2, &header("a,b"), ',');
    assert!(row.has_excess_cells);
    assert!(!row.has_missing_cells);
    assert_eq!(row.value("a"), Some("3"));
    assert_eq!(row.value("b"), Some("4"));
    assert_eq!(row.unnamed, vec![Some("5".to_string())]);
    assert_eq!(row.cells.len(), 3);
}

#[test]
fn test_excess_cells_keep_order_and_nulls() {
    let row = decode_row("1,2,x,,y", 1, &header("a,b"), ',');
    assert_eq!(
        row.unnamed,
        vec![Some("x".to_string()), None, Some("y".to_string())]
    );
}

#[test]
fn test_missing_cells_are_null() {
    let row = decode_row("6", 3, &header("a,b"), ',');
    assert!(row.has_missing_cells);
    assert!(!row.has_excess_cells);
    assert_eq!(row.value("a"), Some("6"));
    assert_eq!(row.field("b"), Some(&FieldValue::Single(None)));
    assert!(row.unnamed.is_empty());
}

#[test]
fn test_empty_line_is_one_null_cell() {
    let row = decode_row("", 1, &header("a,b"), ',');
    assert_eq!(row.cells, vec![None]);
    assert!(row.has_missing_cells);
    assert_eq!(row.value("a"), None);
    assert_eq!(row.value("b"), None);
}

#[test]
fn test_empty_header_sends_everything_unnamed() {
    let row = decode_cells(vec![Some("1".to_string())], 1, &Header::default());
    assert!(row.fields.is_empty());
    assert!(row.has_excess_cells);
    assert_eq!(row.unnamed, vec![Some("1".to_string())]);
}
