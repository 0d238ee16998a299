//! Delimited Text Row Indexer - Command Line Interface
//!
//! This binary builds byte-offset indexes for large CSV-like files and reads rows from them,
//! either one row by number or the whole file in order.
//!
//! # Commands
//!
//! - **`index`** - Scans a file and saves its row index
//! - **`row`** - Prints one row by its 1-based number
//! - **`scan`** - Streams rows in file order
//! - **`index_info`** - Displays information about a saved index
//!
//! # Index Structure
//!
//! The index is stored in a `.index` directory adjacent to the source file:
//! ```text
//! events.csv
//! events.csv.index/
//! ├── meta.rkyv          (Header, row count, divisor, delimiter, source validation data)
//! └── offsets.bin        (12 bytes per data row: u64 offset, u32 length)
//! ```
//!
//! # Usage Examples
//!
//! ```bash
//! rowseek index events.csv
//! rowseek index events.csv --max 1000 --delimiter ';'
//! rowseek row events.csv 421337
//! rowseek scan events.csv --limit 20
//! rowseek index_info events.csv
//! ```
//!
//! Set `RUST_LOG=info` (or `debug`) to see engine logging on stderr.
//!
//! # Exit Codes
//!
//! - `0` - Success
//! - `1` - General error (invalid arguments, I/O failure, corrupt index)
//! - `2` - Row number out of range (row command only)
//! - `3` - Saved index is out of date (row and index_info commands)

use std::env;
use std::process;
use tracing_subscriber::EnvFilter;
use rowseek::{BuildOptions, EngineError, EngineOptions, FileEngine};

const EXIT_ERROR: i32 = 1;
const EXIT_OUT_OF_RANGE: i32 = 2;
const EXIT_STALE_INDEX: i32 = 3;

/// Byte step between progress lines while indexing without `--max`.
const PROGRESS_BYTES_STEP: u64 = 64 * 1024 * 1024;
/// Row step between progress lines while indexing with `--max`.
const PROGRESS_ROWS_STEP: u64 = 100_000;

/// Optional flags shared by the commands.
#[derive(Debug, Default)]
struct Flags {
    max: Option<u64>,
    limit: Option<u64>,
    delimiter: Option<char>,
}

impl Flags {
    fn engine_options(&self) -> EngineOptions {
        let mut options = EngineOptions::default();
        if let Some(delimiter) = self.delimiter {
            options.delimiter = delimiter;
        }
        options
    }
}

/// Entry point for the row indexer CLI.
///
/// Parses `<command> <file> [args...] [flags...]` by hand and dispatches to one handler per
/// command. Invalid arguments print the error and the help text and exit with code 1.
#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() == 2 && (args[1] == "--help" || args[1] == "-h") {
        print_help();
        return;
    }

    if args.len() < 3 {
        usage_error("Not enough arguments");
    }

    let command = args[1].as_str();
    let file_path = args[2].as_str();

    match command {
        "index" => {
            let flags = parse_flags(&args[3..], &["--max", "--delimiter"]);
            handle_index(file_path, &flags).await;
        }
        "row" => {
            let Some(row) = args.get(3) else {
                usage_error("'row' command requires file path and row number");
            };
            let row: u64 = match row.parse() {
                Ok(row) => row,
                Err(_) => usage_error(&format!("Invalid row number '{}'", row)),
            };
            let flags = parse_flags(&args[4..], &["--delimiter"]);
            handle_row(file_path, row, &flags).await;
        }
        "scan" => {
            let flags = parse_flags(&args[3..], &["--limit", "--delimiter"]);
            handle_scan(file_path, &flags).await;
        }
        "index_info" => {
            if args.len() != 3 {
                usage_error("'index_info' command requires exactly one file path");
            }
            handle_index_info(file_path).await;
        }
        _ => usage_error(&format!("Unknown command '{}'", command)),
    }
}

fn usage_error(message: &str) -> ! {
    eprintln!("Error: {}\n", message);
    print_help();
    process::exit(EXIT_ERROR);
}

/// Parses `--flag value` pairs, accepting only the flags in `allowed`.
fn parse_flags(args: &[String], allowed: &[&str]) -> Flags {
    let mut flags = Flags::default();
    let mut iter = args.iter();

    while let Some(flag) = iter.next() {
        if !allowed.contains(&flag.as_str()) {
            usage_error(&format!("Unexpected argument '{}'", flag));
        }
        let Some(value) = iter.next() else {
            usage_error(&format!("'{}' requires a value", flag));
        };
        match flag.as_str() {
            "--max" => flags.max = Some(parse_count(flag, value)),
            "--limit" => flags.limit = Some(parse_count(flag, value)),
            "--delimiter" => flags.delimiter = Some(parse_delimiter(value)),
            _ => usage_error(&format!("Unexpected argument '{}'", flag)),
        }
    }
    flags
}

fn parse_count(flag: &str, value: &str) -> u64 {
    value.parse().unwrap_or_else(|_| usage_error(&format!("'{}' expects a number, got '{}'", flag, value)))
}

/// Accepts a single character, or `\t` / `tab` for a tab.
fn parse_delimiter(value: &str) -> char {
    if value == "\\t" || value == "tab" {
        return '\t';
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c,
        _ => usage_error(&format!("Delimiter must be a single character, got '{}'", value)),
    }
}

/// Handles the `index` command: scans the file once and saves the index next to it.
///
/// Progress goes to stdout every 64 MiB scanned (or every 100k rows with `--max`). An existing
/// index is overwritten.
///
/// # Output
///
/// ```text
/// Indexing file: events.csv
///   64.00 MB scanned
///   128.00 MB scanned
///
/// ✓ Indexing completed successfully!
///   Rows:                 2500000
///   Columns:              12
///   offsets.bin:          30000000 bytes (28.61 MB)
/// ```
async fn handle_index(file_path: &str, flags: &Flags) {
    println!("Indexing file: {}", file_path);

    let step = if flags.max.is_some() { PROGRESS_ROWS_STEP } else { PROGRESS_BYTES_STEP };
    let by_rows = flags.max.is_some();
    let mut next_report = step;
    let mut report = |current: u64| {
        if current >= next_report {
            if by_rows {
                println!("  {} rows scanned", current);
            } else {
                println!("  {:.2} MB scanned", current as f64 / (1024.0 * 1024.0));
            }
            next_report = (current / step + 1) * step;
        }
    };

    let build = BuildOptions { max: flags.max, ..Default::default() }.progress(&mut report);
    match rowseek::build_and_save_index(file_path, flags.engine_options(), build, None).await {
        Ok(info) => {
            println!("\n✓ Indexing completed successfully!");
            println!("  Rows:                 {}", info.lines);
            println!("  Columns:              {}", info.num_columns);
            if !info.complete {
                println!("  Stopped at --max; rows after {} are not indexed", info.lines);
            }
            println!("  offsets.bin:          {} bytes ({:.2} MB)",
                     info.offsets_size,
                     info.offsets_size as f64 / (1024.0 * 1024.0));
        }
        Err(e) => {
            eprintln!("\n✗ Error during indexing: {}", e);
            process::exit(EXIT_ERROR);
        }
    }
}

/// Handles the `row` command: prints one row by number.
///
/// Uses the saved index when one exists; refuses a stale one (exit code 3) rather than silently
/// rescanning. Without a saved index the file is scanned in memory first.
async fn handle_row(file_path: &str, row: u64, flags: &Flags) {
    if rowseek::index_exists(file_path, None).await {
        match rowseek::validate_index(file_path, None).await {
            Ok(true) => {}
            Ok(false) => {
                eprintln!("Warning: Index is out of date with '{}'", file_path);
                eprintln!("Consider rebuilding the index with 'index' command.");
                process::exit(EXIT_STALE_INDEX);
            }
            Err(e) => {
                eprintln!("✗ Could not validate index: {}", e);
                process::exit(EXIT_ERROR);
            }
        }
    }

    match rowseek::read_row(file_path, row, flags.engine_options(), None).await {
        Ok(record) => {
            println!("{}", record);
            if record.has_missing_cells {
                println!("  (row has fewer cells than the header)");
            }
            if record.has_excess_cells {
                println!("  (row has more cells than the header)");
            }
        }
        Err(EngineError::Range { row, lines }) => {
            let capped = match rowseek::get_index_info(file_path, None).await {
                Ok(info) => !info.complete,
                Err(_) => false,
            };
            if capped {
                eprintln!("✗ Row {} is out of range: the saved index covers only the first {} rows", row, lines);
                eprintln!("Rebuild the index without --max to reach later rows.");
            } else {
                eprintln!("✗ Row {} is out of range: the file has {} rows", row, lines);
            }
            process::exit(EXIT_OUT_OF_RANGE);
        }
        Err(e) => {
            eprintln!("✗ Error reading row: {}", e);
            process::exit(EXIT_ERROR);
        }
    }
}

/// Handles the `scan` command: prints rows in file order, up to `--limit`.
async fn handle_scan(file_path: &str, flags: &Flags) {
    let mut engine = match FileEngine::with_options(file_path, flags.engine_options()) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("✗ {}", e);
            process::exit(EXIT_ERROR);
        }
    };
    if let Err(e) = engine.open().await {
        eprintln!("✗ Error opening file: {}", e);
        process::exit(EXIT_ERROR);
    }

    let limit = flags.limit.unwrap_or(u64::MAX);
    let mut rows = match engine.iterator() {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("✗ {}", e);
            process::exit(EXIT_ERROR);
        }
    };
    while rows.rows_read() < limit {
        match rows.next_row().await {
            Ok(Some(record)) => println!("{}", record),
            Ok(None) => break,
            Err(e) => {
                eprintln!("✗ Error during scan: {}", e);
                process::exit(EXIT_ERROR);
            }
        }
    }
}

/// Handles the `index_info` command to display information about a saved index.
///
/// # Output Format
///
/// ```text
/// ================================================================================
/// Index Information for: events.csv
/// ================================================================================
///
/// INDEX METADATA
/// ──────────────
/// Version:              1
/// Line Divisor:         \n
/// Delimiter:            ','
///
/// SOURCE FILE VALIDATION
/// ──────────────────────
/// File Size:            52428800 bytes (50.00 MB)
/// Last Modified:        1699564800 (Unix timestamp)
/// ETag:                 "d41d8cd98f00b204e9800998ecf8427e"
///
/// ROWS
/// ────
/// Rows:                 2500000
/// Indexed Bytes:        52428800
/// Longest Row:          311 bytes
/// Complete:             no (built with --max; later rows are not indexed)
///
/// COLUMNS
/// ───────
/// Total Columns:        3
///   - id
///   - name
///   - city
/// ...
/// ```
///
/// Exits with code 3 after printing if the source file changed since the index was built.
async fn handle_index_info(file_path: &str) {
    if !rowseek::index_exists(file_path, None).await {
        eprintln!("Error: No index found for '{}'", file_path);
        eprintln!("Please run 'index' command first to create the index.");
        process::exit(EXIT_ERROR);
    }

    let info = match rowseek::get_index_info(file_path, None).await {
        Ok(info) => info,
        Err(e) => {
            eprintln!("\n✗ Error reading index information: {}", e);
            process::exit(EXIT_ERROR);
        }
    };

    println!("================================================================================");
    println!("Index Information for: {}", file_path);
    println!("================================================================================");
    println!();

    println!("INDEX METADATA");
    println!("──────────────");
    println!("Version:              {}", info.version);
    println!("Line Divisor:         {}", info.line_divisor);
    println!("Delimiter:            {:?}", info.delimiter);
    println!();

    println!("SOURCE FILE VALIDATION");
    println!("──────────────────────");
    println!("File Size:            {} bytes ({:.2} MB)",
             info.source_size,
             info.source_size as f64 / (1024.0 * 1024.0));
    println!("Last Modified:        {} (Unix timestamp)", info.source_last_modified);
    if !info.source_etag.is_empty() {
        println!("ETag:                 \"{}\"", info.source_etag);
    }
    println!();

    println!("ROWS");
    println!("────");
    println!("Rows:                 {}", info.lines);
    println!("Indexed Bytes:        {}", info.size);
    println!("Longest Row:          {} bytes", info.max_row_length);
    if !info.complete {
        println!("Complete:             no (built with --max; later rows are not indexed)");
    }
    println!();

    println!("COLUMNS");
    println!("───────");
    println!("Total Columns:        {}", info.num_columns);
    for column in &info.columns {
        println!("  - {}", column);
    }
    println!();

    println!("INDEX FILE SIZES");
    println!("────────────────");
    println!("meta.rkyv:            {} bytes ({:.2} KB)", info.meta_size, info.meta_size as f64 / 1024.0);
    println!("offsets.bin:          {} bytes ({:.2} KB)", info.offsets_size, info.offsets_size as f64 / 1024.0);
    println!("────────────────────────────────────────");
    println!("Total Index Size:     {} bytes ({:.2} MB)",
             info.total_size,
             info.total_size as f64 / (1024.0 * 1024.0));
    println!();
    println!("================================================================================");

    match rowseek::validate_index(file_path, None).await {
        Ok(true) => {}
        Ok(false) => {
            eprintln!("Warning: Index is out of date with '{}'", file_path);
            process::exit(EXIT_STALE_INDEX);
        }
        Err(e) => {
            eprintln!("Warning: Could not validate index: {}", e);
            process::exit(EXIT_ERROR);
        }
    }
}

fn print_help() {
    let program = env::args().next().unwrap_or_else(|| "rowseek".to_string());
    println!("Delimited Text Row Indexer");
    println!();
    println!("USAGE:");
    println!("  {} index <file> [--max N] [--delimiter C]", program);
    println!("  {} row <file> <n> [--delimiter C]", program);
    println!("  {} scan <file> [--limit N] [--delimiter C]", program);
    println!("  {} index_info <file>", program);
    println!("  {} --help", program);
    println!();
    println!("COMMANDS:");
    println!("  index              Scan a file and save its row index");
    println!("  row                Print one row by its 1-based number");
    println!("  scan               Print rows in file order");
    println!("  index_info         Display detailed information about an index");
    println!();
    println!("OPTIONS:");
    println!("  --max N            Index only the first N data rows");
    println!("  --limit N          Stop scanning after N rows");
    println!("  --delimiter C      Cell delimiter (default ','; use '\\t' for tab)");
    println!("  --help, -h         Show this help message");
    println!();
    println!("EXAMPLES:");
    println!("  # Create an index");
    println!("  {} index data.csv", program);
    println!();
    println!("  # Print row 1000");
    println!("  {} row data.csv 1000", program);
    println!();
    println!("  # Print the first 10 rows");
    println!("  {} scan data.csv --limit 10", program);
    println!();
    println!("NOTE:");
    println!("  - The index command creates a .index directory next to the file");
    println!("  - The first line is always the header and is never printed as a row");
    println!("  - Quoted cells are not supported; every delimiter splits");
    println!("  - RUST_LOG=info shows engine logging on stderr");
}
