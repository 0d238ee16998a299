// Test module organization for reading
// Compiled only under #[cfg(test)] from reading/mod.rs

use bytes::Bytes;
use crate::errors::EngineError;
use crate::reading::file_engine::{EngineState, FileEngine};
use crate::reading::options::{BuildOptions, CloseOptions, EngineOptions};
use crate::reading::row_record::{FieldValue, RowRecord};
use crate::utils::file_interaction_local_and_cloud::register_memory_file;
use crate::utils::line_divisor::LineDivisor;

mod divisor_tests;
mod failure_tests;

/// The worked example used across these tests: header plus one complete, one long and one
/// short row.
pub(crate) const SAMPLE: &str = "a,b\n1,2\n3,4,5\n6\n";

/// Registers `content` as `memory://reading/{name}` and returns the path.
///
/// The memory store is shared by the whole test binary, so every test uses its own name.
async fn memory_file(name: &str, content: &str) -> String {
    let path = format!("memory://reading/{}", name);
    register_memory_file(&path, Bytes::from(content.to_string()))
        .await
        .unwrap();
    path
}

/// Like [`memory_file`] for content that is not valid UTF-8.
async fn memory_bytes(name: &str, content: &'static [u8]) -> String {
    let path = format!("memory://reading/{}", name);
    register_memory_file(&path, Bytes::from_static(content))
        .await
        .unwrap();
    path
}

async fn opened(name: &str, content: &str) -> FileEngine {
    let mut engine = FileEngine::new(memory_file(name, content).await);
    engine.open().await.unwrap();
    engine
}

async fn indexed(name: &str, content: &str) -> FileEngine {
    let mut engine = opened(name, content).await;
    engine.build_index(BuildOptions::default()).await.unwrap();
    engine
}

async fn full_pass(engine: &mut FileEngine) -> Vec<RowRecord> {
    engine.iterator().unwrap().collect_rows().await.unwrap()
}
