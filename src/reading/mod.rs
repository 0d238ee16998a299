pub mod file_engine;
pub(crate) mod index_builder;
pub(crate) mod line_stream;
pub mod options;
pub(crate) mod random_access;
pub(crate) mod read_handle;
pub mod row_iterator;
pub mod row_record;

#[cfg(test)]
#[path = "tests/mod.rs"]
mod tests;
