pub mod index_files;
pub mod index_table;
pub mod persisted_index;
pub mod row_index;
