// Test module organization for row_shred
// This module is only compiled during testing via #[cfg(test)] in row_shred.rs

// Import everything from parent module (row_shred)
use crate::row_shred::*;
use crate::reading::row_record::FieldValue;
use crate::utils::header::Header;

mod column_mismatch;
