// Crate-level tests for the index helpers in lib.rs

mod api_tests;
