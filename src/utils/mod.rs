pub mod file_interaction_local_and_cloud;
pub mod header;
pub mod line_divisor;
pub mod progress;
