pub mod core;
pub mod stats;
pub mod students;
