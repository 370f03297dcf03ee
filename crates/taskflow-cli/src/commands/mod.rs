pub mod achievements;
pub mod config;
pub mod focus;
pub mod stats;
pub mod task;
