//! Infrastructure layer: storage backends, kill coordination, config, seeding.

pub mod config;
pub mod kill_coordinator;
pub mod seed;
pub mod store;
