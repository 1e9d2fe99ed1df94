// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod flights_seed;
pub mod html;
pub mod scratch_engine;
pub mod sqlite_dataset;
pub mod sqlite_source;
