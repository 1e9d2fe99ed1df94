// Domain layer - Datasets, views, filters and dashboard models
pub mod chart;
pub mod dashboard;
pub mod dataset;
pub mod duplicates;
pub mod error;
pub mod filter;
pub mod view;
