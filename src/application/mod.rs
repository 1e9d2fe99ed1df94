// Application layer - Registries and use-case services
pub mod dashboard_registry;
pub mod dashboard_service;
pub mod relational_source;
pub mod sandbox_service;
pub mod view_registry;
pub mod view_service;
pub mod visualization;
