// Presentation layer - HTTP handlers and HTML pages
pub mod app_state;
pub mod form_fields;
pub mod handlers;
pub mod pages;
pub mod routes;
