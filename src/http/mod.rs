//! HTTP server module
//!
//! Hosts the handler as a webhook for bucket notifications:
//! - Axum router with the event, health and debug endpoints
//! - Mapping of handler failures to HTTP statuses
//! - Request tracing

pub mod handlers;
pub mod routes;

pub use routes::create_router;
