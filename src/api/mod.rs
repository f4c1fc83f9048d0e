//! API endpoint modules.

pub mod health;
pub mod http_monitoring;
pub mod openapi;

pub use health::configure_health_routes;
pub use http_monitoring::configure_routes as configure_report_routes;
pub use openapi::{ApiDoc, configure_routes as configure_openapi_routes};
