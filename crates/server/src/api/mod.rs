//! HTTP API handlers.

pub mod artifacts;
pub mod health;
pub mod runs;

pub use artifacts::artifact_routes;
pub use health::health_routes;
pub use runs::pipeline_routes;
