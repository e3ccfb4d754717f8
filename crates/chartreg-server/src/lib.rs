//! HTTP server for the chart registry.
//!
//! Everything here is boundary: routing, parameter extraction, pagination,
//! tenant multiplexing, and the error-to-response mapping. The storage and
//! orchestration semantics live below in `chartreg-store` and
//! `chartreg-compose`; handlers pass an explicitly constructed [`AppState`]
//! through axum instead of process globals.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod server;
pub mod state;

pub use config::{ManagerConfig, ManagerParameters, ServerConfig};
pub use error::ApiError;
pub use router::build_router;
pub use server::RegistryServer;
pub use state::AppState;
