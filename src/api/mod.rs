//! HTTP API.
//!
//! Exposes accounts, health metrics, care tasks and doctor suggestions as
//! JSON endpoints. Routes are nested under `/api/`; the router is
//! composable (`api_router()` returns a `Router` that can be mounted on any
//! axum server instance).

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_api_server, ApiServer, ServerError, ServerInfo};
pub use types::ApiContext;
