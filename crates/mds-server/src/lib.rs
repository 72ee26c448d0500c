//! HTTP server for the metadata store.
//!
//! Exposes the metadata service as a JSON REST API under `/api/metadata`.
//! Handlers parse bodies into service calls and map the domain error
//! taxonomy onto HTTP statuses; all storage work runs on the blocking pool.

pub mod config;
pub mod error;
pub mod handler;
pub mod response;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::AppState;
pub use response::{ApiError, ErrorResponse, SuccessResponse};
pub use router::build_router;
pub use server::MetadataServer;
