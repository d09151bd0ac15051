//! Invoice HTTP API.
//!
//! Exposes the processing pipeline as a JSON endpoint. The router is
//! composable: `invoice_api_router()` returns a `Router` that can be mounted
//! on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use router::invoice_api_router;
pub use server::{start_server_on, ServerError, ServerHandle};
pub use types::ApiContext;
