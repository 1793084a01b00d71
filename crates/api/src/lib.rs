//! HTTP API layer for pingoo.
//!
//! - **Endpoints**: JSON-over-POST actions grouped by resource
//! - **Extractors**: Authenticated and anonymous callers
//! - **Middleware**: Bearer token resolution and shared application state
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
