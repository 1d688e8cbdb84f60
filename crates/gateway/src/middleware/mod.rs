//! HTTP middleware for the gateway.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//!
//! Authentication is an extractor ([`RequireApiKey`]) on the `/api/v1`
//! handlers rather than a layer, so the health endpoints stay open.

pub mod auth;
pub mod request_id;

pub use auth::{ApiKeyRejection, RequireApiKey, bearer_token};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
