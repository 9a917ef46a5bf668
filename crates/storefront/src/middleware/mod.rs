//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions, in-memory store)
//! 4. Rate limiting (governor; strict on the geo endpoints)

pub mod rate_limit;
pub mod session;

pub use rate_limit::{api_rate_limiter, geo_rate_limiter};
pub use session::create_session_layer;
