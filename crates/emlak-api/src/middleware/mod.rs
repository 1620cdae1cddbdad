//! # HTTP Middleware
//!
//! Request metrics and per-client rate limiting. Ordering (outermost
//! first): `TraceLayer → metrics → rate limit → session auth → handler`.

pub mod metrics;
pub mod rate_limit;
