//! HTTP middleware for the handler service.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction per route)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. CORS (permissive headers, pre-flight short-circuit)

pub mod cors;

pub use cors::cors_middleware;
