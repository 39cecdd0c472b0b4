//! Section Forge generator.
//!
//! A standalone service that sends a product photo and a short description
//! to Claude and returns the complete HTML landing page it writes.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod claude;
pub mod config;
pub mod error;
pub mod prompt;
pub mod routes;
pub mod state;

pub use config::GeneratorConfig;
pub use routes::app;
pub use state::AppState;
