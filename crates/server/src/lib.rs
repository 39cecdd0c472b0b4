//! Section Forge handler service.
//!
//! Renders landing sections from product data, holds them across the
//! Shopify OAuth redirect, completes the install and publishes sections
//! into a shop's live theme.
//!
//! # Modules
//!
//! - [`landing`] - HTML and Liquid rendering (pure)
//! - [`db`] - Lazily-connected `PostgreSQL` gateway and repositories
//! - [`services`] - Handoff store and publisher
//! - [`shopify`] - OAuth and Admin REST client, signed state
//! - [`routes`] - Axum handlers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod landing;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;

pub use config::ServerConfig;
pub use error::AppError;
pub use routes::app;
pub use state::AppState;
