//! Section Forge Core - Shared domain types.
//!
//! This crate provides the types shared by every Section Forge component:
//! - `server` - Landing-page rendering, handoff store, Shopify OAuth and publishing
//! - `generator` - Standalone AI page generation service
//! - `cli` - Migrations and maintenance
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. The optional `postgres` feature adds `sqlx` mappings.
//!
//! # Modules
//!
//! - [`types`] - Shop domains, handoff tokens and statuses, colors, prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
