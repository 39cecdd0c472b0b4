//! Business logic services.
//!
//! # Services
//!
//! - `handoff` - Ephemeral storage of generated sections across the OAuth redirect
//! - `publisher` - Upload of a generated section into a shop's live theme

pub mod handoff;
pub mod publisher;

pub use handoff::{HANDOFF_TTL, HandoffService, StoredHandoff, normalize_schema, spawn_expiry_sweeper};
pub use publisher::{PublishedSection, asset_document, asset_key, publish_section};
