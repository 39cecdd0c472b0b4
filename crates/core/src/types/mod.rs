//! Core types for Section Forge.
//!
//! This module provides type-safe wrappers for the domain concepts shared
//! across crates.

pub mod color;
pub mod price;
pub mod shop;
pub mod status;
pub mod token;

pub use color::{ColorError, HexColor, Rgb};
pub use price::{Price, PriceError};
pub use shop::{ShopDomain, ShopDomainError};
pub use status::HandoffStatus;
pub use token::{DataKey, SessionId, TokenError};
