//! Random handoff identifiers.
//!
//! Both identifiers are generated from `rand`'s thread-local CSPRNG (seeded
//! from the operating system) and rendered as lower-case hex.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a token.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Wrong number of characters.
    #[error("expected {expected} hex characters, got {actual}")]
    Length {
        /// Required length.
        expected: usize,
        /// Length received.
        actual: usize,
    },
    /// Contains a non-hex character.
    #[error("token must be lower-case hex")]
    NotHex,
}

fn parse_hex(s: &str, expected: usize) -> Result<String, TokenError> {
    if s.len() != expected {
        return Err(TokenError::Length {
            expected,
            actual: s.len(),
        });
    }
    if !s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)) {
        return Err(TokenError::NotHex);
    }
    Ok(s.to_owned())
}

/// Primary lookup key of a handoff record: 256 bits, 64 hex characters.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataKey(String);

impl DataKey {
    /// Number of random bytes.
    pub const BYTES: usize = 32;
    /// Length of the hex form.
    pub const HEX_LEN: usize = Self::BYTES * 2;

    /// Generate a fresh random key.
    #[must_use]
    pub fn generate() -> Self {
        let bytes: [u8; Self::BYTES] = rand::random();
        Self(hex::encode(bytes))
    }

    /// Parse a key received from a client.
    ///
    /// # Errors
    ///
    /// Returns an error unless the input is exactly 64 lower-case hex characters.
    pub fn parse(s: &str) -> Result<Self, TokenError> {
        parse_hex(s, Self::HEX_LEN).map(Self)
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keys grant access to stored content; keep them out of logs.
impl fmt::Debug for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = self.0.get(..8).unwrap_or_default();
        write!(f, "DataKey({prefix}…)")
    }
}

impl fmt::Display for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DataKey {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DataKey> for String {
    fn from(key: DataKey) -> Self {
        key.0
    }
}

/// Random session identifier attached to a handoff record: 128 bits, 32 hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Number of random bytes.
    pub const BYTES: usize = 16;
    /// Length of the hex form.
    pub const HEX_LEN: usize = Self::BYTES * 2;

    /// Generate a fresh random session id.
    #[must_use]
    pub fn generate() -> Self {
        let bytes: [u8; Self::BYTES] = rand::random();
        Self(hex::encode(bytes))
    }

    /// Parse a session id.
    ///
    /// # Errors
    ///
    /// Returns an error unless the input is exactly 32 lower-case hex characters.
    pub fn parse(s: &str) -> Result<Self, TokenError> {
        parse_hex(s, Self::HEX_LEN).map(Self)
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SessionId {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}
