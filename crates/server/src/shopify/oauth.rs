//! Signed OAuth `state` tokens and callback HMAC verification.
//!
//! The state round-trips through Shopify between the install redirect and
//! the callback. It carries the optional handoff key, so it is signed with
//! the app secret:
//!
//! ```text
//! base64url(JSON{nonce, data_key, timestamp}) "." base64url(HMAC-SHA256(secret, payload))
//! ```

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use section_forge_core::DataKey;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a state token, in seconds.
pub const STATE_MAX_AGE_SECS: i64 = 60 * 60;

/// Why a state token was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("state is not of the form payload.signature")]
    Malformed,
    #[error("state is not valid base64url")]
    Encoding,
    #[error("state signature does not match")]
    BadSignature,
    #[error("state payload is not valid JSON")]
    Payload,
    #[error("state is {age}s old (max {STATE_MAX_AGE_SECS}s)")]
    Expired { age: i64 },
    #[error("state carries an invalid data key")]
    DataKey,
    #[error("signing key rejected")]
    Key,
}

/// Decoded state payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthState {
    pub nonce: String,
    pub data_key: Option<String>,
    /// Unix seconds at creation.
    pub timestamp: i64,
}

impl OAuthState {
    /// Fresh state with a random nonce.
    #[must_use]
    pub fn new(data_key: Option<&DataKey>, now: i64) -> Self {
        Self {
            nonce: hex::encode(rand::random::<[u8; 16]>()),
            data_key: data_key.map(ToString::to_string),
            timestamp: now,
        }
    }

    /// The handoff key, if one was carried.
    ///
    /// # Errors
    ///
    /// Returns `StateError::DataKey` if the carried key is not a valid key.
    pub fn data_key(&self) -> Result<Option<DataKey>, StateError> {
        self.data_key
            .as_deref()
            .map(|k| DataKey::parse(k).map_err(|_| StateError::DataKey))
            .transpose()
    }
}

fn mac(secret: &SecretString) -> Result<HmacSha256, StateError> {
    HmacSha256::new_from_slice(secret.expose_secret().as_bytes()).map_err(|_| StateError::Key)
}

/// Serialize and sign a state payload.
///
/// # Errors
///
/// Returns `StateError::Payload` if the payload cannot be serialized or
/// `StateError::Key` if the secret is rejected as an HMAC key.
pub fn encode_state(state: &OAuthState, secret: &SecretString) -> Result<String, StateError> {
    let json = serde_json::to_vec(state).map_err(|_| StateError::Payload)?;
    let payload = URL_SAFE_NO_PAD.encode(json);

    let mut mac = mac(secret)?;
    mac.update(payload.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{payload}.{signature}"))
}

/// Verify and decode a state token.
///
/// # Errors
///
/// Returns a `StateError` if the token is malformed, the signature does not
/// match, or the token is older than [`STATE_MAX_AGE_SECS`].
pub fn decode_state(token: &str, secret: &SecretString, now: i64) -> Result<OAuthState, StateError> {
    let (payload, signature) = token.split_once('.').ok_or(StateError::Malformed)?;
    let signature = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| StateError::Encoding)?;

    let mut mac = mac(secret)?;
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| StateError::BadSignature)?;

    let json = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| StateError::Encoding)?;
    let state: OAuthState = serde_json::from_slice(&json).map_err(|_| StateError::Payload)?;

    let age = now - state.timestamp;
    if !(0..=STATE_MAX_AGE_SECS).contains(&age) {
        return Err(StateError::Expired { age });
    }

    Ok(state)
}

/// Verify Shopify's `hmac` callback parameter.
///
/// The message is every other query parameter (except `signature`), sorted
/// by key and joined as `key=value` with `&`. Comparison is constant-time.
#[must_use]
pub fn verify_callback_hmac(params: &[(String, String)], secret: &SecretString) -> bool {
    let Some(provided) = params
        .iter()
        .find(|(k, _)| k == "hmac")
        .map(|(_, v)| v.as_str())
    else {
        return false;
    };
    let Ok(provided) = hex::decode(provided) else {
        return false;
    };

    let mut pairs: Vec<&(String, String)> = params
        .iter()
        .filter(|(k, _)| k != "hmac" && k != "signature")
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    let message = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let Ok(mut mac) = mac(secret) else {
        return false;
    };
    mac.update(message.as_bytes());
    mac.verify_slice(&provided).is_ok()
}
