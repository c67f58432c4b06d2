//! Payload codec helpers.
//!
//! Payloads are MessagePack by default. JSON is available for clients that
//! talk to the supervisor from scripts or the `nats` command line.

use serde::{Deserialize, Serialize};

use crate::error::NetError;

/// The serialisation used for every payload on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WireFormat {
    #[default]
    MessagePack,
    Json,
}

/// Encode a value to MessagePack bytes.
///
/// # Errors
///
/// Returns [`NetError::Encode`] if serialisation fails.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, NetError> {
    rmp_serde::to_vec_named(value).map_err(NetError::Encode)
}

/// Decode a value from MessagePack bytes.
///
/// # Errors
///
/// Returns [`NetError::Decode`] if deserialisation fails.
pub fn decode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, NetError> {
    rmp_serde::from_slice(bytes).map_err(NetError::Decode)
}

impl WireFormat {
    /// Encode a value in this format.
    ///
    /// # Errors
    ///
    /// Returns a [`NetError`] if serialisation fails.
    pub fn encode<T: Serialize>(self, value: &T) -> Result<Vec<u8>, NetError> {
        match self {
            WireFormat::MessagePack => encode(value),
            WireFormat::Json => serde_json::to_vec(value).map_err(NetError::Json),
        }
    }

    /// Decode a value in this format.
    ///
    /// # Errors
    ///
    /// Returns a [`NetError`] if deserialisation fails.
    pub fn decode<'a, T: Deserialize<'a>>(self, bytes: &'a [u8]) -> Result<T, NetError> {
        match self {
            WireFormat::MessagePack => decode(bytes),
            WireFormat::Json => serde_json::from_slice(bytes).map_err(NetError::Json),
        }
    }
}
