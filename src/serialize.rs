//! Transport-safe forms of encoded image bytes

use crate::{Error, Result};
use base64::Engine as _;

/// PNG bytes in a form that can cross the message channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedImage(String);

impl SerializedImage {
    /// Comma-joined decimal byte values, the form the host's file writer reads
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let joined = bytes
            .iter()
            .map(|b| b.to_string())
            .collect::<Vec<_>>()
            .join(",");
        Self(joined)
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Decode back to bytes. Empty tokens and values above 255 are errors.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.0.is_empty() {
            return Err(Error::Serialization("empty image payload".into()));
        }
        self.0
            .split(',')
            .enumerate()
            .map(|(i, token)| {
                token.trim().parse::<u8>().map_err(|e| {
                    Error::Serialization(format!("byte {} ({:?}): {}", i, token, e))
                })
            })
            .collect()
    }
}

impl std::fmt::Display for SerializedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Standard base64, used by the share flow
pub fn to_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

pub fn from_base64(data: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|e| Error::Serialization(format!("invalid base64 image: {}", e)))
}
