//! 12-byte document ids.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A 12-byte document-store id, rendered as 24 hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Create an id from raw bytes.
    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }

    /// Parse an id from its 24-character hex form.
    pub fn parse(input: &str) -> Result<Self, Error> {
        if input.len() != 24 {
            return Err(Error::invalid_object_id(format!(
                "expected 24 hex characters, got {}",
                input.len()
            )));
        }
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(input, &mut bytes)
            .map_err(|_| Error::invalid_object_id(format!("not valid hex: {input:?}")))?;
        Ok(Self(bytes))
    }

    /// Render the id as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<[u8; 12]> for ObjectId {
    fn from(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }
}
