//! Continuation token codec for AU metadata pagination.
//!
//! A token pins a resume position to the extraction generation it was minted
//! under. The wire form is base64url (no padding) of a fixed-width binary
//! record, so it survives a URL query parameter without escaping:
//!
//! ```text
//! +---------+----------------------+----------------------+
//! | version | generation (i64, BE) | last item id (i64 BE)|
//! +---------+----------------------+----------------------+
//!   1 byte          8 bytes               8 bytes
//! ```

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use std::fmt;
use std::str::FromStr;

/// Current token format version.
pub const TOKEN_VERSION: u8 = 1;

const RAW_LEN: usize = 17;

/// Encoded length of a 17-byte record in unpadded base64.
pub const ENCODED_LEN: usize = 23;

/// A resumable position in an AU's item scan.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ContinuationToken {
    /// Extraction generation the token was minted under.
    pub generation: i64,
    /// Id of the last item returned on the previous page.
    pub last_item_seq: i64,
}

impl ContinuationToken {
    /// Create a token for a position.
    pub fn new(generation: i64, last_item_seq: i64) -> Self {
        Self {
            generation,
            last_item_seq,
        }
    }

    /// Encode to the opaque wire form.
    pub fn encode(&self) -> String {
        let mut raw = [0u8; RAW_LEN];
        raw[0] = TOKEN_VERSION;
        raw[1..9].copy_from_slice(&self.generation.to_be_bytes());
        raw[9..17].copy_from_slice(&self.last_item_seq.to_be_bytes());
        URL_SAFE_NO_PAD.encode(raw)
    }

    /// Decode from the opaque wire form.
    pub fn decode(s: &str) -> crate::Result<Self> {
        // Tokens have a fixed encoded length.
        if s.len() != ENCODED_LEN {
            return Err(crate::Error::InvalidContinuationToken(format!(
                "expected {ENCODED_LEN} characters, got {}",
                s.len()
            )));
        }

        let raw = URL_SAFE_NO_PAD
            .decode(s)
            .map_err(|e| crate::Error::InvalidContinuationToken(format!("invalid encoding: {e}")))?;

        let raw: [u8; RAW_LEN] = raw.try_into().map_err(|v: Vec<u8>| {
            crate::Error::InvalidContinuationToken(format!(
                "expected {RAW_LEN} bytes, got {}",
                v.len()
            ))
        })?;

        if raw[0] != TOKEN_VERSION {
            return Err(crate::Error::InvalidContinuationToken(format!(
                "unsupported token version: {} (expected {})",
                raw[0], TOKEN_VERSION
            )));
        }

        let mut generation = [0u8; 8];
        generation.copy_from_slice(&raw[1..9]);
        let mut last_item_seq = [0u8; 8];
        last_item_seq.copy_from_slice(&raw[9..17]);

        Ok(Self {
            generation: i64::from_be_bytes(generation),
            last_item_seq: i64::from_be_bytes(last_item_seq),
        })
    }
}

impl fmt::Display for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContinuationToken")
            .field("generation", &self.generation)
            .field("last_item_seq", &self.last_item_seq)
            .finish()
    }
}

impl FromStr for ContinuationToken {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::decode(s)
    }
}
