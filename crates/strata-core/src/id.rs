//! BLAKE3 content identifiers.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// A 32-byte BLAKE3 hash naming a stored object.
///
/// Every persisted object (data blob, tree, snapshot record) is addressed
/// by the hash of its bytes. The all-zero value is reserved as the null
/// identifier and never names a real object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id([u8; 32]);

impl Id {
    /// The distinguished null identifier.
    pub const NULL: Id = Id([0u8; 32]);

    /// Create an identifier from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Hash a byte slice into its content identifier.
    pub fn hash(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// The raw hash bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// True for the reserved all-zero identifier.
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Lowercase hex form, 64 characters.
    pub fn to_hex(&self) -> String {
        const HEX: &[u8] = b"0123456789abcdef";
        let mut out = String::with_capacity(64);
        for &byte in &self.0 {
            out.push(HEX[(byte >> 4) as usize] as char);
            out.push(HEX[(byte & 0xf) as usize] as char);
        }
        out
    }

    /// Short display form for logs: the first 8 hex characters.
    pub fn short(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(8);
        hex
    }

    /// Parse an identifier from its 64-character hex form.
    pub fn from_hex(hex: &str) -> CoreResult<Self> {
        if hex.len() != 64 {
            return Err(CoreError::InvalidHex {
                reason: format!("expected 64 characters, got {}", hex.len()),
            });
        }

        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let high = hex_nibble(hex.as_bytes()[i * 2])?;
            let low = hex_nibble(hex.as_bytes()[i * 2 + 1])?;
            *byte = (high << 4) | low;
        }
        Ok(Self(bytes))
    }
}

fn hex_nibble(c: u8) -> CoreResult<u8> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(CoreError::InvalidHex {
            reason: format!("invalid character {:?}", c as char),
        }),
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(Id::hash(b"hello world"), Id::hash(b"hello world"));
    }

    #[test]
    fn different_data_different_ids() {
        assert_ne!(Id::hash(b"hello"), Id::hash(b"world"));
    }

    #[test]
    fn hex_roundtrip() {
        let id = Id::hash(b"roundtrip");
        let decoded = Id::from_hex(&id.to_hex()).unwrap();
        assert_eq!(id, decoded);
    }

    #[test]
    fn hex_is_lowercase() {
        let hex = Id::from_bytes([0xAB; 32]).to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn from_hex_rejects_bad_input() {
        assert!(Id::from_hex("abc").is_err());
        assert!(Id::from_hex("").is_err());
        assert!(Id::from_hex(&"g".repeat(64)).is_err());
    }

    #[test]
    fn null_id() {
        assert!(Id::NULL.is_null());
        assert!(!Id::hash(b"x").is_null());
    }

    #[test]
    fn short_form_is_prefix() {
        let id = Id::hash(b"short");
        assert_eq!(id.short(), id.to_hex()[..8]);
    }
}
