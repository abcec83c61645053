//! Hashed token identifiers

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::error::BayesError;

/// Width of a token identifier in bytes
pub const TOKEN_BYTES: usize = 5;

/// 40-bit identifier of a normalized token string
///
/// Built from the low five bytes of the SHA-256 digest of the string.
/// Distinct strings may share an identifier; the store only ever sees
/// identifiers.
///
/// Identifiers are not compatible with token databases keyed on the low
/// bytes of SHA-1, such as SpamAssassin's: a store populated by such a
/// system has to be relearned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token([u8; TOKEN_BYTES]);

impl Token {
    /// Hash a normalized token string
    pub fn from_text(text: &str) -> Self {
        let digest = Sha256::digest(text.as_bytes());
        let mut bytes = [0u8; TOKEN_BYTES];
        bytes.copy_from_slice(&digest[digest.len() - TOKEN_BYTES..]);
        Token(bytes)
    }

    pub fn from_bytes(bytes: [u8; TOKEN_BYTES]) -> Self {
        Token(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; TOKEN_BYTES] {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl FromStr for Token {
    type Err = BayesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != TOKEN_BYTES * 2 || !s.is_ascii() {
            return Err(BayesError::Parse(format!("invalid token id: {}", s)));
        }

        let mut bytes = [0u8; TOKEN_BYTES];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .map_err(|_| BayesError::Parse(format!("invalid token id: {}", s)))?;
        }
        Ok(Token(bytes))
    }
}

impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Token {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
