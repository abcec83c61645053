//! Records kept by token stores

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BayesError;

/// Per-token counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCounts {
    /// Spam messages the token was learned from
    pub spam_count: u32,
    /// Ham messages the token was learned from
    pub ham_count: u32,
    /// Last access time, seconds since the epoch
    pub atime: i64,
}

impl TokenCounts {
    pub fn total(&self) -> u64 {
        self.spam_count as u64 + self.ham_count as u64
    }
}

/// Number of learned messages per class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub spam_count: u64,
    pub ham_count: u64,
}

/// Class a message was learned as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeenFlag {
    Spam,
    Ham,
}

impl SeenFlag {
    pub fn from_is_spam(is_spam: bool) -> Self {
        if is_spam {
            SeenFlag::Spam
        } else {
            SeenFlag::Ham
        }
    }

    pub fn is_spam(self) -> bool {
        self == SeenFlag::Spam
    }

    /// Stored form of the flag
    pub fn as_str(self) -> &'static str {
        match self {
            SeenFlag::Spam => "s",
            SeenFlag::Ham => "h",
        }
    }
}

impl fmt::Display for SeenFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeenFlag {
    type Err = BayesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "s" => Ok(SeenFlag::Spam),
            "h" => Ok(SeenFlag::Ham),
            other => Err(BayesError::Parse(format!("invalid seen flag: {:?}", other))),
        }
    }
}

/// Access requested when tying a store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieMode {
    ReadOnly,
    ReadWrite,
}
