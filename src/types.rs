//! Core types for the mini miner
//!
//! The puzzle payload as delivered by the challenge endpoint, the nonce that is
//! searched over, and the solution handed back for submission.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Proof-of-work nonce
///
/// Signed on purpose: the verifier decodes it as a plain JSON integer and the
/// same block payload carries negative integers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nonce(pub i64);

impl Nonce {
    /// Create a new nonce
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the nonce value
    pub const fn value(self) -> i64 {
        self.0
    }

    /// The next nonce, or `None` once the signed 64-bit range is used up
    pub fn checked_next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Nonce {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Nonce> for i64 {
    fn from(nonce: Nonce) -> Self {
        nonce.0
    }
}

/// One value inside a data record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Field {
    /// Opaque token string
    Token(String),
    /// Signed integer
    Integer(i64),
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Field::Token(value.to_string())
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Field::Token(value)
    }
}

impl From<i64> for Field {
    fn from(value: i64) -> Self {
        Field::Integer(value)
    }
}

/// A data record, serialized as a JSON array in its original order
pub type Record = Vec<Field>;

/// The block being mined
///
/// Field declaration order is the serialization order, which must stay
/// `data` then `nonce` for the verifier to reproduce the digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Puzzle payload, never touched by the search
    pub data: Vec<Record>,
    /// Search variable; `null` on the wire until solved
    #[serde(default, deserialize_with = "nonce_or_zero")]
    pub nonce: Nonce,
}

impl Block {
    /// Create a block with a zero nonce
    pub fn new(data: Vec<Record>) -> Self {
        Self {
            data,
            nonce: Nonce::default(),
        }
    }

    /// Builder-style nonce setter
    pub fn with_nonce(mut self, nonce: Nonce) -> Self {
        self.nonce = nonce;
        self
    }
}

fn nonce_or_zero<'de, D>(deserializer: D) -> std::result::Result<Nonce, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Nonce>::deserialize(deserializer)?.unwrap_or_default())
}

/// A puzzle as returned by the problem endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    /// Minimum number of leading zero bits the digest must have
    pub difficulty: u32,
    /// Block to solve
    pub block: Block,
}

impl Problem {
    /// Create a new problem
    pub fn new(difficulty: u32, block: Block) -> Self {
        Self { difficulty, block }
    }
}

/// The winning nonce, in the shape the solve endpoint expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub nonce: Nonce,
}

impl Solution {
    /// Create a new solution
    pub fn new(nonce: Nonce) -> Self {
        Self { nonce }
    }
}
