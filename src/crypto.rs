//! Cryptographic utilities for mining
//!
//! SHA-256 hashing of encoded blocks and leading-zero-bit counting of the
//! resulting digests.

use sha2::{Digest as _, Sha256};
use std::fmt;

/// Size of a SHA-256 digest in bytes
pub const DIGEST_SIZE: usize = 32;

/// Number of bits in a digest, and so the highest reachable difficulty
pub const DIGEST_BITS: u32 = (DIGEST_SIZE * 8) as u32;

/// A 32-byte SHA-256 digest
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_SIZE]);

impl Digest {
    /// Wrap raw digest bytes
    pub const fn from_bytes(bytes: [u8; DIGEST_SIZE]) -> Self {
        Self(bytes)
    }

    /// Borrow the raw bytes
    pub fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.0
    }

    /// Lowercase hex representation
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Count of leading zero bits, see [`leading_zero_bits`]
    pub fn leading_zero_bits(&self) -> u32 {
        leading_zero_bits(self)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl From<[u8; DIGEST_SIZE]> for Digest {
    fn from(bytes: [u8; DIGEST_SIZE]) -> Self {
        Self(bytes)
    }
}

/// Reusable SHA-256 hasher for the search loop
#[derive(Clone, Default)]
pub struct Sha256Hasher {
    hasher: Sha256,
}

impl Sha256Hasher {
    /// Create a new SHA-256 hasher
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash data and reset for the next call
    pub fn hash(&mut self, data: &[u8]) -> Digest {
        self.hasher.update(data);
        Digest(self.hasher.finalize_reset().into())
    }
}

/// One-shot SHA-256
pub fn sha256(data: &[u8]) -> Digest {
    Digest(Sha256::digest(data).into())
}

/// Count consecutive zero bits from the most significant bit of the first byte
///
/// Stops at the first nonzero byte; an all-zero digest yields 256.
pub fn leading_zero_bits(digest: &Digest) -> u32 {
    let mut zeros = 0;
    for &byte in digest.as_bytes() {
        if byte == 0 {
            zeros += 8;
            continue;
        }
        zeros += byte.leading_zeros();
        break;
    }
    zeros
}

/// Whether a digest has at least `difficulty` leading zero bits
pub fn meets_difficulty(digest: &Digest, difficulty: u32) -> bool {
    leading_zero_bits(digest) >= difficulty
}
