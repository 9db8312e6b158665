//! Mini Miner
//!
//! Solves a single proof-of-work puzzle: find a nonce such that the SHA-256
//! digest of the block's canonical JSON encoding has at least `difficulty`
//! leading zero bits.
//!
//! - Canonical block encoding (compact JSON, sorted keys)
//! - SHA-256 hashing and leading-zero-bit counting
//! - Sequential nonce search with an optional attempt limit or deadline
//! - Client for the challenge's problem and solve endpoints

pub mod client;
pub mod config;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod miner;
pub mod types;
pub mod utils;

pub use config::Config;
pub use crypto::Digest;
pub use error::{Error, Result};
pub use miner::{Miner, SearchOutcome, SearchPolicy};
pub use types::*;

/// Application information
pub const APP_NAME: &str = "mini-miner";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
