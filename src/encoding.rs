//! Canonical block encoding
//!
//! The verifier hashes compact JSON with sorted keys, so the encoding here is
//! `{"data":[...],"nonce":<int>}` with no whitespace. `Block` declares its
//! fields in that order and `serde_json`'s compact writer does the rest.

use crate::{Block, Error, Result};

/// Encode a block into a fresh buffer
pub fn encode_block(block: &Block) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(estimated_len(block));
    encode_into(block, &mut buf)?;
    Ok(buf)
}

/// Encode a block into `buf`, replacing its previous contents
pub fn encode_into(block: &Block, buf: &mut Vec<u8>) -> Result<()> {
    buf.clear();
    serde_json::to_writer(&mut *buf, block).map_err(Error::encoding)
}

fn estimated_len(block: &Block) -> usize {
    // 48 bytes covers a 32-char token, an i64 and the punctuation
    32 + block.data.len() * 48
}
