use rayon::prelude::*;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::{pow, Block, ChainError};

/// Searches nonces in parallel until the block digest carries `difficulty`
/// leading zero hex characters. Returns a copy of the block with the winning
/// nonce and its hash set; the input block is left untouched. Unlike the
/// sequential loop, which nonce wins is non-deterministic.
pub fn mine_block_parallel(block: &Block, difficulty: u32) -> Result<Block, ChainError> {
    // Canonicalize everything but the nonce once, outside the hot loop.
    let payload = serde_json::to_string(&block.data)?;
    let preimage_prefix = format!(
        "{}{}{}{}",
        block.index, block.preceding_hash, block.timestamp, payload
    );

    let found = (0u64..u64::MAX)
        .into_par_iter()
        .find_any(|nonce| {
            let mut hasher = Sha256::new();
            hasher.update(&preimage_prefix);
            hasher.update(nonce.to_string());
            pow::meets_difficulty(&hex::encode(hasher.finalize()), difficulty)
        })
        .expect("nonce space exhausted (practically impossible)");

    let mut mined = block.clone();
    mined.nonce = found;
    mined.hash = mined.compute_hash()?;
    info!(
        "mined block {} with nonce {} and hash {}",
        mined.index, mined.nonce, mined.hash
    );
    Ok(mined)
}
