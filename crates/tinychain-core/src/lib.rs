use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::info;

pub mod constants;
pub mod mine;

pub use constants::DEFAULT_DIFFICULTY;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("chain has no blocks")]
    EmptyChain,
    #[error("block index {found} does not follow tail, expected {expected}")]
    NonSequentialIndex { expected: u64, found: u64 },
    #[error("mining stopped after {attempts} nonce attempts")]
    MiningStopped { attempts: u64 },
    #[error("nonce budget of {budget} attempts exhausted")]
    NonceBudgetExhausted { budget: u64 },
    #[error("payload serialization failed: {0}")]
    Payload(#[from] serde_json::Error),
}

/// A single ledger entry: position, opaque payload, link to its predecessor
/// and a SHA-256 digest over all of it. Fields are public so callers can
/// inspect (or tamper with) a block; `hash` is only meaningful right after
/// [`Block::compute_hash`] has been stored back, which every mutating path in
/// this crate does before the block is observable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: String,
    pub data: Value,
    pub preceding_hash: String,
    pub nonce: u64,
    pub hash: String,
}

impl Block {
    /// Builds a block over any serializable payload and seals the initial
    /// digest. The preceding hash given here is informational; the chain
    /// overwrites it with the tail hash at append time.
    pub fn new<D: Serialize>(
        index: u64,
        timestamp: impl Into<String>,
        data: &D,
        preceding_hash: impl Into<String>,
    ) -> Result<Self, ChainError> {
        let mut block = Self {
            index,
            timestamp: timestamp.into(),
            data: serde_json::to_value(data)?,
            preceding_hash: preceding_hash.into(),
            nonce: 0,
            hash: String::new(),
        };
        block.hash = block.compute_hash()?;
        Ok(block)
    }

    /// Hex digest of SHA-256 over the decimal index, preceding hash,
    /// timestamp, canonical payload JSON and decimal nonce, concatenated in
    /// that order with no separators.
    pub fn compute_hash(&self) -> Result<String, ChainError> {
        let payload = serde_json::to_string(&self.data)?;
        let mut hasher = Sha256::new();
        hasher.update(self.index.to_string());
        hasher.update(&self.preceding_hash);
        hasher.update(&self.timestamp);
        hasher.update(payload);
        hasher.update(self.nonce.to_string());
        Ok(hex::encode(hasher.finalize()))
    }

    /// Increments the nonce and recomputes the digest until it carries
    /// `difficulty` leading `'0'` hex characters, returning the number of
    /// attempts. Difficulty 0 is satisfied without touching the nonce. The
    /// search is unbounded; use [`Block::mine_guarded`] when it must be
    /// stoppable.
    pub fn mine(&mut self, difficulty: u32) -> Result<u64, ChainError> {
        self.mine_guarded(difficulty, &pow::MineGuard::unbounded())
    }

    /// [`Block::mine`] with a cooperative guard checked between nonce
    /// increments.
    pub fn mine_guarded(
        &mut self,
        difficulty: u32,
        guard: &pow::MineGuard,
    ) -> Result<u64, ChainError> {
        let mut attempts = 0u64;
        while !pow::meets_difficulty(&self.hash, difficulty) {
            guard.check(attempts)?;
            self.nonce += 1;
            attempts += 1;
            self.hash = self.compute_hash()?;
        }
        info!(
            "mined block {} with nonce {} and hash {}",
            self.index, self.nonce, self.hash
        );
        Ok(attempts)
    }
}

pub mod pow {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use crate::ChainError;

    /// Number of leading `'0'` characters in a hex digest.
    pub fn count_leading_zero_chars(hash: &str) -> u32 {
        hash.bytes().take_while(|b| *b == b'0').count() as u32
    }

    pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
        count_leading_zero_chars(hash) >= difficulty
    }

    /// Cooperative controls for a mining loop: a shared stop flag and an
    /// optional attempt budget, both checked between nonce increments.
    #[derive(Clone, Debug, Default)]
    pub struct MineGuard {
        stop: Arc<AtomicBool>,
        max_attempts: Option<u64>,
    }

    impl MineGuard {
        /// A guard that never interrupts the search.
        pub fn unbounded() -> Self {
            Self::default()
        }

        pub fn with_max_attempts(max_attempts: u64) -> Self {
            Self {
                stop: Arc::new(AtomicBool::new(false)),
                max_attempts: Some(max_attempts),
            }
        }

        /// Shared handle another thread can use to stop the search.
        pub fn stop_flag(&self) -> Arc<AtomicBool> {
            Arc::clone(&self.stop)
        }

        pub fn stop(&self) {
            self.stop.store(true, Ordering::Relaxed);
        }

        pub(crate) fn check(&self, attempts: u64) -> Result<(), ChainError> {
            if self.stop.load(Ordering::Relaxed) {
                return Err(ChainError::MiningStopped { attempts });
            }
            if let Some(budget) = self.max_attempts {
                if attempts >= budget {
                    return Err(ChainError::NonceBudgetExhausted { budget });
                }
            }
            Ok(())
        }
    }
}

pub mod chain {
    use serde::{Deserialize, Serialize};
    use tracing::{info, warn};

    use crate::constants::{
        DEFAULT_DIFFICULTY, GENESIS_PAYLOAD, GENESIS_PRECEDING_HASH, GENESIS_TIMESTAMP,
    };
    use crate::pow::MineGuard;
    use crate::{mine, Block, ChainError};

    /// Append-only block sequence rooted at a fixed genesis block. Each
    /// instance owns its difficulty, set at construction and never adjusted.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct Chain {
        pub blocks: Vec<Block>,
        pub difficulty: u32,
    }

    impl Chain {
        pub fn new() -> Self {
            Self::with_difficulty(DEFAULT_DIFFICULTY)
        }

        pub fn with_difficulty(difficulty: u32) -> Self {
            Self {
                blocks: vec![genesis_block()],
                difficulty,
            }
        }

        /// The tail of the chain. `EmptyChain` can only surface if the
        /// genesis invariant was broken through the public fields.
        pub fn latest_block(&self) -> Result<&Block, ChainError> {
            self.blocks.last().ok_or(ChainError::EmptyChain)
        }

        /// Links `block` to the current tail, mines it at the chain
        /// difficulty and appends it. Once mined the block is accepted
        /// unconditionally.
        pub fn append_block(&mut self, block: Block) -> Result<(), ChainError> {
            self.append_block_guarded(block, &MineGuard::unbounded())
        }

        /// [`Chain::append_block`] with a cooperative mining guard.
        pub fn append_block_guarded(
            &mut self,
            mut block: Block,
            guard: &MineGuard,
        ) -> Result<(), ChainError> {
            self.link_to_tail(&mut block)?;
            info!(
                "mining block {} at difficulty {}",
                block.index, self.difficulty
            );
            block.mine_guarded(self.difficulty, guard)?;
            self.blocks.push(block);
            Ok(())
        }

        /// [`Chain::append_block`] with the nonce search spread across rayon
        /// workers.
        pub fn append_block_parallel(&mut self, mut block: Block) -> Result<(), ChainError> {
            self.link_to_tail(&mut block)?;
            info!(
                "mining block {} at difficulty {} (parallel)",
                block.index, self.difficulty
            );
            let mined = mine::mine_block_parallel(&block, self.difficulty)?;
            self.blocks.push(mined);
            Ok(())
        }

        /// Captures the tail hash into the block's preceding hash; whatever
        /// the caller put there is discarded. Rejects out-of-sequence
        /// indices.
        fn link_to_tail(&self, block: &mut Block) -> Result<(), ChainError> {
            let tail = self.latest_block()?;
            if block.index != tail.index + 1 {
                return Err(ChainError::NonSequentialIndex {
                    expected: tail.index + 1,
                    found: block.index,
                });
            }
            block.preceding_hash = tail.hash.clone();
            block.hash = block.compute_hash()?;
            Ok(())
        }

        /// Walks the chain from index 1, checking each block's stored digest
        /// against recomputation and its link against the predecessor's
        /// stored digest. Genesis is taken as given and never re-verified.
        pub fn is_valid(&self) -> bool {
            for window in self.blocks.windows(2) {
                let (previous, current) = (&window[0], &window[1]);
                let recomputed = match current.compute_hash() {
                    Ok(digest) => digest,
                    Err(err) => {
                        warn!("block {}: payload no longer serializes: {err}", current.index);
                        return false;
                    }
                };
                if current.hash != recomputed {
                    warn!(
                        "block {}: stored hash does not match its contents",
                        current.index
                    );
                    return false;
                }
                if current.preceding_hash != previous.hash {
                    warn!(
                        "block {}: broken link to block {}",
                        current.index, previous.index
                    );
                    return false;
                }
            }
            true
        }
    }

    impl Default for Chain {
        fn default() -> Self {
            Self::new()
        }
    }

    /// The fixed, unmined first block. Hashed once here; the difficulty rule
    /// is never applied to it.
    pub fn genesis_block() -> Block {
        Block::new(0, GENESIS_TIMESTAMP, &GENESIS_PAYLOAD, GENESIS_PRECEDING_HASH)
            .expect("genesis payload serializes")
    }
}
