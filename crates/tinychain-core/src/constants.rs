pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;

/// Leading zero hex characters required of a mined hash when a chain is
/// built without an explicit difficulty.
pub const DEFAULT_DIFFICULTY: u32 = 4;

pub const GENESIS_TIMESTAMP: &str = "0";
pub const GENESIS_PAYLOAD: &str = "genesis";
pub const GENESIS_PRECEDING_HASH: &str = "0";
