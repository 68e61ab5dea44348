pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;

/// Leading hex zeros a block hash needs unless configured otherwise.
pub const DEFAULT_DIFFICULTY: u32 = 3;
pub const DEFAULT_MINING_REWARD: f64 = 1.0;
pub const DEFAULT_REWARD_SENDER: &str = "THE BLOCKCHAIN";

/// Nonces handed to rayon per round of the parallel search.
pub const POW_BATCH_SIZE: u64 = 1 << 14;
