use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DIFFICULTY, DEFAULT_MINING_REWARD, DEFAULT_REWARD_SENDER, HASH_HEX_SIZE,
};
use crate::error::{LedgerError, Result};

/// Per-ledger mining parameters.
///
/// Every field has a default, so a JSON document only needs to name the ones
/// it changes, e.g. `{"difficulty": 4}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LedgerConfig {
    /// Number of leading `'0'` hex characters a candidate hash needs.
    pub difficulty: u32,
    /// Value of the reward transaction appended on every `mine`.
    pub mining_reward: f64,
    /// Sender identifier stamped on reward transactions.
    pub reward_sender_id: String,
    /// Reject empty identifiers and non-positive values in `add_transaction`.
    pub validate_transactions: bool,
    /// Search nonces on the rayon pool instead of the calling thread.
    pub parallel_search: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            mining_reward: DEFAULT_MINING_REWARD,
            reward_sender_id: DEFAULT_REWARD_SENDER.to_string(),
            validate_transactions: false,
            parallel_search: false,
        }
    }
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.difficulty as usize > HASH_HEX_SIZE {
            return Err(LedgerError::InvalidConfig(format!(
                "difficulty {} exceeds the {HASH_HEX_SIZE} hex characters of a hash",
                self.difficulty
            )));
        }
        if !self.mining_reward.is_finite() {
            return Err(LedgerError::InvalidConfig(
                "mining reward must be finite".to_string(),
            ));
        }
        if self.reward_sender_id.is_empty() {
            return Err(LedgerError::InvalidConfig(
                "reward sender id must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
