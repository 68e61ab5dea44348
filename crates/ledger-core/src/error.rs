use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("invalid ledger configuration: {0}")]
    InvalidConfig(String),

    /// Only reachable if a chain is handed over without its genesis block.
    #[error("chain is empty")]
    EmptyChain,

    #[error("proof-of-work search was cancelled")]
    ProofOfWorkCancelled,

    #[error("no nonce in the u64 range satisfies the difficulty")]
    NonceSpaceExhausted,

    #[error("genesis block does not match the default-block bootstrap")]
    InvalidGenesis,

    #[error("block {index} does not link to the hash of its predecessor")]
    InvalidBlockLinkage { index: usize },

    #[error("block {index} does not satisfy the proof-of-work difficulty")]
    InvalidProofOfWork { index: usize },

    #[error("ledger lock poisoned by a panicking holder")]
    LockPoisoned,
}
