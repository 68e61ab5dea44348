use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tracing::debug;

use crate::{
    constants::HASH_HEX_SIZE,
    error::{LedgerError, Result},
    CanonicalBlock, Hash, Transaction,
};

/// Shared flag that aborts a running nonce search.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Number of leading `'0'` characters in the lowercase hex rendering of `hash`.
pub fn count_leading_zero_nibbles(hash: &Hash) -> u32 {
    let mut total = 0u32;
    for b in hash {
        if *b == 0 {
            total += 2;
        } else {
            if *b < 0x10 {
                total += 1;
            }
            break;
        }
    }
    total
}

/// True iff the hex form of `hash` starts with `difficulty` zeros.
pub fn meets_difficulty(hash: &Hash, difficulty: u32) -> bool {
    difficulty as usize <= HASH_HEX_SIZE && count_leading_zero_nibbles(hash) >= difficulty
}

/// Hash of the candidate block for `nonce`, with the timestamp pinned to 0 so
/// the result depends on nothing but the arguments.
pub fn candidate_hash(nonce: u64, previous_hash: &Hash, transactions: &[Transaction]) -> Hash {
    CanonicalBlock {
        timestamp: 0,
        nonce,
        previous_hash,
        transactions,
    }
    .hash()
}

pub fn valid_proof(
    nonce: u64,
    previous_hash: &Hash,
    transactions: &[Transaction],
    difficulty: u32,
) -> bool {
    meets_difficulty(&candidate_hash(nonce, previous_hash, transactions), difficulty)
}

pub(crate) fn check_reachable(difficulty: u32) -> Result<()> {
    if difficulty as usize > HASH_HEX_SIZE {
        return Err(LedgerError::InvalidConfig(format!(
            "difficulty {difficulty} can never be met"
        )));
    }
    Ok(())
}

/// Scan nonces upward from 0 and return the first one that passes
/// [`valid_proof`].
pub fn find_nonce(
    previous_hash: &Hash,
    transactions: &[Transaction],
    difficulty: u32,
    cancel: &CancelToken,
) -> Result<u64> {
    check_reachable(difficulty)?;
    debug!(difficulty, txs = transactions.len(), "starting sequential nonce search");

    let mut nonce = 0u64;
    loop {
        if cancel.is_cancelled() {
            return Err(LedgerError::ProofOfWorkCancelled);
        }
        if valid_proof(nonce, previous_hash, transactions, difficulty) {
            debug!(nonce, "nonce found");
            return Ok(nonce);
        }
        nonce = nonce
            .checked_add(1)
            .ok_or(LedgerError::NonceSpaceExhausted)?;
    }
}

/// Dispatch to the sequential or the rayon search. Both return the smallest
/// qualifying nonce.
pub fn search_nonce(
    previous_hash: &Hash,
    transactions: &[Transaction],
    difficulty: u32,
    parallel: bool,
    cancel: &CancelToken,
) -> Result<u64> {
    if parallel {
        crate::mine::find_nonce_parallel(previous_hash, transactions, difficulty, cancel)
    } else {
        find_nonce(previous_hash, transactions, difficulty, cancel)
    }
}
