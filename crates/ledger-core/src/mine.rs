use crate::{
    constants::POW_BATCH_SIZE,
    error::{LedgerError, Result},
    pow::{check_reachable, valid_proof, CancelToken},
    Hash, Transaction,
};
use rayon::prelude::*;
use tracing::debug;

/// Searches nonces in parallel until a candidate hash has at least
/// `difficulty` leading hex zeros.
///
/// The nonce space is walked in consecutive batches of [`POW_BATCH_SIZE`];
/// each batch is split across the rayon pool and `find_first` keeps the
/// lowest hit, so the answer is always the same nonce the sequential scan
/// would return.
pub fn find_nonce_parallel(
    previous_hash: &Hash,
    transactions: &[Transaction],
    difficulty: u32,
    cancel: &CancelToken,
) -> Result<u64> {
    check_reachable(difficulty)?;
    debug!(
        difficulty,
        txs = transactions.len(),
        threads = rayon::current_num_threads(),
        "starting parallel nonce search"
    );

    let mut start = 0u64;
    loop {
        if cancel.is_cancelled() {
            return Err(LedgerError::ProofOfWorkCancelled);
        }
        let end = start.saturating_add(POW_BATCH_SIZE - 1);

        let found = (start..=end).into_par_iter().find_first(|nonce| {
            !cancel.is_cancelled() && valid_proof(*nonce, previous_hash, transactions, difficulty)
        });

        // A cancel mid-batch may have skipped lower nonces; never report those hits.
        if cancel.is_cancelled() {
            return Err(LedgerError::ProofOfWorkCancelled);
        }
        if let Some(nonce) = found {
            debug!(nonce, "nonce found");
            return Ok(nonce);
        }
        if end == u64::MAX {
            return Err(LedgerError::NonceSpaceExhausted);
        }
        start = end + 1;
    }
}
