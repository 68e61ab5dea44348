mod helpers;

use helpers::{ledger_with_difficulty, REWARD_SENDER};
use ledger_core::{CancelToken, LedgerError, SharedLedger};
use std::thread;

#[test]
fn concurrent_adds_are_all_sealed_once() -> anyhow::Result<()> {
    let shared = SharedLedger::new(ledger_with_difficulty("M", 1));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let shared = shared.clone();
            thread::spawn(move || {
                for i in 0..25 {
                    shared
                        .add_transaction(format!("sender-{t}"), format!("recipient-{i}"), 1.0)
                        .expect("add");
                }
            })
        })
        .collect();
    for h in handles {
        h.join().expect("adder thread");
    }

    let block = shared.mine()?;
    assert_eq!(block.transactions().len(), 101);
    assert!(shared.pending_transactions()?.is_empty());
    for t in 0..4 {
        assert_eq!(shared.compute_balance(&format!("sender-{t}"))?, -25.0);
    }
    Ok(())
}

#[test]
fn adds_racing_with_mining_are_neither_lost_nor_duplicated() -> anyhow::Result<()> {
    let shared = SharedLedger::new(ledger_with_difficulty("M", 2));

    let adders: Vec<_> = (0..3)
        .map(|t| {
            let shared = shared.clone();
            thread::spawn(move || {
                for _ in 0..40 {
                    shared
                        .add_transaction(format!("s{t}"), "sink", 1.0)
                        .expect("add");
                }
            })
        })
        .collect();
    let miner = {
        let shared = shared.clone();
        thread::spawn(move || {
            for _ in 0..5 {
                shared.mine().expect("mine");
            }
        })
    };

    for h in adders {
        h.join().expect("adder thread");
    }
    miner.join().expect("miner thread");
    shared.mine()?;

    let ledger = shared.snapshot()?;
    let transfers = ledger
        .chain()
        .iter()
        .flat_map(|b| b.transactions())
        .filter(|tx| tx.sender() != REWARD_SENDER)
        .count();
    assert_eq!(transfers, 120);
    assert_eq!(ledger.compute_balance("sink"), 120.0);
    assert_eq!(ledger.compute_balance("M"), 6.0);
    assert!(ledger.pending_transactions().is_empty());
    ledger.validate_chain()?;
    Ok(())
}

#[test]
fn cancelled_shared_mine_keeps_pool() -> anyhow::Result<()> {
    let shared = SharedLedger::new(ledger_with_difficulty("M", 3));
    shared.add_transaction("A", "B", 1.0)?;
    let cancel = CancelToken::new();
    cancel.cancel();

    assert_eq!(
        shared.mine_with(&cancel).unwrap_err(),
        LedgerError::ProofOfWorkCancelled
    );
    assert_eq!(shared.block_count()?, 1);
    assert_eq!(shared.pending_transactions()?.len(), 1);
    Ok(())
}
