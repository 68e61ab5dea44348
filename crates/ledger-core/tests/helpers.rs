#![allow(dead_code)]

use ledger_core::{Ledger, LedgerConfig};
use rand::{rngs::StdRng, Rng};

pub const REWARD_SENDER: &str = "THE BLOCKCHAIN";

pub fn ledger_with_difficulty(owner: &str, difficulty: u32) -> Ledger {
    let config = LedgerConfig {
        difficulty,
        ..LedgerConfig::default()
    };
    Ledger::with_config(owner, config).expect("valid config")
}

pub fn participants(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("user-{i}")).collect()
}

/// Random transfer between two distinct participants, in half-unit steps so
/// sums stay exact in f64.
pub fn random_transfer(rng: &mut StdRng, people: &[String]) -> (String, String, f64) {
    let from = rng.gen_range(0..people.len());
    let mut to = rng.gen_range(0..people.len() - 1);
    if to >= from {
        to += 1;
    }
    let value = rng.gen_range(1..=20) as f64 / 2.0;
    (people[from].clone(), people[to].clone(), value)
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
