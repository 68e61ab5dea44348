use criterion::{criterion_group, criterion_main, Criterion};
use ledger_core::{
    mine::find_nonce_parallel,
    pow::{find_nonce, CancelToken},
    Transaction,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::hint::black_box;

fn sample_transactions() -> Vec<Transaction> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..10)
        .map(|i| Transaction::new(format!("alice-{i}"), "bob", rng.gen_range(1..10) as f64))
        .collect()
}

fn bench_pow(c: &mut Criterion) {
    let txs = sample_transactions();
    let cancel = CancelToken::new();

    c.bench_function("find_nonce_difficulty_3", |b| {
        b.iter(|| find_nonce(black_box(&[0u8; 32]), &txs, 3, &cancel));
    });

    c.bench_function("find_nonce_parallel_difficulty_3", |b| {
        b.iter(|| find_nonce_parallel(black_box(&[0u8; 32]), &txs, 3, &cancel));
    });
}

criterion_group!(benches, bench_pow);
criterion_main!(benches);
