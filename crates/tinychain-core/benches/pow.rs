use criterion::{criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use tinychain_core::mine::mine_block_parallel;
use tinychain_core::Block;

#[derive(Serialize)]
struct Transfer {
    sender: String,
    recipient: String,
    quantity: u64,
}

fn bench_pow(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let transfer = Transfer {
        sender: "alice".into(),
        recipient: "bob".into(),
        quantity: rng.gen_range(1..100),
    };
    let block = Block::new(1, "1600000000", &transfer, "0").unwrap();

    c.bench_function("mine_difficulty_3", |b| {
        b.iter(|| {
            let mut candidate = block.clone();
            candidate.mine(3).unwrap();
        })
    });

    c.bench_function("mine_difficulty_3_parallel", |b| {
        b.iter(|| mine_block_parallel(&block, 3).unwrap())
    });
}

criterion_group!(benches, bench_pow);
criterion_main!(benches);
