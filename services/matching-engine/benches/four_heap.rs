//! Four-heap insertion/withdrawal benchmark

use criterion::{criterion_group, criterion_main, Criterion};
use matching_engine::FourHeap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use types::ids::{AgentId, OrderId};
use types::numeric::Price;
use types::order::{OrderRef, Side};
use types::time::{MarketTime, TimeStamp};

fn order(id: u64, side: Side, price: i64) -> OrderRef {
    OrderRef::new(
        OrderId::of(id),
        AgentId::of(id % 16),
        side,
        Price::of(price),
        MarketTime::new(TimeStamp::of(id as i64), id),
    )
}

fn bench_insert_clear(c: &mut Criterion) {
    c.bench_function("insert_10k_then_clear", |b| {
        b.iter(|| {
            let mut rng = ChaCha8Rng::seed_from_u64(42);
            let mut book = FourHeap::new();
            for id in 1..=10_000u64 {
                let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
                let price = rng.gen_range(90..111);
                book.insert(order(id, side, price), rng.gen_range(1..5)).unwrap();
            }
            book.market_clear()
        })
    });
}

fn bench_insert_withdraw(c: &mut Criterion) {
    c.bench_function("insert_withdraw_churn", |b| {
        b.iter(|| {
            let mut rng = ChaCha8Rng::seed_from_u64(7);
            let mut book = FourHeap::new();
            for id in 1..=5_000u64 {
                let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
                let price = rng.gen_range(90..111);
                book.insert(order(id, side, price), rng.gen_range(1..5)).unwrap();
                if id > 100 {
                    let victim = OrderId::of(rng.gen_range(1..id));
                    if book.contains(victim) {
                        let _ = book.withdraw(victim, 1);
                    }
                }
            }
            book.total_quantity()
        })
    });
}

criterion_group!(benches, bench_insert_clear, bench_insert_withdraw);
criterion_main!(benches);
