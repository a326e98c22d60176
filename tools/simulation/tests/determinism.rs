//! Run-level determinism
//!
//! A fixed seed and an identical scheduling sequence must replay to an
//! identical run: same transactions, same quotes, same NBBO. The timeline's
//! injected generator is the only entropy source, exercised here through
//! same-tick quote publications and interleaved call-market clears.

use simulation::{MarketConfig, MarketKind, SimConfig, Simulation};
use types::ids::{AgentId, MarketId};
use types::numeric::Price;
use types::order::Side;
use types::time::TimeStamp;
use types::trade::Transaction;

fn config(seed: u64) -> SimConfig {
    SimConfig {
        seed,
        sip_latency: TimeStamp::of(10),
        markets: vec![
            MarketConfig::default(),
            MarketConfig {
                kind: MarketKind::Call {
                    clear_interval: TimeStamp::of(50),
                },
                ..Default::default()
            },
        ],
    }
}

/// A small scripted session touching both markets at coinciding times.
fn run(seed: u64) -> (Vec<Transaction>, Vec<Transaction>) {
    let mut sim = Simulation::new(config(seed)).unwrap();
    let cda = MarketId::of(0);
    let call = MarketId::of(1);

    for step in 0..10u64 {
        let maker = AgentId::of(step % 3);
        let taker = AgentId::of(3 + step % 2);
        let price = Price::of(100 + (step % 5) as i64);
        sim.submit_order(cda, maker, Side::Sell, price, 1 + step % 2).unwrap();
        sim.submit_order(cda, taker, Side::Buy, price, 1).unwrap();
        sim.submit_order(call, maker, Side::Sell, price, 1).unwrap();
        sim.submit_order(call, taker, Side::Buy, price, 1).unwrap();
        sim.execute_until(TimeStamp::of((step as i64 + 1) * 25));
    }
    sim.execute_until(TimeStamp::of(1_000));

    (
        sim.transactions(cda).unwrap().to_vec(),
        sim.transactions(call).unwrap().to_vec(),
    )
}

#[test]
fn same_seed_replays_identically() {
    assert_eq!(run(42), run(42));
    assert_eq!(run(7), run(7));
}

#[test]
fn trades_balance_regardless_of_seed() {
    for seed in [1u64, 2, 3] {
        let (cda, call) = run(seed);
        assert!(!cda.is_empty());
        assert!(!call.is_empty());
        for tx in cda.iter().chain(call.iter()) {
            assert!(tx.quantity > 0);
            assert!(tx.buy.price >= tx.sell.price);
            // The clearing price lies inside the crossed interval.
            assert!(tx.price >= tx.sell.price && tx.price <= tx.buy.price);
        }
        // Call market transactions only occur on the clearing grid.
        for tx in &call {
            assert_eq!(tx.exec_time.ticks() % 50, 0);
        }
    }
}

#[test]
fn nbbo_state_is_reproducible() {
    let nbbo_of = |seed: u64| {
        let mut sim = Simulation::new(config(seed)).unwrap();
        let cda = MarketId::of(0);
        for step in 0..5u64 {
            sim.submit_order(
                cda,
                AgentId::of(step),
                Side::Buy,
                Price::of(80 + step as i64),
                1,
            )
            .unwrap();
            sim.execute_until(TimeStamp::of((step as i64 + 1) * 20));
        }
        sim.nbbo().clone()
    };
    assert_eq!(nbbo_of(42), nbbo_of(42));
}
