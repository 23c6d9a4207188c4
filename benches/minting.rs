use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use pid_minter::engine::{IdentifierConfig, Layout, Minter, TokenType};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashSet;

// Number of identifiers minted per benchmark iteration.
const TOTAL_IDS: usize = 1000;

fn config(token_type: TokenType, root_length: usize) -> IdentifierConfig {
    let layout = Layout::Uniform {
        token_type,
        root_length,
    };
    IdentifierConfig::new(&layout, true, "ark".to_string(), String::new())
        .expect("valid layout")
}

fn bench_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    let config = config(TokenType::LowerExtended, 8);
    let empty: HashSet<String> = HashSet::new();
    group.bench_function(format!("fresh/elems/{TOTAL_IDS}"), |b| {
        let minter = Minter::new(&config, &empty);
        b.iter(|| black_box(minter.sequential(TOTAL_IDS as i64, 0)));
    });

    // Every other state already issued; the counter rolls past half of them.
    let taken: HashSet<String> = (0..2 * TOTAL_IDS as u64)
        .step_by(2)
        .filter_map(|ordinal| config.state_at(ordinal))
        .map(|state| config.render(&state).into_string())
        .collect();
    group.bench_function(format!("rolling/elems/{TOTAL_IDS}"), |b| {
        let minter = Minter::new(&config, &taken);
        b.iter(|| black_box(minter.sequential(TOTAL_IDS as i64, 0)));
    });

    group.finish();
}

fn bench_random(c: &mut Criterion) {
    let mut group = c.benchmark_group("random");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    let empty: HashSet<String> = HashSet::new();

    let sparse = config(TokenType::MixedExtended, 10);
    group.bench_function(format!("sparse/elems/{TOTAL_IDS}"), |b| {
        let minter = Minter::new(&sparse, &empty);
        let mut rng = StdRng::seed_from_u64(7);
        b.iter(|| black_box(minter.random_with(TOTAL_IDS as i64, 0, &mut rng)));
    });

    // 2100 states: later slots need several draws.
    let dense = {
        let layout = Layout::CharMap("dld".to_string());
        IdentifierConfig::new(&layout, true, String::new(), String::new()).expect("valid layout")
    };
    group.bench_function(format!("dense/elems/{TOTAL_IDS}"), |b| {
        let minter = Minter::new(&dense, &empty);
        let mut rng = StdRng::seed_from_u64(7);
        b.iter(|| black_box(minter.random_with(TOTAL_IDS as i64, 0, &mut rng)));
    });

    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    let config = config(TokenType::MixedExtended, 10);
    let pids: Vec<String> = (0..TOTAL_IDS as u64)
        .map(|i| i * 7_919_000_003)
        .filter_map(|ordinal| config.state_at(ordinal))
        .map(|state| config.render(&state).into_string())
        .collect();

    group.bench_function(format!("parse/elems/{TOTAL_IDS}"), |b| {
        b.iter(|| {
            for pid in &pids {
                black_box(config.parse(pid).ok().and_then(|state| state.to_ordinal()));
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_sequential, bench_random, bench_codec);
criterion_main!(benches);
