//! Throughput driver for the in-memory B-tree.
//!
//! For every order and element count, runs a linear and a random workload,
//! verifies iteration and fetch results, and reports insert / iterate /
//! fetch rates in thousands of operations per second.

use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use memtree::BTree;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "btree-perf",
    version,
    about = "Insert/iterate/fetch throughput for the memtree B-tree"
)]
struct Cli {
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "4,8,16,32,64",
        help = "Tree orders to measure"
    )]
    orders: Vec<usize>,

    #[arg(long, default_value_t = 500_000, help = "Smallest element count")]
    start: usize,

    #[arg(long, default_value_t = 3_000_000, help = "Largest element count")]
    end: usize,

    #[arg(long, default_value_t = 500_000, help = "Element count increment")]
    step: usize,

    #[arg(long, env = "MEMTREE_SEED", help = "Seed for the random workload")]
    seed: Option<u64>,
}

/// Rates for one run, in thousands of operations per second.
#[derive(Debug, Clone, Copy)]
struct Rates {
    insert: u64,
    iterate: u64,
    fetch: u64,
}

fn rate(count: usize, elapsed: Duration) -> u64 {
    let micros = elapsed.as_micros().max(1);
    ((count as u128 * 1_000) / micros) as u64
}

fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let out = f();
    (out, start.elapsed())
}

/// Keys 0..count in order; iteration must yield consecutive keys.
fn linear_test(order: usize, count: usize) -> Option<Rates> {
    info!(order, count, "perf.linear.start");
    let mut tree = BTree::new(order);

    let ((), insert_time) = timed(|| {
        for i in 0..count as u64 {
            tree.insert(i, i);
        }
    });

    let (ordered, iterate_time) = timed(|| {
        tree.keys()
            .zip(tree.keys().skip(1))
            .all(|(last, current)| current == last + 1)
    });
    if !ordered {
        error!(order, count, "perf.linear.iterate_failed");
        return None;
    }

    let (found, fetch_time) = timed(|| (0..count as u64).all(|i| tree.fetch(i) == Some(&i)));
    if !found {
        error!(order, count, "perf.linear.fetch_failed");
        return None;
    }

    info!(stats = %tree.stats(), "perf.linear.pass");
    Some(Rates {
        insert: rate(count, insert_time),
        iterate: rate(count, iterate_time),
        fetch: rate(count, fetch_time),
    })
}

/// Random keys from a seeded generator, replayed for the fetch phase.
fn random_test(order: usize, count: usize, seed: u64) -> Option<Rates> {
    info!(order, count, seed, "perf.random.start");
    let mut tree = BTree::new(order);

    let ((), insert_time) = timed(|| {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for _ in 0..count {
            let number: u64 = rng.gen_range(0..i64::MAX as u64);
            tree.insert(number, number);
        }
    });

    let (ordered, iterate_time) = timed(|| {
        tree.keys()
            .zip(tree.keys().skip(1))
            .all(|(last, current)| current > last)
    });
    if !ordered {
        error!(order, count, "perf.random.iterate_failed");
        return None;
    }

    let (found, fetch_time) = timed(|| {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..count).all(|_| {
            let number: u64 = rng.gen_range(0..i64::MAX as u64);
            tree.fetch(number) == Some(&number)
        })
    });
    if !found {
        error!(order, count, "perf.random.fetch_failed");
        return None;
    }

    info!(stats = %tree.stats(), "perf.random.pass");
    Some(Rates {
        insert: rate(count, insert_time),
        iterate: rate(tree.len(), iterate_time),
        fetch: rate(count, fetch_time),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    if cli.step == 0 || cli.start == 0 || cli.start > cli.end {
        error!(start = cli.start, end = cli.end, step = cli.step, "perf.bad_range");
        return ExitCode::FAILURE;
    }
    if let Some(&order) = cli.orders.iter().find(|&&o| o < memtree::MIN_ORDER) {
        error!(order, min = memtree::MIN_ORDER, "perf.bad_order");
        return ExitCode::FAILURE;
    }

    let seed = cli.seed.unwrap_or_else(rand::random);
    let mut results = Vec::new();

    for &order in &cli.orders {
        for count in (cli.start..=cli.end).step_by(cli.step) {
            if linear_test(order, count).is_none() {
                return ExitCode::FAILURE;
            }
            match random_test(order, count, seed) {
                Some(rates) => results.push((order, count, rates)),
                None => return ExitCode::FAILURE,
            }
        }
    }

    println!("order,count,insert_rate,fetch_rate,iterate_rate");
    for (order, count, rates) in results {
        println!(
            "{},{},{},{},{}",
            order, count, rates.insert, rates.fetch, rates.iterate
        );
    }
    ExitCode::SUCCESS
}
