//! Nested Sum Benchmark for repverify
//!
//! Times the collision probabilities behind 2.3' and 2.3'', the only
//! equations whose cost grows polynomially with the threshold (the
//! shared 2.3'' nest has five levels).
//!
//! # Usage
//!
//! ```bash
//! cargo bench --bench nested_sums
//! ```

use repverify::core::equations::{one_step, two_step_shared};
use std::time::Instant;

#[derive(Debug)]
struct BenchmarkResult {
    label: &'static str,
    threshold: u64,
    value: f64,
    mean_time_ms: f64,
    trials: usize,
}

fn time<F>(label: &'static str, threshold: u64, trials: usize, f: F) -> BenchmarkResult
where
    F: Fn() -> f64,
{
    let mut value = 0.0;
    let start = Instant::now();
    for _ in 0..trials {
        value = f();
    }
    BenchmarkResult {
        label,
        threshold,
        value,
        mean_time_ms: start.elapsed().as_secs_f64() * 1000.0 / trials as f64,
        trials,
    }
}

fn main() {
    let (n, p, r) = (100_000_u64, 0.002, 1_200_u64);
    let trials = 5;

    println!("=== repverify Nested Sum Benchmark ===");
    println!("n = {}, p = {}, r = {}, {} trials per row\n", n, p, r, trials);
    println!(
        "{:<24} {:>4} {:>14} {:>12}",
        "Collision sum", "k", "value", "mean ms"
    );

    let mut results = Vec::new();
    for k in [2_u64, 4, 6, 8, 10] {
        results.push(time("2.3' (four levels)", k, trials, || {
            two_step_shared::collision_probability(n, p, k, r).unwrap_or(f64::NAN)
        }));
        results.push(time("2.3'' shared (five)", k, trials, || {
            one_step::collision_probability_shared(n, p, k, r).unwrap_or(f64::NAN)
        }));
        results.push(time("2.3'' disjoint (one)", k, trials, || {
            one_step::collision_probability_disjoint(p, k, r).unwrap_or(f64::NAN)
        }));
    }

    for result in &results {
        println!(
            "{:<24} {:>4} {:>14.6e} {:>12.3}",
            result.label, result.threshold, result.value, result.mean_time_ms
        );
    }

    let slowest = results
        .iter()
        .max_by(|a, b| a.mean_time_ms.total_cmp(&b.mean_time_ms));
    if let Some(slowest) = slowest {
        println!(
            "\nSlowest: {} at k = {} ({:.3} ms over {} trials)",
            slowest.label, slowest.threshold, slowest.mean_time_ms, slowest.trials
        );
    }
}
