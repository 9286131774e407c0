//! Example 02: Resampling and Moving Moments
//!
//! Reduces a series into per-block accumulators, bootstraps the variance
//! from those blocks with a random frequency table, computes jackknife
//! estimates, and tracks the series with sliding-window and exponentially
//! weighted moments.

use central_moments::grouped::reduce_data_block;
use central_moments::matrix::MomentArray;
use central_moments::moments::Moments;
use central_moments::parallel::Parallel;
use central_moments::reduction::{cumulative, reduce_data, reduce_vals_batch};
use central_moments::resample::{jackknife_data, random_freq, resample_data};
use central_moments::rolling::{
    ewm_vals_batch, rolling_vals, EwmConfig, EwmDecay, RollingConfig,
};
use central_moments::samples::Samples;
use rand::prelude::*;

fn summarize(label: &str, values: &[f64]) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let sd = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
    println!("  {:<22} mean {:>9.5}  sd {:>9.5}", label, mean, sd);
}

fn main() {
    println!("=== Example 02: Resampling and Moving Moments ===\n");

    let mom = Moments::univariate(2).unwrap();
    let n = 2_000;
    let mut rng = StdRng::seed_from_u64(7);
    // noisy sine with a level shift half way
    let x: Vec<f64> = (0..n)
        .map(|i| {
            let level = if i < n / 2 { 0.0 } else { 1.5 };
            level + (i as f64 / 50.0).sin() + rng.gen_range(-0.5..0.5)
        })
        .collect();
    let samples = Samples::unweighted(&x);

    // --- One accumulator per sample, then blocks ---
    println!("--- Block reduction ---");
    let per_sample: MomentArray<f64> =
        reduce_vals_batch(&samples, 1, mom, Parallel::Auto).unwrap();
    let blocks = reduce_data_block(&per_sample, 100).unwrap();
    println!("  {} blocks of 100 samples", blocks.len());
    let total = reduce_data(&blocks);
    println!(
        "  total: weight {:.0}, mean {:.5}, variance {:.5}",
        total[0], total[1], total[2]
    );

    let running = cumulative(&blocks);
    let last = &running[running.len() - 1];
    println!("  cumulative end matches total: {}", (last[2] - total[2]).abs() < 1e-10);

    // --- Bootstrap over blocks ---
    println!("\n--- Bootstrap ---");
    let freq = random_freq(1_000, blocks.len(), None, true, 11).unwrap();
    let boot = resample_data(&blocks, &freq, Parallel::Auto).unwrap();
    let means: Vec<f64> = boot.iter().map(|acc| acc[1]).collect();
    let vars: Vec<f64> = boot.iter().map(|acc| acc[2]).collect();
    summarize("bootstrap mean", &means);
    summarize("bootstrap variance", &vars);

    // --- Jackknife over blocks ---
    println!("\n--- Jackknife ---");
    let jack = jackknife_data(&blocks, Some(&total), Parallel::Never).unwrap();
    let jack_vars: Vec<f64> = jack.iter().map(|acc| acc[2]).collect();
    summarize("leave-one-block-out", &jack_vars);

    // --- Moving moments ---
    println!("\n--- Moving moments ---");
    let window = rolling_vals(&samples, mom, &RollingConfig::new(200)).unwrap();
    let ewm_config = EwmConfig::new(EwmDecay::Span(200.0));
    let ewm = ewm_vals_batch(&samples, n, mom, &ewm_config, Parallel::Never).unwrap();
    for i in (199..n).step_by(300) {
        println!(
            "  step {:>4}: window mean {:>8.4} var {:>7.4} | ewm mean {:>8.4} var {:>7.4}",
            i, window[i][1], window[i][2], ewm[i][1], ewm[i][2]
        );
    }

    println!("\n=== Done ===");
}
