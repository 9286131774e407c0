//! Example 01: Basic Moment Accumulation
//!
//! Demonstrates pushing weighted samples into an accumulator, merging two
//! partial accumulators, removing a sample again, converting to raw
//! moments, and reading off summary statistics. Finishes with co-moments
//! of two correlated variates.

use central_moments::convert::{
    central_to_raw, correlation, covariance, excess_kurtosis, skewness, variance,
};
use central_moments::kernel::{merge, push_val, remove_val};
use central_moments::moments::Moments;
use central_moments::reduction::{reduce_vals, reduce_vals_multipass};
use central_moments::samples::Samples;
use rand::prelude::*;

fn main() {
    println!("=== Example 01: Basic Moment Accumulation ===\n");

    let mom = Moments::univariate(4).unwrap();

    // --- Push samples one at a time ---
    println!("--- Streaming push ---");
    let xs = [1.0, 2.0, 3.0, 4.0];
    let mut acc = vec![0.0; mom.size()];
    for &x in &xs {
        push_val(mom, &mut acc, x, 0.0, 1.0);
        println!("  after {:>4.1}: {:?}", x, acc);
    }

    // --- Merge two halves ---
    println!("\n--- Merge ---");
    let mut left = reduce_vals(mom, &Samples::unweighted(&xs[..2])).unwrap();
    let right = reduce_vals(mom, &Samples::unweighted(&xs[2..])).unwrap();
    merge(mom, &right, &mut left);
    println!("  left + right: {:?}", left);
    println!("  whole:        {:?}", acc);

    // --- Remove a sample ---
    println!("\n--- Remove ---");
    remove_val(mom, &mut acc, 4.0, 0.0, 1.0);
    println!("  without 4.0: {:?}", acc);

    // --- Raw moments ---
    println!("\n--- Raw moments ---");
    let mut raw = vec![0.0; mom.size()];
    central_to_raw(&acc, &mut raw);
    println!("  <x^n> of [1, 2, 3]: {:?}", &raw[1..]);

    // --- Statistics of random data ---
    println!("\n--- Weighted statistics ---");
    let mut rng = StdRng::seed_from_u64(42);
    let x: Vec<f64> = (0..10_000).map(|_| rng.gen::<f64>().powi(2)).collect();
    let w: Vec<f64> = (0..10_000).map(|_| rng.gen_range(0.5..2.0)).collect();
    let samples = Samples::new(&x, &w).unwrap();
    let streamed = reduce_vals(mom, &samples).unwrap();
    let two_pass = reduce_vals_multipass(mom, &samples).unwrap();
    println!("  weight:          {:.3}", streamed[0]);
    println!("  mean:            {:.6}", streamed[1]);
    println!("  variance:        {:.6}", variance(&streamed, mom));
    println!("  skewness:        {:.6}", skewness(&streamed, mom));
    println!("  excess kurtosis: {:.6}", excess_kurtosis(&streamed, mom));
    let max_diff = streamed
        .iter()
        .zip(&two_pass)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max);
    println!("  max |streaming - two-pass|: {:.2e}", max_diff);

    // --- Co-moments ---
    println!("\n--- Co-moments ---");
    let cov_mom = Moments::bivariate(2, 2).unwrap();
    let y: Vec<f64> = x.iter().map(|v| 2.0 * v + rng.gen_range(-0.1..0.1)).collect();
    let pairs = Samples::bivariate(&x, &y, Some(&w)).unwrap();
    let grid = reduce_vals(cov_mom, &pairs).unwrap();
    println!("  covariance:  {:.6}", covariance(&grid, cov_mom));
    println!("  correlation: {:.6}", correlation(&grid, cov_mom));

    println!("\n=== Done ===");
}
