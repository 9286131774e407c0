//! End-to-end scenarios on fixed and random data.

use central_moments::grouped::{
    factor_by_to_index, reduce_data_grouped, reduce_data_indexed_fromzero, reduce_vals_grouped,
};
use central_moments::helpers::{DEFAULT_ATOL, DEFAULT_RTOL};
use central_moments::matrix::MomentArray;
use central_moments::moments::{Moments, MomentsType};
use central_moments::parallel::Parallel;
use central_moments::reduction::{reduce_data_batch, reduce_vals, reduce_vals_batch};
use central_moments::resample::{jackknife_freq, jackknife_vals, random_freq, resample_vals};
use central_moments::samples::Samples;
use central_moments::{allclose, convert, kernel, MomentFloat};
use rand::prelude::*;
use rand_distr::{Exp, Normal};

// ─── Helpers ────────────────────────────────────────────────────────────────

fn assert_vec_close<T: MomentFloat>(actual: &[T], expected: &[T], tol: f64, label: &str) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "{}: length mismatch: {} vs {}",
        label,
        actual.len(),
        expected.len()
    );
    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        let (a, e) = (a.to_f64().unwrap_or(f64::NAN), e.to_f64().unwrap_or(f64::NAN));
        if a.is_nan() && e.is_nan() {
            continue;
        }
        let scale = e.abs().max(1.0);
        assert!(
            (a - e).abs() <= tol * scale,
            "{}: index {}: {} vs {} (tol {})",
            label,
            i,
            a,
            e,
            tol * scale
        );
    }
}

fn normal_data(n: usize, seed: u64) -> (Vec<f64>, Vec<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let exp = Exp::new(1.0).unwrap();
    let x = (0..n).map(|_| normal.sample(&mut rng)).collect();
    let w = (0..n).map(|_| 0.1 + exp.sample(&mut rng)).collect();
    (x, w)
}

/// Direct weighted central moments for comparison.
fn two_pass(x: &[f64], w: &[f64], order: usize) -> Vec<f64> {
    let wsum: f64 = w.iter().sum();
    let mean = x.iter().zip(w).map(|(x, w)| x * w).sum::<f64>() / wsum;
    let mut out = vec![wsum, mean];
    for k in 2..=order {
        out.push(x.iter().zip(w).map(|(x, w)| w * (x - mean).powi(k as i32)).sum::<f64>() / wsum);
    }
    out
}

// ─── Scenarios ──────────────────────────────────────────────────────────────

#[test]
fn test_unit_weights_order_two() {
    let x = [1.0, 2.0, 3.0, 4.0];
    let w = [1.0, 1.0, 1.0, 1.0];
    let acc = reduce_vals(Moments::Univariate(2), &Samples::new(&x, &w).unwrap()).unwrap();
    assert_vec_close(&acc, &[4.0, 2.5, 1.25], 1e-12, "scenario");
}

#[test]
fn test_jackknife_freq_four() {
    let freq = jackknife_freq(4);
    let expected = [0, 1, 1, 1, 1, 0, 1, 1, 1, 1, 0, 1, 1, 1, 1, 0];
    assert_eq!(freq.as_slice(), &expected);
}

#[test]
fn test_large_sample_matches_two_pass() {
    let (x, w) = normal_data(5_000, 1);
    let mom = Moments::Univariate(4);
    let acc = reduce_vals(mom, &Samples::new(&x, &w).unwrap()).unwrap();
    assert_vec_close(&acc, &two_pass(&x, &w, 4), 1e-9, "normal");
    // standard normal: variance near 1, kurtosis near 3
    assert!((acc[2] - 1.0).abs() < 0.1);
    assert!((acc[4] / (acc[2] * acc[2]) - 3.0).abs() < 0.3);
}

#[test]
fn test_single_precision() {
    let (x, w) = normal_data(500, 2);
    let x32: Vec<f32> = x.iter().map(|&v| v as f32).collect();
    let w32: Vec<f32> = w.iter().map(|&v| v as f32).collect();
    let mom = Moments::Univariate(3);
    let acc32 = reduce_vals(mom, &Samples::new(&x32, &w32).unwrap()).unwrap();
    let acc64 = reduce_vals(mom, &Samples::new(&x, &w).unwrap()).unwrap();
    let widened: Vec<f64> = acc32.iter().map(|&v| v as f64).collect();
    assert_vec_close(&widened, &acc64, 1e3 * f32::EPSILON_F64, "f32");
}

#[test]
fn test_parallel_policy_does_not_change_results() {
    let (x, w) = normal_data(40_000, 3);
    let mom = Moments::Univariate(3);
    let samples = Samples::new(&x, &w).unwrap();
    let seq = reduce_vals_batch(&samples, 40, mom, Parallel::Never).unwrap();
    let par = reduce_vals_batch(&samples, 40, mom, Parallel::Auto).unwrap();
    assert_eq!(seq, par);

    let pooled_seq = reduce_data_batch(&seq, 10, Parallel::Never).unwrap();
    let pooled_par = reduce_data_batch(&seq, 10, Parallel::Always).unwrap();
    assert_eq!(pooled_seq, pooled_par);
    for b in 0..pooled_seq.len() {
        let lo = b * 400;
        let direct = two_pass(&x[lo..lo + 400], &w[lo..lo + 400], 3);
        assert_vec_close(&pooled_seq[b], &direct, 1e-8, "pooled");
    }
}

#[test]
fn test_grouped_paths_agree() {
    let (x, w) = normal_data(300, 4);
    let mut rng = StdRng::seed_from_u64(5);
    let by: Vec<i64> = (0..x.len()).map(|_| rng.gen_range(-1..6)).collect();
    let mom = Moments::Univariate(3);
    let samples = Samples::new(&x, &w).unwrap();

    let mut per_sample = MomentArray::zeros(x.len(), mom).unwrap();
    for i in 0..x.len() {
        kernel::push_val(mom, &mut per_sample[i], x[i], 0.0, w[i]);
    }
    let dense = reduce_data_grouped(&per_sample, &by, 6).unwrap();
    let vals = reduce_vals_grouped(&samples, mom, &by, 6).unwrap();
    let groups = factor_by_to_index(&by);
    let indexed =
        reduce_data_indexed_fromzero(&per_sample, &groups, None, Parallel::Always).unwrap();

    assert!(allclose(dense.as_slice(), vals.as_slice(), DEFAULT_RTOL, DEFAULT_ATOL));
    for (k, &g) in groups.groups.iter().enumerate() {
        assert_vec_close(&indexed[k], &dense[g as usize], 1e-10, "indexed");
        let members: Vec<usize> = (0..x.len()).filter(|&i| by[i] == g).collect();
        let xg: Vec<f64> = members.iter().map(|&i| x[i]).collect();
        let wg: Vec<f64> = members.iter().map(|&i| w[i]).collect();
        assert_vec_close(&dense[g as usize], &two_pass(&xg, &wg, 3), 1e-9, "dense");
    }
}

#[test]
fn test_bootstrap_mean_spread() {
    let (x, _) = normal_data(200, 6);
    let mom = Moments::Univariate(2);
    let samples = Samples::unweighted(&x);
    let freq = random_freq(400, x.len(), None, true, 7).unwrap();
    let out = resample_vals(&samples, mom, &freq, Parallel::Auto).unwrap();
    let means: Vec<f64> = out.iter().map(|acc| acc[1]).collect();
    let grand = means.iter().sum::<f64>() / means.len() as f64;
    let sq_dev = means.iter().map(|m| (m - grand).powi(2)).sum::<f64>();
    let spread = (sq_dev / means.len() as f64).sqrt();
    // standard error of the mean of 200 standard normals
    let se = 1.0 / (x.len() as f64).sqrt();
    assert!((spread / se - 1.0).abs() < 0.25, "spread {} vs se {}", spread, se);
    assert!(out.weights().iter().all(|&wt| wt == x.len() as f64));
}

#[test]
fn test_jackknife_of_mean() {
    let (x, _) = normal_data(50, 8);
    let mom = Moments::Univariate(2);
    let out = jackknife_vals(&Samples::unweighted(&x), mom, None, Parallel::Never).unwrap();
    let total: f64 = x.iter().sum();
    for s in 0..x.len() {
        let expected = (total - x[s]) / 49.0;
        assert!((out[s][1] - expected).abs() < 1e-12);
        assert_eq!(out[s][0], 49.0);
    }
}

#[test]
fn test_raw_moments_of_random_data() {
    let (x, w) = normal_data(1_000, 9);
    let mom = Moments::Univariate(4);
    let central = reduce_vals(mom, &Samples::new(&x, &w).unwrap()).unwrap();
    let arr = MomentArray::from_vec(central.clone(), mom).unwrap();
    let raw = convert(&arr, MomentsType::Raw, Parallel::Never);
    let wsum: f64 = w.iter().sum();
    for k in 2..=4 {
        let direct = x.iter().zip(&w).map(|(x, w)| w * x.powi(k as i32)).sum::<f64>() / wsum;
        assert!((raw[0][k] - direct).abs() < 1e-10, "order {}", k);
    }
    let back = convert(&raw, MomentsType::Central, Parallel::Never);
    assert_vec_close(&back[0], &central, 1e-10, "roundtrip");
}
