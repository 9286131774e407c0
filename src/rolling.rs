//! Sliding-window and exponentially weighted moving moments.
//!
//! Both engines walk one series in step order, keep a single running
//! accumulator and emit it at every step once at least
//! `max(min_count, 1)` nonzero-weight samples contribute; earlier steps get
//! a NaN-filled accumulator. Batched variants process independent series
//! (batch-major, `nbatch x nsamp`) in parallel.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{MomentsError, Result};
use crate::float::MomentFloat;
use crate::helpers::{cast, fill_nan, fill_zero};
use crate::kernel;
use crate::matrix::MomentArray;
use crate::maybe_par_chunks_mut_enumerate;
use crate::moments::Moments;
use crate::parallel::Parallel;
use crate::samples::Samples;

/// Sliding-window parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RollingConfig {
    pub window: usize,
    /// Minimum number of nonzero-weight samples in the window.
    pub min_count: usize,
}

impl RollingConfig {
    /// Window of `window` samples, valid only once full.
    pub fn new(window: usize) -> Self {
        Self {
            window,
            min_count: window,
        }
    }

    pub fn with_min_count(mut self, min_count: usize) -> Self {
        self.min_count = min_count;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.window == 0 {
            return Err(MomentsError::InvalidWindow(self.window));
        }
        Ok(())
    }
}

/// Decay parameterisations, following the pandas `ewm` conventions.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EwmDecay {
    /// Smoothing factor, `0 < alpha <= 1`.
    Alpha(f64),
    /// Center of mass, `alpha = 1 / (1 + com)`.
    Com(f64),
    /// `alpha = 2 / (span + 1)`.
    Span(f64),
    /// `alpha = 1 - exp(-ln 2 / halflife)`.
    Halflife(f64),
}

impl EwmDecay {
    /// Smoothing factor.
    pub fn alpha(self) -> Result<f64> {
        let invalid = |name, value| Err(MomentsError::InvalidDecay { name, value });
        match self {
            EwmDecay::Alpha(a) if a > 0.0 && a <= 1.0 => Ok(a),
            EwmDecay::Alpha(a) => invalid("alpha", a),
            EwmDecay::Com(c) if c >= 0.0 => Ok(1.0 / (1.0 + c)),
            EwmDecay::Com(c) => invalid("com", c),
            EwmDecay::Span(s) if s >= 1.0 => Ok(2.0 / (s + 1.0)),
            EwmDecay::Span(s) => invalid("span", s),
            EwmDecay::Halflife(h) if h > 0.0 => Ok(1.0 - (-std::f64::consts::LN_2 / h).exp()),
            EwmDecay::Halflife(h) => invalid("halflife", h),
        }
    }
}

/// Exponentially weighted parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EwmConfig {
    pub decay: EwmDecay,
    /// Bias-adjusted weights (`true`) or the recursive form (`false`).
    pub adjust: bool,
    pub min_count: usize,
}

impl EwmConfig {
    pub fn new(decay: EwmDecay) -> Self {
        Self {
            decay,
            adjust: true,
            min_count: 1,
        }
    }

    pub fn with_adjust(mut self, adjust: bool) -> Self {
        self.adjust = adjust;
        self
    }

    pub fn with_min_count(mut self, min_count: usize) -> Self {
        self.min_count = min_count;
        self
    }

    /// Constant per-step smoothing factors for a series of length `n`.
    pub fn alphas<T: MomentFloat>(&self, n: usize) -> Result<Vec<T>> {
        Ok(vec![cast::<T>(self.decay.alpha()?); n])
    }
}

/// One series fed to a moving engine.
#[derive(Clone, Copy)]
enum Series<'a, T> {
    Vals(Samples<'a, T>),
    Data(&'a [T]),
}

impl<'a, T: MomentFloat> Series<'a, T> {
    #[inline(always)]
    fn weight(&self, mom: Moments, i: usize) -> T {
        match self {
            Series::Vals(samples) => samples.weight(i),
            Series::Data(data) => data[i * mom.size()],
        }
    }

    /// Fold sample `i` with its weight multiplied by `scale`.
    #[inline(always)]
    fn add(&self, mom: Moments, acc: &mut [T], i: usize, scale: T) {
        match self {
            Series::Vals(samples) => {
                let (x, y, w) = samples.get(i);
                kernel::push_val(mom, acc, x, y, w * scale);
            }
            Series::Data(data) => {
                let size = mom.size();
                kernel::merge_scaled(mom, &data[i * size..(i + 1) * size], scale, acc);
            }
        }
    }

    /// Series `b` of `nsamp` samples.
    fn row(&self, mom: Moments, b: usize, nsamp: usize) -> Series<'a, T> {
        match self {
            Series::Vals(samples) => Series::Vals(samples.slice(b * nsamp..(b + 1) * nsamp)),
            Series::Data(data) => {
                let row = nsamp * mom.size();
                Series::Data(&data[b * row..(b + 1) * row])
            }
        }
    }
}

#[inline]
fn emit<T: MomentFloat>(acc: &[T], count: usize, min_count: usize, dst: &mut [T]) {
    if count >= min_count {
        dst.copy_from_slice(acc);
    } else {
        fill_nan(dst);
    }
}

/// Sliding window over one series; `out` holds one accumulator per step.
fn rolling_series<T: MomentFloat>(
    mom: Moments,
    series: Series<'_, T>,
    config: &RollingConfig,
    out: &mut [T],
) {
    let size = mom.size();
    let min_count = config.min_count.max(1);
    let mut acc = vec![T::zero(); size];
    let mut count = 0usize;

    for (i, dst) in out.chunks_exact_mut(size).enumerate() {
        if series.weight(mom, i) != T::zero() {
            series.add(mom, &mut acc, i, T::one());
            count += 1;
        }
        if i >= config.window {
            let old = i - config.window;
            let w_old = series.weight(mom, old);
            if w_old != T::zero() {
                count -= 1;
                if w_old < acc[0] {
                    series.add(mom, &mut acc, old, -T::one());
                } else {
                    // outgoing sample carries all remaining weight
                    tracing::trace!(
                        step = i,
                        outgoing = ?w_old,
                        total = ?acc[0],
                        "window reset to zero"
                    );
                    fill_zero(&mut acc);
                }
            }
        }
        emit(&acc, count, min_count, dst);
    }
}

/// Exponentially weighted accumulation over one series.
fn ewm_series<T: MomentFloat>(
    mom: Moments,
    series: Series<'_, T>,
    alpha: &[T],
    adjust: bool,
    min_count: usize,
    out: &mut [T],
) {
    let size = mom.size();
    let min_count = min_count.max(1);
    let mut acc = vec![T::zero(); size];
    let mut old_weight = T::zero();
    let mut count = 0usize;

    for (i, dst) in out.chunks_exact_mut(size).enumerate() {
        let a = alpha[i];
        let decay = T::one() - a;
        old_weight = old_weight * decay;
        kernel::scale_weight(&mut acc, decay);

        if series.weight(mom, i) != T::zero() {
            count += 1;
            let scale = if adjust { T::one() } else { a };
            series.add(mom, &mut acc, i, scale);
            if !adjust {
                old_weight = old_weight + a;
                acc[0] = acc[0] / old_weight;
                old_weight = T::one();
            }
        }
        emit(&acc, count, min_count, dst);
    }
}

fn check_alpha<T: MomentFloat>(alpha: &[T], nsamp: usize) -> Result<()> {
    if alpha.len() != nsamp {
        return Err(MomentsError::LengthMismatch {
            name: "alpha",
            expected: nsamp,
            actual: alpha.len(),
        });
    }
    if let Some(&a) = alpha.iter().find(|&&a| !(a >= T::zero() && a <= T::one())) {
        return Err(MomentsError::InvalidDecay {
            name: "alpha",
            value: a.to_f64().unwrap_or(f64::NAN),
        });
    }
    Ok(())
}

fn series_count(len: usize, nsamp: usize) -> Result<usize> {
    if nsamp == 0 {
        return if len == 0 {
            Ok(0)
        } else {
            Err(MomentsError::EmptySampleAxis)
        };
    }
    if len % nsamp != 0 {
        return Err(MomentsError::LengthMismatch {
            name: "series",
            expected: (len / nsamp + 1) * nsamp,
            actual: len,
        });
    }
    Ok(len / nsamp)
}

/// Run `engine` on each of the `nbatch` series of `nsamp` samples.
fn run_batch<T, F>(
    operation: &'static str,
    mom: Moments,
    series: Series<'_, T>,
    len: usize,
    nsamp: usize,
    policy: Parallel,
    engine: F,
) -> Result<MomentArray<T>>
where
    T: MomentFloat,
    F: Fn(Series<'_, T>, &mut [T]) + Send + Sync,
{
    let nbatch = series_count(len, nsamp)?;
    let mut out = MomentArray::zeroed(len, mom);
    if nbatch == 0 {
        return Ok(out);
    }
    let parallel = policy.resolve(operation, len * mom.size());
    let row = nsamp * mom.size();
    maybe_par_chunks_mut_enumerate!(
        out.as_mut_slice(),
        row,
        parallel,
        |(b, dst): (usize, &mut [T])| {
            engine(series.row(mom, b, nsamp), dst);
        }
    );
    Ok(out)
}

// ---------------------------------------------------------------------------
// Sliding window
// ---------------------------------------------------------------------------

/// Moving-window moments of raw samples.
///
/// # Examples
///
/// ```
/// use central_moments::moments::Moments;
/// use central_moments::rolling::{rolling_vals, RollingConfig};
/// use central_moments::samples::Samples;
///
/// let x = [1.0f64, 2.0, 3.0, 4.0];
/// let config = RollingConfig::new(2);
/// let out = rolling_vals(&Samples::unweighted(&x), Moments::Univariate(1), &config).unwrap();
/// assert!(out[0][0].is_nan());
/// assert_eq!(&out[3], &[2.0, 3.5]);
/// ```
///
/// # Errors
///
/// As [`rolling_vals_batch`].
pub fn rolling_vals<T: MomentFloat>(
    samples: &Samples<'_, T>,
    mom: Moments,
    config: &RollingConfig,
) -> Result<MomentArray<T>> {
    rolling_vals_batch(samples, samples.len(), mom, config, Parallel::Never)
}

/// Moving-window pooling of accumulators.
///
/// # Errors
///
/// [`MomentsError::InvalidWindow`] for a zero window.
pub fn rolling_data<T: MomentFloat>(
    data: &MomentArray<T>,
    config: &RollingConfig,
) -> Result<MomentArray<T>> {
    rolling_data_batch(data, data.len(), config, Parallel::Never)
}

/// [`rolling_vals`] over `nbatch x nsamp` batch-major samples.
///
/// # Arguments
/// * `samples` - Batch-major values, `nbatch * nsamp` long
/// * `nsamp` - Steps per series
/// * `mom` - Moment shape
/// * `config` - Window length and minimum count
/// * `policy` - Threading policy across series
///
/// # Errors
///
/// [`MomentsError::InvalidOrder`], [`MomentsError::WrongMomentsKind`] when
/// the samples do not match `mom`, [`MomentsError::InvalidWindow`] for a
/// zero window, or [`MomentsError::EmptySampleAxis`] /
/// [`MomentsError::LengthMismatch`] when the length is not a multiple of
/// `nsamp`.
pub fn rolling_vals_batch<T: MomentFloat>(
    samples: &Samples<'_, T>,
    nsamp: usize,
    mom: Moments,
    config: &RollingConfig,
    policy: Parallel,
) -> Result<MomentArray<T>> {
    let mom = mom.validate()?;
    samples.check_moments(mom)?;
    config.validate()?;
    run_batch(
        "rolling_vals",
        mom,
        Series::Vals(*samples),
        samples.len(),
        nsamp,
        policy,
        |s, dst| rolling_series(mom, s, config, dst),
    )
}

/// [`rolling_data`] over `nbatch x nsamp` batch-major accumulators.
///
/// # Errors
///
/// [`MomentsError::InvalidWindow`] for a zero window, or
/// [`MomentsError::EmptySampleAxis`] / [`MomentsError::LengthMismatch`]
/// when `data.len()` is not a multiple of `nsamp`.
pub fn rolling_data_batch<T: MomentFloat>(
    data: &MomentArray<T>,
    nsamp: usize,
    config: &RollingConfig,
    policy: Parallel,
) -> Result<MomentArray<T>> {
    config.validate()?;
    let mom = data.mom();
    run_batch(
        "rolling_data",
        mom,
        Series::Data(data.as_slice()),
        data.len(),
        nsamp,
        policy,
        |s, dst| rolling_series(mom, s, config, dst),
    )
}

// ---------------------------------------------------------------------------
// Exponentially weighted
// ---------------------------------------------------------------------------

/// Exponentially weighted moments of raw samples with per-step `alpha`.
///
/// # Arguments
/// * `samples` - Values (and weights) in step order
/// * `mom` - Moment shape
/// * `alpha` - Smoothing factor of each step, in `[0, 1]`
/// * `adjust` - Bias-adjusted weights instead of the recursive form
/// * `min_count` - Nonzero-weight samples required before output is valid
///
/// # Errors
///
/// [`MomentsError::InvalidOrder`], [`MomentsError::WrongMomentsKind`] when
/// the samples do not match `mom`, [`MomentsError::LengthMismatch`] when
/// `alpha` is not one per sample, or [`MomentsError::InvalidDecay`] for an
/// `alpha` outside `[0, 1]`.
pub fn rolling_exp_vals<T: MomentFloat>(
    samples: &Samples<'_, T>,
    mom: Moments,
    alpha: &[T],
    adjust: bool,
    min_count: usize,
) -> Result<MomentArray<T>> {
    let mom = mom.validate()?;
    samples.check_moments(mom)?;
    check_alpha(alpha, samples.len())?;
    let mut out = MomentArray::zeroed(samples.len(), mom);
    ewm_series(mom, Series::Vals(*samples), alpha, adjust, min_count, out.as_mut_slice());
    Ok(out)
}

/// Exponentially weighted pooling of accumulators with per-step `alpha`.
///
/// # Errors
///
/// [`MomentsError::LengthMismatch`] when `alpha` is not one per
/// accumulator, or [`MomentsError::InvalidDecay`] for an `alpha` outside
/// `[0, 1]`.
pub fn rolling_exp_data<T: MomentFloat>(
    data: &MomentArray<T>,
    alpha: &[T],
    adjust: bool,
    min_count: usize,
) -> Result<MomentArray<T>> {
    check_alpha(alpha, data.len())?;
    let mut out = MomentArray::zeroed(data.len(), data.mom());
    let series = Series::Data(data.as_slice());
    ewm_series(data.mom(), series, alpha, adjust, min_count, out.as_mut_slice());
    Ok(out)
}

/// [`rolling_exp_vals`] with a constant decay, over `nbatch x nsamp`
/// batch-major samples.
///
/// # Errors
///
/// As [`rolling_exp_vals`], with [`MomentsError::InvalidDecay`] coming from
/// `config.decay`, plus [`MomentsError::EmptySampleAxis`] /
/// [`MomentsError::LengthMismatch`] for a length that is not a multiple of
/// `nsamp`.
pub fn ewm_vals_batch<T: MomentFloat>(
    samples: &Samples<'_, T>,
    nsamp: usize,
    mom: Moments,
    config: &EwmConfig,
    policy: Parallel,
) -> Result<MomentArray<T>> {
    let mom = mom.validate()?;
    samples.check_moments(mom)?;
    let alpha = config.alphas::<T>(nsamp)?;
    run_batch(
        "ewm_vals",
        mom,
        Series::Vals(*samples),
        samples.len(),
        nsamp,
        policy,
        |s, dst| ewm_series(mom, s, &alpha, config.adjust, config.min_count, dst),
    )
}

/// [`rolling_exp_data`] with a constant decay, over `nbatch x nsamp`
/// batch-major accumulators.
///
/// # Errors
///
/// [`MomentsError::InvalidDecay`] from `config.decay`, or
/// [`MomentsError::EmptySampleAxis`] / [`MomentsError::LengthMismatch`]
/// when `data.len()` is not a multiple of `nsamp`.
pub fn ewm_data_batch<T: MomentFloat>(
    data: &MomentArray<T>,
    nsamp: usize,
    config: &EwmConfig,
    policy: Parallel,
) -> Result<MomentArray<T>> {
    let mom = data.mom();
    let alpha = config.alphas::<T>(nsamp)?;
    run_batch(
        "ewm_data",
        mom,
        Series::Data(data.as_slice()),
        data.len(),
        nsamp,
        policy,
        |s, dst| ewm_series(mom, s, &alpha, config.adjust, config.min_count, dst),
    )
}
