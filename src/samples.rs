//! Validated views over raw `(value, weight)` inputs.
//!
//! A [`Samples`] holds one (univariate) or two (bivariate) value slices and
//! an optional weight slice, all of the same length. Missing weights mean
//! unit weight. For batched operations the slices are laid out batch-major:
//! element `(b, s)` of an `nbatch x nsamp` input lives at `b * nsamp + s`.

use std::ops::Range;

use crate::error::{MomentsError, Result};
use crate::float::MomentFloat;
use crate::moments::Moments;

/// Borrowed sample values with optional weights.
#[derive(Debug, Clone, Copy)]
pub struct Samples<'a, T> {
    x: &'a [T],
    y: Option<&'a [T]>,
    w: Option<&'a [T]>,
}

fn check_same_len(name: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(MomentsError::LengthMismatch {
            name,
            expected,
            actual,
        });
    }
    Ok(())
}

impl<'a, T: MomentFloat> Samples<'a, T> {
    /// Weighted univariate values.
    pub fn new(x: &'a [T], w: &'a [T]) -> Result<Self> {
        check_same_len("weight", x.len(), w.len())?;
        Ok(Self { x, y: None, w: Some(w) })
    }

    /// Unit-weight univariate values.
    pub fn unweighted(x: &'a [T]) -> Self {
        Self { x, y: None, w: None }
    }

    /// Weighted pairs `(x0[i], x1[i])`.
    pub fn bivariate(x0: &'a [T], x1: &'a [T], w: Option<&'a [T]>) -> Result<Self> {
        check_same_len("x1", x0.len(), x1.len())?;
        if let Some(w) = w {
            check_same_len("weight", x0.len(), w.len())?;
        }
        Ok(Self { x: x0, y: Some(x1), w })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    #[inline]
    pub fn is_bivariate(&self) -> bool {
        self.y.is_some()
    }

    /// First variate.
    #[inline]
    pub fn x(&self) -> &'a [T] {
        self.x
    }

    /// Second variate, if any.
    #[inline]
    pub fn y(&self) -> Option<&'a [T]> {
        self.y
    }

    /// Weight of sample `i` (one when unweighted).
    #[inline(always)]
    pub fn weight(&self, i: usize) -> T {
        self.w.map_or_else(T::one, |w| w[i])
    }

    /// `(x, y, w)` of sample `i`; `y` is zero for univariate samples.
    #[inline(always)]
    pub fn get(&self, i: usize) -> (T, T, T) {
        let y = self.y.map_or_else(T::zero, |y| y[i]);
        (self.x[i], y, self.weight(i))
    }

    /// Contiguous sub-range of samples.
    pub fn slice(&self, range: Range<usize>) -> Samples<'a, T> {
        Samples {
            x: &self.x[range.clone()],
            y: self.y.map(|y| &y[range.clone()]),
            w: self.w.map(|w| &w[range]),
        }
    }

    /// Check that these samples can feed accumulators of shape `mom`.
    pub fn check_moments(&self, mom: Moments) -> Result<()> {
        match (mom, self.is_bivariate()) {
            (Moments::Univariate(_), false) | (Moments::Bivariate(..), true) => Ok(()),
            (Moments::Univariate(_), true) => Err(MomentsError::WrongMomentsKind {
                operation: "bivariate samples",
                expected: "bivariate",
                actual: mom,
            }),
            (Moments::Bivariate(..), false) => Err(MomentsError::WrongMomentsKind {
                operation: "univariate samples",
                expected: "univariate",
                actual: mom,
            }),
        }
    }

    /// Check that the samples split into `nbatch` rows of `nsamp`.
    pub fn check_batch(&self, nbatch: usize, nsamp: usize) -> Result<()> {
        check_same_len("samples", nbatch * nsamp, self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_get() {
        let x = [1.0, 2.0, 3.0];
        let w = [0.5, 1.0, 2.0];
        let s = Samples::new(&x, &w).unwrap();
        assert_eq!(s.len(), 3);
        assert!(!s.is_bivariate());
        assert_eq!(s.get(2), (3.0, 0.0, 2.0));
    }

    #[test]
    fn test_length_mismatch() {
        let x = [1.0, 2.0, 3.0];
        let w = [1.0];
        assert!(matches!(
            Samples::new(&x, &w),
            Err(MomentsError::LengthMismatch { name: "weight", .. })
        ));
        assert!(Samples::bivariate(&x, &w, None).is_err());
    }

    #[test]
    fn test_unweighted_and_slice() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let s = Samples::unweighted(&x);
        assert_eq!(s.weight(3), 1.0);
        let sub = s.slice(1..3);
        assert_eq!(sub.x(), &[2.0, 3.0]);
    }

    #[test]
    fn test_bivariate_checks() {
        let x = [1.0, 2.0];
        let y = [3.0, 4.0];
        let s = Samples::bivariate(&x, &y, None).unwrap();
        assert_eq!(s.get(1), (2.0, 4.0, 1.0));
        assert!(s.check_moments(Moments::Bivariate(1, 1)).is_ok());
        assert!(s.check_moments(Moments::Univariate(2)).is_err());
        assert!(Samples::unweighted(&x)
            .check_moments(Moments::Bivariate(1, 1))
            .is_err());
    }

    #[test]
    fn test_check_batch() {
        let x = [0.0; 6];
        let s = Samples::unweighted(&x);
        assert!(s.check_batch(2, 3).is_ok());
        assert!(s.check_batch(4, 2).is_err());
    }
}
