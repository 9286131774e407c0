//! Flat container for a batch of accumulators.
//!
//! [`MomentArray`] carries the moment shape alongside a flat `Vec<T>`.
//! All non-moment axes are flattened into one batch index; accumulator `i`
//! occupies the contiguous range `i * size .. (i + 1) * size`, so each one
//! can be handed to a worker as an exclusive `&mut [T]`.

use nalgebra::DMatrix;

use crate::error::{MomentsError, Result};
use crate::float::MomentFloat;
use crate::helpers::{fill_nan, fill_zero};
use crate::moments::Moments;

/// Batch of accumulators with a shared [`Moments`] shape.
///
/// # Examples
///
/// ```
/// use central_moments::matrix::MomentArray;
/// use central_moments::moments::Moments;
///
/// let mom = Moments::univariate(2).unwrap();
/// let arr = MomentArray::from_vec(vec![1.0, 2.0, 0.0, 3.0, 1.0, 0.5], mom).unwrap();
/// assert_eq!(arr.len(), 2);
/// assert_eq!(&arr[1], &[3.0, 1.0, 0.5]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MomentArray<T> {
    data: Vec<T>,
    len: usize,
    mom: Moments,
}

impl<T: MomentFloat> MomentArray<T> {
    /// Wrap flat data holding whole accumulators of shape `mom`.
    pub fn from_vec(data: Vec<T>, mom: Moments) -> Result<Self> {
        let mom = mom.validate()?;
        let size = mom.size();
        if data.len() % size != 0 {
            return Err(MomentsError::RaggedBuffer {
                len: data.len(),
                size,
            });
        }
        Ok(Self {
            len: data.len() / size,
            data,
            mom,
        })
    }

    /// Copy from a borrowed slice.
    pub fn from_slice(data: &[T], mom: Moments) -> Result<Self> {
        Self::from_vec(data.to_vec(), mom)
    }

    /// `len` zero accumulators.
    ///
    /// # Errors
    ///
    /// Returns [`MomentsError::InvalidOrder`] when an order of `mom` is zero
    /// or exceeds [`MAX_ORDER`](crate::helpers::MAX_ORDER).
    pub fn zeros(len: usize, mom: Moments) -> Result<Self> {
        Ok(Self::zeroed(len, mom.validate()?))
    }

    /// `len` NaN-filled (not-yet-valid) accumulators.
    ///
    /// # Errors
    ///
    /// Same as [`MomentArray::zeros`].
    pub fn nan(len: usize, mom: Moments) -> Result<Self> {
        let mut out = Self::zeros(len, mom)?;
        fill_nan(&mut out.data);
        Ok(out)
    }

    /// Zeros for a `mom` taken from an existing array or already validated.
    pub(crate) fn zeroed(len: usize, mom: Moments) -> Self {
        debug_assert!(mom.validate().is_ok(), "unvalidated moments {}", mom);
        Self {
            data: vec![T::zero(); len * mom.size()],
            len,
            mom,
        }
    }

    /// Number of accumulators.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn mom(&self) -> Moments {
        self.mom
    }

    /// Scalars per accumulator.
    #[inline]
    pub fn mom_size(&self) -> usize {
        self.mom.size()
    }

    /// Accumulator `i`, or `None` when out of range.
    #[inline]
    pub fn get(&self, i: usize) -> Option<&[T]> {
        if i < self.len {
            Some(&self[i])
        } else {
            None
        }
    }

    /// Iterate over accumulators.
    pub fn iter(&self) -> std::slice::ChunksExact<'_, T> {
        self.data.chunks_exact(self.mom.size())
    }

    /// Iterate mutably over accumulators.
    pub fn iter_mut(&mut self) -> std::slice::ChunksExactMut<'_, T> {
        let size = self.mom.size();
        self.data.chunks_exact_mut(size)
    }

    /// Accumulators `start..end` as one flat slice.
    pub fn rows(&self, start: usize, end: usize) -> &[T] {
        let size = self.mom.size();
        &self.data[start * size..end * size]
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Reset every accumulator to zero.
    pub fn fill_zero(&mut self) {
        fill_zero(&mut self.data);
    }

    /// Check that `other` has the same moment shape.
    pub fn check_moments(&self, other: &MomentArray<T>) -> Result<()> {
        self.mom.check_same(other.mom)
    }

    /// Weight of every accumulator.
    pub fn weights(&self) -> Vec<T> {
        self.iter().map(|acc| acc[0]).collect()
    }

    /// Batch x moments matrix (one row per accumulator).
    pub fn to_dmatrix(&self) -> DMatrix<T> {
        DMatrix::from_row_slice(self.len, self.mom.size(), &self.data)
    }

    /// Build from a batch x moments matrix.
    pub fn from_dmatrix(mat: &DMatrix<T>, mom: Moments) -> Result<Self> {
        mom.check_len("columns", mat.ncols())?;
        // nalgebra is column-major; the transpose's storage is our row-major order
        Self::from_vec(mat.transpose().as_slice().to_vec(), mom)
    }
}

impl<T: MomentFloat> std::ops::Index<usize> for MomentArray<T> {
    type Output = [T];

    #[inline]
    fn index(&self, i: usize) -> &[T] {
        debug_assert!(
            i < self.len,
            "MomentArray index {} out of bounds for {} accumulators",
            i,
            self.len
        );
        let size = self.mom.size();
        &self.data[i * size..(i + 1) * size]
    }
}

impl<T: MomentFloat> std::ops::IndexMut<usize> for MomentArray<T> {
    #[inline]
    fn index_mut(&mut self, i: usize) -> &mut [T] {
        debug_assert!(
            i < self.len,
            "MomentArray index {} out of bounds for {} accumulators",
            i,
            self.len
        );
        let size = self.mom.size();
        &mut self.data[i * size..(i + 1) * size]
    }
}

impl<T> std::fmt::Display for MomentArray<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MomentArray({} x {})", self.len, self.mom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_3x3() -> MomentArray<f64> {
        let data = vec![
            1.0, 2.0, 0.5, // acc 0
            2.0, 3.0, 1.0, // acc 1
            4.0, -1.0, 2.0, // acc 2
        ];
        MomentArray::from_vec(data, Moments::Univariate(2)).unwrap()
    }

    #[test]
    fn test_from_vec_valid() {
        let arr = sample_3x3();
        assert_eq!(arr.len(), 3);
        assert_eq!(arr.mom_size(), 3);
        assert!(!arr.is_empty());
    }

    #[test]
    fn test_from_vec_invalid() {
        assert!(matches!(
            MomentArray::from_vec(vec![1.0, 2.0], Moments::Univariate(2)),
            Err(MomentsError::RaggedBuffer { len: 2, size: 3 })
        ));
        assert!(MomentArray::from_vec(vec![1.0, 2.0], Moments::Univariate(0)).is_err());
    }

    #[test]
    fn test_index_and_get() {
        let mut arr = sample_3x3();
        assert_eq!(&arr[0], &[1.0, 2.0, 0.5]);
        assert_eq!(arr.get(2), Some(&[4.0, -1.0, 2.0][..]));
        assert_eq!(arr.get(3), None);
        arr[1][2] = 9.0;
        assert_eq!(arr.as_slice()[5], 9.0);
    }

    #[test]
    fn test_iter_and_weights() {
        let arr = sample_3x3();
        assert_eq!(arr.iter().count(), 3);
        assert_eq!(arr.weights(), vec![1.0, 2.0, 4.0]);
        assert_eq!(arr.rows(1, 3).len(), 6);
    }

    #[test]
    fn test_zeros_nan_fill() {
        let mom = Moments::Bivariate(1, 2);
        let mut arr = MomentArray::<f32>::nan(2, mom).unwrap();
        assert_eq!(arr.as_slice().len(), 12);
        assert!(arr.as_slice().iter().all(|v| v.is_nan()));
        arr.fill_zero();
        assert_eq!(arr, MomentArray::zeros(2, mom).unwrap());
    }

    #[test]
    fn test_constructors_reject_invalid_order() {
        for mom in [Moments::Univariate(0), Moments::Univariate(25), Moments::Bivariate(2, 0)] {
            assert!(matches!(
                MomentArray::<f64>::zeros(3, mom),
                Err(MomentsError::InvalidOrder { .. })
            ));
            assert!(matches!(
                MomentArray::<f64>::nan(3, mom),
                Err(MomentsError::InvalidOrder { .. })
            ));
        }
        let wide = DMatrix::<f64>::zeros(2, 26);
        assert!(matches!(
            MomentArray::from_dmatrix(&wide, Moments::Univariate(25)),
            Err(MomentsError::InvalidOrder { .. })
        ));
    }

    #[test]
    fn test_nalgebra_roundtrip() {
        let arr = sample_3x3();
        let mat = arr.to_dmatrix();
        assert_eq!(mat.shape(), (3, 3));
        assert_eq!(mat[(2, 1)], -1.0);
        let back = MomentArray::from_dmatrix(&mat, Moments::Univariate(2)).unwrap();
        assert_eq!(arr, back);
        assert!(MomentArray::from_dmatrix(&mat, Moments::Univariate(3)).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(sample_3x3().to_string(), "MomentArray(3 x mom=(2))");
    }

    #[test]
    fn test_check_moments() {
        let a = sample_3x3();
        let b = MomentArray::<f64>::zeros(1, Moments::Univariate(3)).unwrap();
        assert!(a.check_moments(&a).is_ok());
        assert!(a.check_moments(&b).is_err());
    }
}
