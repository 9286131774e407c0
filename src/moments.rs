//! Moment shape descriptor.
//!
//! [`Moments`] records how many moments an accumulator tracks and whether it
//! is univariate (a vector of `M + 1` values) or bivariate (an
//! `(M0 + 1) x (M1 + 1)` grid stored row-major). It is validated once, at the
//! call boundary, and then drives every kernel.
//!
//! ## Univariate layout
//!
//! | index | value |
//! |---|---|
//! | 0 | total weight `W` |
//! | 1 | weighted mean |
//! | n >= 2 | `sum w (x - mean)^n / W` |
//!
//! ## Bivariate layout
//!
//! Cell `(i, j)` lives at `i * (M1 + 1) + j`. Cell `(0, 0)` is the weight,
//! `(1, 0)` and `(0, 1)` are the two means, every other cell is the
//! normalised co-moment `sum w (x0 - mean0)^i (x1 - mean1)^j / W`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{MomentsError, Result};
use crate::helpers::MAX_ORDER;

/// Number of tracked moments per variate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Moments {
    /// Moments `0..=M` of a single variate.
    Univariate(usize),
    /// Co-moments `(0..=M0) x (0..=M1)` of two variates.
    Bivariate(usize, usize),
}

/// Whether moments of order `>= 2` are about the mean or about zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MomentsType {
    #[default]
    Central,
    Raw,
}

fn check_order(order: usize) -> Result<usize> {
    if order == 0 || order > MAX_ORDER {
        return Err(MomentsError::InvalidOrder {
            order,
            max: MAX_ORDER,
        });
    }
    Ok(order)
}

impl Moments {
    /// Validated univariate moments of order `order`.
    pub fn univariate(order: usize) -> Result<Self> {
        Ok(Self::Univariate(check_order(order)?))
    }

    /// Validated bivariate moments of orders `(order0, order1)`.
    pub fn bivariate(order0: usize, order1: usize) -> Result<Self> {
        Ok(Self::Bivariate(check_order(order0)?, check_order(order1)?))
    }

    /// Re-validate a descriptor built directly from the enum variants.
    pub fn validate(self) -> Result<Self> {
        match self {
            Self::Univariate(m) => Self::univariate(m),
            Self::Bivariate(m0, m1) => Self::bivariate(m0, m1),
        }
    }

    /// 1 for univariate, 2 for bivariate.
    #[inline]
    pub fn ndim(self) -> usize {
        match self {
            Self::Univariate(_) => 1,
            Self::Bivariate(..) => 2,
        }
    }

    #[inline]
    pub fn is_univariate(self) -> bool {
        matches!(self, Self::Univariate(_))
    }

    /// Extent of the moment axes: `(M + 1, 1)` or `(M0 + 1, M1 + 1)`.
    #[inline]
    pub fn shape(self) -> (usize, usize) {
        match self {
            Self::Univariate(m) => (m + 1, 1),
            Self::Bivariate(m0, m1) => (m0 + 1, m1 + 1),
        }
    }

    /// Number of scalars in one accumulator.
    #[inline]
    pub fn size(self) -> usize {
        let (a, b) = self.shape();
        a * b
    }

    /// Check that a single accumulator slice has the right length.
    pub fn check_len(self, name: &'static str, len: usize) -> Result<()> {
        if len != self.size() {
            return Err(MomentsError::LengthMismatch {
                name,
                expected: self.size(),
                actual: len,
            });
        }
        Ok(())
    }

    /// Check that two descriptors agree.
    pub fn check_same(self, other: Moments) -> Result<()> {
        if self != other {
            return Err(MomentsError::MomentsMismatch {
                left: self,
                right: other,
            });
        }
        Ok(())
    }

    /// Order of a univariate descriptor, or an error naming `operation`.
    pub fn require_univariate(self, operation: &'static str) -> Result<usize> {
        match self {
            Self::Univariate(m) => Ok(m),
            other => Err(MomentsError::WrongMomentsKind {
                operation,
                expected: "univariate",
                actual: other,
            }),
        }
    }
}

impl std::fmt::Display for Moments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Univariate(m) => write!(f, "mom=({})", m),
            Self::Bivariate(m0, m1) => write!(f, "mom=({}, {})", m0, m1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_univariate_shape() {
        let mom = Moments::univariate(3).unwrap();
        assert_eq!(mom.ndim(), 1);
        assert_eq!(mom.shape(), (4, 1));
        assert_eq!(mom.size(), 4);
        assert!(mom.is_univariate());
    }

    #[test]
    fn test_bivariate_shape() {
        let mom = Moments::bivariate(2, 3).unwrap();
        assert_eq!(mom.ndim(), 2);
        assert_eq!(mom.shape(), (3, 4));
        assert_eq!(mom.size(), 12);
        assert!(mom.require_univariate("op").is_err());
    }

    #[test]
    fn test_invalid_orders() {
        assert_eq!(
            Moments::univariate(0),
            Err(MomentsError::InvalidOrder {
                order: 0,
                max: MAX_ORDER
            })
        );
        assert!(Moments::univariate(MAX_ORDER).is_ok());
        assert!(Moments::univariate(MAX_ORDER + 1).is_err());
        assert!(Moments::bivariate(2, 0).is_err());
        assert!(Moments::Univariate(0).validate().is_err());
    }

    #[test]
    fn test_check_len_and_same() {
        let mom = Moments::Univariate(2);
        assert!(mom.check_len("acc", 3).is_ok());
        assert!(mom.check_len("acc", 4).is_err());
        assert!(mom.check_same(Moments::Univariate(2)).is_ok());
        assert!(mom.check_same(Moments::Univariate(3)).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Moments::Univariate(2).to_string(), "mom=(2)");
        assert_eq!(Moments::Bivariate(1, 2).to_string(), "mom=(1, 2)");
    }
}
