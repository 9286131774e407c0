//! Binomial coefficient table.
//!
//! Pascal's triangle up to [`MAX_ORDER`] is built once on first use and then
//! shared read-only by every kernel.

use std::sync::OnceLock;

use crate::float::MomentFloat;
use crate::helpers::{cast, MAX_ORDER};

const WIDTH: usize = MAX_ORDER + 1;

/// Precomputed `C(n, i)` for `0 <= i <= n <= MAX_ORDER`.
pub struct BinomialTable {
    coeffs: [[f64; WIDTH]; WIDTH],
}

impl BinomialTable {
    fn build() -> Self {
        let mut coeffs = [[0.0; WIDTH]; WIDTH];
        for n in 0..WIDTH {
            coeffs[n][0] = 1.0;
            for i in 1..=n {
                coeffs[n][i] = coeffs[n - 1][i - 1] + coeffs[n - 1][i];
            }
        }
        Self { coeffs }
    }

    /// `C(n, i)`; zero when `i > n`.
    ///
    /// # Panics
    /// Panics if `n > MAX_ORDER`. Callers validate moment orders through
    /// [`Moments`](crate::moments::Moments) before reaching the kernels.
    #[inline(always)]
    pub fn get(&self, n: usize, i: usize) -> f64 {
        assert!(
            n <= MAX_ORDER,
            "binomial order {} exceeds MAX_ORDER {}",
            n,
            MAX_ORDER
        );
        if i > n {
            0.0
        } else {
            self.coeffs[n][i]
        }
    }

    /// Largest supported `n`.
    #[inline]
    pub fn max_order(&self) -> usize {
        MAX_ORDER
    }
}

/// Process-wide table, initialised on first call.
pub fn binomial_table() -> &'static BinomialTable {
    static TABLE: OnceLock<BinomialTable> = OnceLock::new();
    TABLE.get_or_init(BinomialTable::build)
}

/// `C(n, i)` converted to the working float type.
#[inline(always)]
pub fn coefficient<T: MomentFloat>(n: usize, i: usize) -> T {
    cast(binomial_table().get(n, i))
}
