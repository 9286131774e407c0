//! Floating-point element types.
//!
//! All kernels are generic over [`MomentFloat`], which is implemented for
//! `f32` and `f64` only. The trait is sealed: other numeric types have to be
//! converted by the caller before reaching this crate.

use num_traits::{Float, FromPrimitive};
use std::fmt::{Debug, Display};

mod private {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// Floating-point type usable as accumulator element.
pub trait MomentFloat:
    Float
    + FromPrimitive
    + Default
    + Debug
    + Display
    + Send
    + Sync
    + nalgebra::Scalar
    + private::Sealed
    + 'static
{
    /// Machine epsilon of the type, as `f64`.
    const EPSILON_F64: f64;
}

impl MomentFloat for f32 {
    const EPSILON_F64: f64 = f32::EPSILON as f64;
}

impl MomentFloat for f64 {
    const EPSILON_F64: f64 = f64::EPSILON;
}
