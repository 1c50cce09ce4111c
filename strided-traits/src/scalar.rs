//! Scalar type bounds for strided transforms.

use num_traits::{Float, FloatConst};

/// Bound shared by every real scalar a transform can run in.
///
/// Complex elements are `num_complex::Complex<T>` over a `RealScalar` `T`.
/// Conversions from the widest precision (`f64`) go through
/// [`RealScalar::from_f64_lossy`], which narrows without failing.
pub trait RealScalar:
    Float + FloatConst + Default + std::fmt::Debug + Send + Sync + 'static
{
    /// Narrow an `f64` into this scalar type.
    fn from_f64_lossy(value: f64) -> Self;
}

impl RealScalar for f32 {
    #[inline]
    fn from_f64_lossy(value: f64) -> Self {
        value as f32
    }
}

impl RealScalar for f64 {
    #[inline]
    fn from_f64_lossy(value: f64) -> Self {
        value
    }
}
