//! Normalization modes and their scale factors.

use strided_traits::RealScalar;

use crate::{FftError, Result};

/// How a transform result is scaled.
///
/// Encoded on the public entry points as the integer `inorm`: `0` leaves the
/// result unscaled, `1` multiplies by `1/sqrt(N)` and `2` by `1/N`, where `N`
/// is the product of the lengths of the transformed axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Normalization {
    #[default]
    Unscaled,
    Ortho,
    Full,
}

impl TryFrom<i32> for Normalization {
    type Error = FftError;

    fn try_from(inorm: i32) -> Result<Self> {
        match inorm {
            0 => Ok(Self::Unscaled),
            1 => Ok(Self::Ortho),
            2 => Ok(Self::Full),
            other => Err(FftError::InvalidNormalization(other)),
        }
    }
}

impl From<Normalization> for i32 {
    fn from(mode: Normalization) -> Self {
        match mode {
            Normalization::Unscaled => 0,
            Normalization::Ortho => 1,
            Normalization::Full => 2,
        }
    }
}

impl Normalization {
    /// Scale factor for a transform of total length `n`.
    #[must_use]
    pub fn factor<T: RealScalar>(self, n: usize) -> T {
        let n = n as f64;
        match self {
            Self::Unscaled => T::one(),
            Self::Ortho => T::from_f64_lossy(1.0 / n.sqrt()),
            Self::Full => T::from_f64_lossy(1.0 / n),
        }
    }

    /// Scale factor for the transformed `axes` of an array shaped `dims`.
    #[must_use]
    pub fn factor_for_axes<T: RealScalar>(self, dims: &[usize], axes: &[usize]) -> T {
        let n: usize = axes.iter().map(|&axis| dims[axis]).product();
        self.factor(n)
    }
}

/// Scale factor for `inorm` and a transform of total length `n`.
pub fn norm_fct<T: RealScalar>(inorm: i32, n: usize) -> Result<T> {
    Ok(Normalization::try_from(inorm)?.factor(n))
}

/// Scale factor for `inorm` over the transformed `axes` of an array shaped
/// `dims`.
pub fn norm_fct_shape<T: RealScalar>(inorm: i32, dims: &[usize], axes: &[usize]) -> Result<T> {
    Ok(Normalization::try_from(inorm)?.factor_for_axes(dims, axes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn modes_map_to_expected_factors() {
        assert_eq!(norm_fct::<f64>(0, 64).unwrap(), 1.0);
        assert_relative_eq!(norm_fct::<f64>(1, 64).unwrap(), 0.125);
        assert_relative_eq!(norm_fct::<f64>(2, 64).unwrap(), 1.0 / 64.0);
        assert_relative_eq!(norm_fct::<f32>(2, 8).unwrap(), 0.125f32);
    }

    #[test]
    fn shape_factor_uses_only_transformed_axes() {
        let dims = [4, 8, 3];
        assert_relative_eq!(
            norm_fct_shape::<f64>(2, &dims, &[0, 1]).unwrap(),
            1.0 / 32.0
        );
        assert_relative_eq!(
            norm_fct_shape::<f64>(1, &dims, &[2]).unwrap(),
            1.0 / 3f64.sqrt()
        );
    }

    #[test]
    fn repeated_axes_count_each_occurrence() {
        assert_relative_eq!(
            Normalization::Full.factor_for_axes::<f64>(&[4], &[0, 0]),
            1.0 / 16.0
        );
    }

    #[test]
    fn unknown_modes_are_rejected() {
        assert!(matches!(
            norm_fct::<f64>(3, 8),
            Err(FftError::InvalidNormalization(3))
        ));
        assert!(Normalization::try_from(-1).is_err());
        assert_eq!(i32::from(Normalization::Ortho), 1);
    }
}
