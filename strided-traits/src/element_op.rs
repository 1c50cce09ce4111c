//! Element operations.
//!
//! Spectra of real input are Hermitian: the value at a mirrored position is
//! the conjugate of the stored one. [`Conj`] is the operation every mirrored
//! write goes through.

use num_complex::Complex;
use num_traits::Num;

/// Element types that can be conjugated. Real types conjugate to themselves.
pub trait ElementOpApply: Copy {
    #[inline(always)]
    fn conj(self) -> Self {
        self
    }
}

impl ElementOpApply for f32 {}
impl ElementOpApply for f64 {}

impl<T: Num + Copy + std::ops::Neg<Output = T>> ElementOpApply for Complex<T> {
    #[inline(always)]
    fn conj(self) -> Self {
        Complex::new(self.re, -self.im)
    }
}

/// A stateless map from `T` to `T`.
pub trait ElementOp<T>: Copy + Default + 'static {
    fn apply(value: T) -> T;
}

/// `x -> conj(x)`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Conj;

impl<T: ElementOpApply> ElementOp<T> for Conj {
    #[inline(always)]
    fn apply(value: T) -> T {
        value.conj()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::{Complex32, Complex64};

    #[test]
    fn conj_flips_imaginary_part() {
        assert_eq!(
            Conj::apply(Complex32::new(3.0, 4.0)),
            Complex32::new(3.0, -4.0)
        );
    }

    #[test]
    fn conj_of_real_is_noop() {
        assert_eq!(<Conj as ElementOp<f64>>::apply(-2.5), -2.5);
        assert_eq!(<Conj as ElementOp<f32>>::apply(1.5), 1.5);
    }

    #[test]
    fn conj_is_an_involution() {
        let x = Complex64::new(1.0, -7.0);
        assert_eq!(Conj::apply(Conj::apply(x)), x);
    }
}
