//! Runtime-tagged arrays and the precision markers the dispatcher selects.
//!
//! [`NdArray`] is the closed set of element types a transform accepts. The
//! dispatcher reads its [`DType`] tag, picks one of the [`Precision`] markers
//! ([`Single`], [`Double`], [`Extended`]) and calls the implementation
//! monomorphized for that marker.

use std::fmt::{Display, Formatter};

use num_complex::Complex;
use strided_view::StridedArray;

use crate::kernel::FftFloat;

/// Storage type of the extended precision.
///
/// Rust has no portable floating type wider than `f64`, so the extended
/// precision keeps its own tag but is computed at double width.
pub type LongDouble = f64;

/// Element type tag of an [`NdArray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    Float32,
    Float64,
    LongFloat,
    /// Two `f32` components.
    Complex64,
    /// Two `f64` components.
    Complex128,
    LongComplex,
}

/// The three supported floating widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrecisionKind {
    Single,
    Double,
    Extended,
}

impl DType {
    /// Real or complex tag of precision `kind`.
    #[must_use]
    pub fn of(kind: PrecisionKind, complex: bool) -> Self {
        match (kind, complex) {
            (PrecisionKind::Single, false) => Self::Float32,
            (PrecisionKind::Double, false) => Self::Float64,
            (PrecisionKind::Extended, false) => Self::LongFloat,
            (PrecisionKind::Single, true) => Self::Complex64,
            (PrecisionKind::Double, true) => Self::Complex128,
            (PrecisionKind::Extended, true) => Self::LongComplex,
        }
    }

    #[must_use]
    pub fn is_complex(self) -> bool {
        matches!(self, Self::Complex64 | Self::Complex128 | Self::LongComplex)
    }

    #[must_use]
    pub fn precision(self) -> PrecisionKind {
        match self {
            Self::Float32 | Self::Complex64 => PrecisionKind::Single,
            Self::Float64 | Self::Complex128 => PrecisionKind::Double,
            Self::LongFloat | Self::LongComplex => PrecisionKind::Extended,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::LongFloat => "longfloat",
            Self::Complex64 => "complex64",
            Self::Complex128 => "complex128",
            Self::LongComplex => "longcomplex",
        }
    }
}

impl Display for DType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A strided array of any supported element type.
#[derive(Debug, Clone)]
pub enum NdArray {
    Float32(StridedArray<f32>),
    Float64(StridedArray<f64>),
    LongFloat(StridedArray<LongDouble>),
    Complex64(StridedArray<Complex<f32>>),
    Complex128(StridedArray<Complex<f64>>),
    LongComplex(StridedArray<Complex<LongDouble>>),
}

macro_rules! with_array {
    ($array:expr, $a:ident => $body:expr) => {
        match $array {
            NdArray::Float32($a) => $body,
            NdArray::Float64($a) => $body,
            NdArray::LongFloat($a) => $body,
            NdArray::Complex64($a) => $body,
            NdArray::Complex128($a) => $body,
            NdArray::LongComplex($a) => $body,
        }
    };
}

macro_rules! variant_accessors {
    ($($variant:ident: $elem:ty => $as_ref:ident, $into:ident;)+) => {
        impl NdArray {
            $(
                #[must_use]
                pub fn $as_ref(&self) -> Option<&StridedArray<$elem>> {
                    match self {
                        Self::$variant(a) => Some(a),
                        _ => None,
                    }
                }

                #[must_use]
                pub fn $into(self) -> Option<StridedArray<$elem>> {
                    match self {
                        Self::$variant(a) => Some(a),
                        _ => None,
                    }
                }
            )+
        }
    };
}

variant_accessors! {
    Float32: f32 => as_float32, into_float32;
    Float64: f64 => as_float64, into_float64;
    LongFloat: LongDouble => as_long_float, into_long_float;
    Complex64: Complex<f32> => as_complex64, into_complex64;
    Complex128: Complex<f64> => as_complex128, into_complex128;
    LongComplex: Complex<LongDouble> => as_long_complex, into_long_complex;
}

impl NdArray {
    #[must_use]
    pub fn dtype(&self) -> DType {
        match self {
            Self::Float32(_) => DType::Float32,
            Self::Float64(_) => DType::Float64,
            Self::LongFloat(_) => DType::LongFloat,
            Self::Complex64(_) => DType::Complex64,
            Self::Complex128(_) => DType::Complex128,
            Self::LongComplex(_) => DType::LongComplex,
        }
    }

    #[must_use]
    pub fn dims(&self) -> &[usize] {
        with_array!(self, a => a.dims())
    }

    #[must_use]
    pub fn strides(&self) -> &[isize] {
        with_array!(self, a => a.strides())
    }

    #[must_use]
    pub fn ndim(&self) -> usize {
        self.dims().len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.dims().iter().product()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dims().contains(&0)
    }
}

impl From<StridedArray<f32>> for NdArray {
    fn from(array: StridedArray<f32>) -> Self {
        Self::Float32(array)
    }
}

impl From<StridedArray<f64>> for NdArray {
    fn from(array: StridedArray<f64>) -> Self {
        Self::Float64(array)
    }
}

impl From<StridedArray<Complex<f32>>> for NdArray {
    fn from(array: StridedArray<Complex<f32>>) -> Self {
        Self::Complex64(array)
    }
}

impl From<StridedArray<Complex<f64>>> for NdArray {
    fn from(array: StridedArray<Complex<f64>>) -> Self {
        Self::Complex128(array)
    }
}

/// Compile-time precision marker.
///
/// Each marker binds a real scalar type to the pair of [`DType`] tags that
/// carry it, so the extended precision stays distinct from double even
/// though both compute in `f64`.
pub trait Precision: 'static {
    type Real: FftFloat;

    const KIND: PrecisionKind;
    const REAL: DType;
    const COMPLEX: DType;

    fn real(array: &NdArray) -> Option<&StridedArray<Self::Real>>;
    fn real_mut(array: &mut NdArray) -> Option<&mut StridedArray<Self::Real>>;
    fn complex(array: &NdArray) -> Option<&StridedArray<Complex<Self::Real>>>;
    fn complex_mut(array: &mut NdArray) -> Option<&mut StridedArray<Complex<Self::Real>>>;

    /// Move the real array out, handing the value back on a tag mismatch.
    fn take_real(array: NdArray) -> Result<StridedArray<Self::Real>, NdArray>;
    /// Move the complex array out, handing the value back on a tag mismatch.
    fn take_complex(array: NdArray) -> Result<StridedArray<Complex<Self::Real>>, NdArray>;

    fn wrap_real(array: StridedArray<Self::Real>) -> NdArray;
    fn wrap_complex(array: StridedArray<Complex<Self::Real>>) -> NdArray;
}

/// `f32` / `complex64`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Single;

/// `f64` / `complex128`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Double;

/// `longfloat` / `longcomplex`, stored as [`LongDouble`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Extended;

macro_rules! impl_precision {
    ($marker:ident, $real:ty, $kind:ident, $real_tag:ident, $complex_tag:ident) => {
        impl Precision for $marker {
            type Real = $real;

            const KIND: PrecisionKind = PrecisionKind::$kind;
            const REAL: DType = DType::$real_tag;
            const COMPLEX: DType = DType::$complex_tag;

            fn real(array: &NdArray) -> Option<&StridedArray<$real>> {
                match array {
                    NdArray::$real_tag(a) => Some(a),
                    _ => None,
                }
            }

            fn real_mut(array: &mut NdArray) -> Option<&mut StridedArray<$real>> {
                match array {
                    NdArray::$real_tag(a) => Some(a),
                    _ => None,
                }
            }

            fn complex(array: &NdArray) -> Option<&StridedArray<Complex<$real>>> {
                match array {
                    NdArray::$complex_tag(a) => Some(a),
                    _ => None,
                }
            }

            fn complex_mut(array: &mut NdArray) -> Option<&mut StridedArray<Complex<$real>>> {
                match array {
                    NdArray::$complex_tag(a) => Some(a),
                    _ => None,
                }
            }

            fn take_real(array: NdArray) -> Result<StridedArray<$real>, NdArray> {
                match array {
                    NdArray::$real_tag(a) => Ok(a),
                    other => Err(other),
                }
            }

            fn take_complex(array: NdArray) -> Result<StridedArray<Complex<$real>>, NdArray> {
                match array {
                    NdArray::$complex_tag(a) => Ok(a),
                    other => Err(other),
                }
            }

            fn wrap_real(array: StridedArray<$real>) -> NdArray {
                NdArray::$real_tag(array)
            }

            fn wrap_complex(array: StridedArray<Complex<$real>>) -> NdArray {
                NdArray::$complex_tag(array)
            }
        }
    };
}

impl_precision!(Single, f32, Single, Float32, Complex64);
impl_precision!(Double, f64, Double, Float64, Complex128);
impl_precision!(Extended, LongDouble, Extended, LongFloat, LongComplex);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dtype_tags_classify_precision_and_kind() {
        assert!(DType::Complex64.is_complex());
        assert!(!DType::LongFloat.is_complex());
        assert_eq!(DType::Complex64.precision(), PrecisionKind::Single);
        assert_eq!(DType::LongComplex.precision(), PrecisionKind::Extended);
        assert_eq!(DType::Float64.to_string(), "float64");
    }

    #[test]
    fn extended_precision_keeps_its_own_tag() {
        let a = NdArray::LongFloat(StridedArray::row_major(&[2, 3]));
        assert_eq!(a.dtype(), DType::LongFloat);
        assert!(Double::real(&a).is_none());
        assert!(Extended::real(&a).is_some());
        assert_eq!(Extended::COMPLEX, DType::LongComplex);
    }

    #[test]
    fn take_returns_array_on_mismatch() {
        let a: NdArray = StridedArray::<f32>::row_major(&[4]).into();
        let back = Single::take_complex(a).unwrap_err();
        assert_eq!(back.dtype(), DType::Float32);
        assert_eq!(Single::take_real(back).unwrap().dims(), &[4]);
    }

    #[test]
    fn shape_accessors_delegate_to_variant() {
        let a: NdArray = StridedArray::<Complex<f64>>::col_major(&[2, 5]).into();
        assert_eq!(a.dims(), &[2, 5]);
        assert_eq!(a.strides(), &[1, 2]);
        assert_eq!(a.ndim(), 2);
        assert_eq!(a.len(), 10);
        assert!(a.as_complex128().is_some());
        assert!(a.as_complex64().is_none());
    }
}
