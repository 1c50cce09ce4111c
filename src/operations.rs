//! Static registry of the public transform entry points.
//!
//! The front end consults these entries to decide which element types an
//! operation admits before dispatching on precision.

use crate::{DType, FftError, PrecisionKind, Result};

/// Element class an operation consumes or produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementClass {
    Real,
    Complex,
    /// Real or complex input; real input is promoted to complex.
    Any,
}

impl ElementClass {
    #[must_use]
    pub fn admits(self, dtype: DType) -> bool {
        match self {
            Self::Real => !dtype.is_complex(),
            Self::Complex => dtype.is_complex(),
            Self::Any => true,
        }
    }
}

/// Description of one entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationInfo {
    pub name: &'static str,
    pub input: ElementClass,
    pub output: ElementClass,
    /// Whether an `_in_place` variant exists.
    pub in_place: bool,
    pub summary: &'static str,
}

impl OperationInfo {
    /// Precision of `dtype`, or [`FftError::UnsupportedDType`] if this
    /// operation does not take that element class.
    pub fn admit(&self, dtype: DType) -> Result<PrecisionKind> {
        if self.input.admits(dtype) {
            Ok(dtype.precision())
        } else {
            Err(FftError::UnsupportedDType {
                operation: self.name,
                dtype,
            })
        }
    }

    /// Dtype of the array this operation returns at precision `kind`.
    #[must_use]
    pub fn output_dtype(&self, kind: PrecisionKind) -> DType {
        DType::of(kind, self.output != ElementClass::Real)
    }
}

pub const C2C: OperationInfo = OperationInfo {
    name: "c2c",
    input: ElementClass::Any,
    output: ElementClass::Complex,
    in_place: true,
    summary: "complex-to-complex transform over the given axes",
};

pub const R2C: OperationInfo = OperationInfo {
    name: "r2c",
    input: ElementClass::Real,
    output: ElementClass::Complex,
    in_place: false,
    summary: "real-to-complex transform keeping n/2+1 entries on the last axis",
};

pub const C2R: OperationInfo = OperationInfo {
    name: "c2r",
    input: ElementClass::Complex,
    output: ElementClass::Real,
    in_place: false,
    summary: "complex-to-real transform of a half spectrum",
};

pub const R2R_FFTPACK: OperationInfo = OperationInfo {
    name: "r2r_fftpack",
    input: ElementClass::Real,
    output: ElementClass::Real,
    in_place: true,
    summary: "real transform in FFTPACK halfcomplex storage",
};

pub const SEPARABLE_HARTLEY: OperationInfo = OperationInfo {
    name: "separable_hartley",
    input: ElementClass::Real,
    output: ElementClass::Real,
    in_place: true,
    summary: "product of one-dimensional Hartley transforms",
};

pub const GENUINE_HARTLEY: OperationInfo = OperationInfo {
    name: "genuine_hartley",
    input: ElementClass::Real,
    output: ElementClass::Real,
    in_place: false,
    summary: "multidimensional Hartley transform",
};

pub const COMPLEX2HARTLEY: OperationInfo = OperationInfo {
    name: "complex2hartley",
    input: ElementClass::Complex,
    output: ElementClass::Real,
    in_place: false,
    summary: "fold a half spectrum into a Hartley transform",
};

/// Every entry point, in registration order.
pub static OPERATIONS: &[OperationInfo] = &[
    C2C,
    R2C,
    C2R,
    R2R_FFTPACK,
    SEPARABLE_HARTLEY,
    GENUINE_HARTLEY,
    COMPLEX2HARTLEY,
];

/// Look up an entry point by name.
#[must_use]
pub fn operation_info(name: &str) -> Option<&'static OperationInfo> {
    OPERATIONS.iter().find(|op| op.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name() {
        let op = operation_info("c2r").unwrap();
        assert_eq!(op.input, ElementClass::Complex);
        assert_eq!(op.output, ElementClass::Real);
        assert!(operation_info("dct").is_none());
    }

    #[test]
    fn output_dtype_follows_class_and_precision() {
        assert_eq!(C2C.output_dtype(PrecisionKind::Single), DType::Complex64);
        assert_eq!(C2R.output_dtype(PrecisionKind::Extended), DType::LongFloat);
        for op in OPERATIONS {
            for kind in [PrecisionKind::Single, PrecisionKind::Double, PrecisionKind::Extended] {
                let dtype = op.output_dtype(kind);
                assert_eq!(dtype.precision(), kind);
                assert!(op.output.admits(dtype));
            }
        }
    }

    #[test]
    fn names_are_unique() {
        for (i, a) in OPERATIONS.iter().enumerate() {
            for b in &OPERATIONS[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn admit_checks_element_class() {
        assert_eq!(C2C.admit(DType::Float32).unwrap(), PrecisionKind::Single);
        assert_eq!(
            R2C.admit(DType::LongFloat).unwrap(),
            PrecisionKind::Extended
        );
        assert!(matches!(
            R2C.admit(DType::Complex128),
            Err(FftError::UnsupportedDType {
                operation: "r2c",
                ..
            })
        ));
        assert!(C2R.admit(DType::Float64).is_err());
    }

    #[test]
    fn in_place_flags() {
        let in_place: Vec<&str> = OPERATIONS
            .iter()
            .filter(|op| op.in_place)
            .map(|op| op.name)
            .collect();
        assert_eq!(in_place, ["c2c", "r2r_fftpack", "separable_hartley"]);
    }
}
