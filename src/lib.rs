//! Fourier and Hartley transforms over arbitrary strided n-dimensional arrays.
//!
//! The crate is a front end: it validates axis lists, normalization modes and
//! output buffers, selects a precision-specific implementation from the
//! input's element type, and hands the work to an [`FftKernel`]. The bundled
//! [`RustFftKernel`] computes each axis pass with `rustfft`.
//!
//! # Core Types
//!
//! - [`NdArray`]: a [`StridedArray`] of one of six element types, tagged by
//!   [`DType`]
//! - [`AxisSet`]: a resolved, in-range axis list
//! - [`Normalization`]: the `inorm` scaling modes
//! - [`FftFrontend`]: the entry points, parameterized by kernel and an
//!   optional [`ExecutionLock`]
//!
//! # Operations
//!
//! - [`c2c`]: complex-to-complex; real input is promoted by conjugate symmetry
//! - [`r2c`] / [`c2r`]: real to one-sided spectrum and back
//! - [`r2r_fftpack`]: real transform in FFTPACK halfcomplex order
//! - [`separable_hartley`], [`genuine_hartley`], [`complex2hartley`]
//! - [`c2c_in_place`], [`r2r_fftpack_in_place`],
//!   [`separable_hartley_in_place`]: the same transforms writing into the input
//!
//! # Example
//!
//! ```rust
//! use num_complex::Complex64;
//! use strided_fft::{c2c, NdArray, StridedArray};
//!
//! let data = StridedArray::<f64>::from_fn_row_major(&[4], |idx| idx[0] as f64);
//! let spectrum = c2c(&NdArray::Float64(data), None, true, 0, None, 1).unwrap();
//! let spectrum = spectrum.as_complex128().unwrap();
//! assert_eq!(spectrum.get(&[0]), Complex64::new(6.0, 0.0));
//! assert_eq!(spectrum.get(&[2]), Complex64::new(-2.0, 0.0));
//! ```

mod array;
pub mod axes;
mod dispatch;
pub mod kernel;
pub mod mirror;
pub mod norm;
pub mod operations;
mod output;
mod threading;
mod transforms;

pub use array::{DType, Double, Extended, LongDouble, NdArray, Precision, PrecisionKind, Single};
pub use axes::{makeaxes, AxisSet};
pub use kernel::{FftFloat, FftKernel, KernelParams, RustFftKernel, Source};
pub use norm::{norm_fct, norm_fct_shape, Normalization};
pub use operations::{operation_info, ElementClass, OperationInfo, OPERATIONS};
pub use threading::{default_thread_count, ExecutionLock, LockRelease, THREADS_ENV};
pub use transforms::{
    c2c, c2c_in_place, c2r, complex2hartley, genuine_hartley, r2c, r2r_fftpack,
    r2r_fftpack_in_place, separable_hartley, separable_hartley_in_place, FftFrontend,
};

pub use strided_view::{StridedArray, StridedError, StridedView, StridedViewMut};

/// Errors raised by transform calls.
#[derive(Debug, thiserror::Error)]
pub enum FftError {
    /// Empty or over-long axis list, or an array without axes.
    #[error("invalid axes: {detail}")]
    InvalidAxes { detail: &'static str },

    /// Axis index outside `[-rank, rank)`.
    #[error("axis {axis} exceeds dimensionality of input ({rank})")]
    AxisOutOfRange { axis: isize, rank: usize },

    #[error("invalid value for inorm: {0} (must be 0, 1 or 2)")]
    InvalidNormalization(i32),

    #[error("{operation}: unsupported data type {dtype}")]
    UnsupportedDType {
        operation: &'static str,
        dtype: DType,
    },

    #[error("unexpected data type for output array: expected {expected}, got {found}")]
    OutputMismatch { expected: DType, found: DType },

    #[error("output shape mismatch: expected {expected:?}, got {found:?}")]
    OutputShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// `lastsize / 2 + 1` disagrees with the input length on the last axis.
    #[error("bad lastsize {lastsize}: needs {expected} input entries on the last axis, got {actual}")]
    InconsistentLastSize {
        lastsize: usize,
        expected: usize,
        actual: usize,
    },

    /// The spectrum walk and the mirror walk cover different element counts.
    #[error("iterator length mismatch: forward walk has {forward} elements, mirror walk {mirror}")]
    IteratorMismatch { forward: usize, mirror: usize },

    #[error("zero-length axis in shape {dims:?}")]
    InvalidShape { dims: Vec<usize> },

    /// Kernel operands whose shapes do not fit together.
    #[error("shape mismatch: {0:?} vs {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    #[error(transparent)]
    Strided(#[from] StridedError),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),
}

/// Result type for transform calls.
pub type Result<T> = std::result::Result<T, FftError>;
