//! Public transform entry points.
//!
//! [`FftFrontend`] validates arguments, resolves the output buffer and routes
//! each call to the implementation for the input's precision. The free
//! functions at the bottom of this module use a default front end with the
//! bundled [`RustFftKernel`] and no execution lock.

use std::sync::Arc;

use strided_view::StridedError;

use crate::dispatch::{self, validate_dims, TransformRequest};
use crate::operations::{
    OperationInfo, C2C, C2R, COMPLEX2HARTLEY, GENUINE_HARTLEY, R2C, R2R_FFTPACK,
    SEPARABLE_HARTLEY,
};
use crate::threading::ExecutionLock;
use crate::{
    AxisSet, Double, Extended, FftError, FftKernel, NdArray, PrecisionKind, Result,
    RustFftKernel, Single,
};

macro_rules! dispatch {
    ($kind:expr, $func:ident, ($($arg:expr),* $(,)?)) => {
        match $kind {
            PrecisionKind::Single => dispatch::$func::<Single, K>($($arg),*),
            PrecisionKind::Double => dispatch::$func::<Double, K>($($arg),*),
            PrecisionKind::Extended => dispatch::$func::<Extended, K>($($arg),*),
        }
    };
}

/// Transform front end over a kernel `K`.
///
/// Stateless between calls; the only configuration is the kernel and an
/// optional [`ExecutionLock`] released while the kernel runs.
pub struct FftFrontend<K = RustFftKernel> {
    kernel: K,
    lock: Option<Arc<dyn ExecutionLock>>,
}

impl Default for FftFrontend<RustFftKernel> {
    fn default() -> Self {
        Self::new(RustFftKernel)
    }
}

impl<K: std::fmt::Debug> std::fmt::Debug for FftFrontend<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FftFrontend")
            .field("kernel", &self.kernel)
            .field("execution_lock", &self.lock.is_some())
            .finish()
    }
}

fn require_complex(operation: &'static str, a: &NdArray) -> Result<PrecisionKind> {
    let dtype = a.dtype();
    if dtype.is_complex() {
        Ok(dtype.precision())
    } else {
        Err(FftError::UnsupportedDType { operation, dtype })
    }
}

fn require_real(operation: &'static str, a: &NdArray) -> Result<PrecisionKind> {
    let dtype = a.dtype();
    if dtype.is_complex() {
        Err(FftError::UnsupportedDType { operation, dtype })
    } else {
        Ok(dtype.precision())
    }
}

impl<K: FftKernel> FftFrontend<K> {
    pub fn new(kernel: K) -> Self {
        Self { kernel, lock: None }
    }

    /// Release `lock` around every kernel call and mirror pass.
    #[must_use]
    pub fn with_execution_lock(mut self, lock: Arc<dyn ExecutionLock>) -> Self {
        self.lock = Some(lock);
        self
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    fn lock(&self) -> Option<&dyn ExecutionLock> {
        self.lock.as_deref()
    }

    fn request(
        &self,
        op: &OperationInfo,
        a: &NdArray,
        axes: Option<&[isize]>,
        forward: bool,
        inorm: i32,
        nthreads: usize,
    ) -> Result<(PrecisionKind, TransformRequest)> {
        let kind = op.admit(a.dtype())?;
        let req = TransformRequest::new(op, a, axes, forward, inorm, nthreads)?;
        Ok((kind, req))
    }

    /// Complex-to-complex transform over `axes` (all axes when `None`).
    ///
    /// Real input is transformed as if its imaginary part were zero; the
    /// result is always complex with the input's shape.
    pub fn c2c(
        &self,
        a: &NdArray,
        axes: Option<&[isize]>,
        forward: bool,
        inorm: i32,
        out: Option<NdArray>,
        nthreads: usize,
    ) -> Result<NdArray> {
        let (kind, req) = self.request(&C2C, a, axes, forward, inorm, nthreads)?;
        if a.dtype().is_complex() {
            dispatch!(kind, c2c, (&self.kernel, self.lock(), &C2C, a, out, &req))
        } else {
            dispatch!(
                kind,
                c2c_sym,
                (&self.kernel, self.lock(), &C2C, a, out, &req)
            )
        }
    }

    /// Real-to-complex transform. The last entry of `axes` shrinks to
    /// `n/2 + 1` in the output.
    pub fn r2c(
        &self,
        a: &NdArray,
        axes: Option<&[isize]>,
        forward: bool,
        inorm: i32,
        out: Option<NdArray>,
        nthreads: usize,
    ) -> Result<NdArray> {
        let (kind, req) = self.request(&R2C, a, axes, forward, inorm, nthreads)?;
        dispatch!(kind, r2c, (&self.kernel, self.lock(), &R2C, a, out, &req))
    }

    /// Complex-to-real transform of a one-sided spectrum.
    ///
    /// `lastsize` is the output length along the last transformed axis;
    /// `0` selects `2 * n_in - 1`.
    #[allow(clippy::too_many_arguments)]
    pub fn c2r(
        &self,
        a: &NdArray,
        axes: Option<&[isize]>,
        lastsize: usize,
        forward: bool,
        inorm: i32,
        out: Option<NdArray>,
        nthreads: usize,
    ) -> Result<NdArray> {
        let (kind, req) = self.request(&C2R, a, axes, forward, inorm, nthreads)?;
        dispatch!(
            kind,
            c2r,
            (&self.kernel, self.lock(), &C2R, a, lastsize, out, &req)
        )
    }

    /// Real-to-real transform in FFTPACK halfcomplex storage.
    #[allow(clippy::too_many_arguments)]
    pub fn r2r_fftpack(
        &self,
        a: &NdArray,
        axes: Option<&[isize]>,
        real2hermitian: bool,
        forward: bool,
        inorm: i32,
        out: Option<NdArray>,
        nthreads: usize,
    ) -> Result<NdArray> {
        let (kind, req) = self.request(&R2R_FFTPACK, a, axes, forward, inorm, nthreads)?;
        dispatch!(
            kind,
            r2r_fftpack,
            (
                &self.kernel,
                self.lock(),
                &R2R_FFTPACK,
                a,
                real2hermitian,
                out,
                &req
            )
        )
    }

    /// Product of one-dimensional Hartley transforms along `axes`.
    pub fn separable_hartley(
        &self,
        a: &NdArray,
        axes: Option<&[isize]>,
        inorm: i32,
        out: Option<NdArray>,
        nthreads: usize,
    ) -> Result<NdArray> {
        let (kind, req) = self.request(&SEPARABLE_HARTLEY, a, axes, true, inorm, nthreads)?;
        dispatch!(
            kind,
            separable_hartley,
            (&self.kernel, self.lock(), &SEPARABLE_HARTLEY, a, out, &req)
        )
    }

    /// Multidimensional Hartley transform, `Re F + Im F` of the full forward
    /// transform `F`.
    pub fn genuine_hartley(
        &self,
        a: &NdArray,
        axes: Option<&[isize]>,
        inorm: i32,
        out: Option<NdArray>,
        nthreads: usize,
    ) -> Result<NdArray> {
        let (kind, req) = self.request(&GENUINE_HARTLEY, a, axes, true, inorm, nthreads)?;
        dispatch!(
            kind,
            genuine_hartley,
            (&self.kernel, self.lock(), &GENUINE_HARTLEY, a, out, &req)
        )
    }

    /// Fold a one-sided spectrum of a real array shaped `dims` into its
    /// Hartley transform.
    pub fn complex2hartley(
        &self,
        spectrum: &NdArray,
        dims: &[usize],
        axes: Option<&[isize]>,
        out: Option<NdArray>,
    ) -> Result<NdArray> {
        let kind = COMPLEX2HARTLEY.admit(spectrum.dtype())?;
        validate_dims(dims)?;
        if spectrum.ndim() != dims.len() {
            return Err(StridedError::RankMismatch(spectrum.ndim(), dims.len()).into());
        }
        let axes = AxisSet::resolve(dims.len(), axes)?;
        tracing::debug!(
            operation = COMPLEX2HARTLEY.name,
            dtype = %spectrum.dtype(),
            spectrum_dims = ?spectrum.dims(),
            dims = ?dims,
            axes = ?axes.as_slice(),
            "dispatching transform"
        );
        let lock = self.lock();
        let op = &COMPLEX2HARTLEY;
        match kind {
            PrecisionKind::Single => {
                dispatch::complex2hartley::<Single>(lock, op, spectrum, dims, &axes, out)
            }
            PrecisionKind::Double => {
                dispatch::complex2hartley::<Double>(lock, op, spectrum, dims, &axes, out)
            }
            PrecisionKind::Extended => {
                dispatch::complex2hartley::<Extended>(lock, op, spectrum, dims, &axes, out)
            }
        }
    }

    /// [`FftFrontend::c2c`] with `a` as both input and output. `a` must be
    /// complex.
    pub fn c2c_in_place(
        &self,
        a: &mut NdArray,
        axes: Option<&[isize]>,
        forward: bool,
        inorm: i32,
        nthreads: usize,
    ) -> Result<()> {
        let kind = require_complex("c2c_in_place", a)?;
        let req = TransformRequest::new(&C2C, a, axes, forward, inorm, nthreads)?;
        dispatch!(kind, c2c_in_place, (&self.kernel, self.lock(), &C2C, a, &req))
    }

    /// [`FftFrontend::r2r_fftpack`] with `a` as both input and output.
    pub fn r2r_fftpack_in_place(
        &self,
        a: &mut NdArray,
        axes: Option<&[isize]>,
        real2hermitian: bool,
        forward: bool,
        inorm: i32,
        nthreads: usize,
    ) -> Result<()> {
        let kind = require_real("r2r_fftpack_in_place", a)?;
        let req = TransformRequest::new(&R2R_FFTPACK, a, axes, forward, inorm, nthreads)?;
        dispatch!(
            kind,
            r2r_fftpack_in_place,
            (
                &self.kernel,
                self.lock(),
                &R2R_FFTPACK,
                a,
                real2hermitian,
                &req
            )
        )
    }

    /// [`FftFrontend::separable_hartley`] with `a` as both input and output.
    pub fn separable_hartley_in_place(
        &self,
        a: &mut NdArray,
        axes: Option<&[isize]>,
        inorm: i32,
        nthreads: usize,
    ) -> Result<()> {
        let kind = require_real("separable_hartley_in_place", a)?;
        let req = TransformRequest::new(&SEPARABLE_HARTLEY, a, axes, true, inorm, nthreads)?;
        dispatch!(
            kind,
            separable_hartley_in_place,
            (&self.kernel, self.lock(), &SEPARABLE_HARTLEY, a, &req)
        )
    }
}

/// [`FftFrontend::c2c`] on the default front end.
pub fn c2c(
    a: &NdArray,
    axes: Option<&[isize]>,
    forward: bool,
    inorm: i32,
    out: Option<NdArray>,
    nthreads: usize,
) -> Result<NdArray> {
    FftFrontend::default().c2c(a, axes, forward, inorm, out, nthreads)
}

/// [`FftFrontend::r2c`] on the default front end.
pub fn r2c(
    a: &NdArray,
    axes: Option<&[isize]>,
    forward: bool,
    inorm: i32,
    out: Option<NdArray>,
    nthreads: usize,
) -> Result<NdArray> {
    FftFrontend::default().r2c(a, axes, forward, inorm, out, nthreads)
}

/// [`FftFrontend::c2r`] on the default front end.
pub fn c2r(
    a: &NdArray,
    axes: Option<&[isize]>,
    lastsize: usize,
    forward: bool,
    inorm: i32,
    out: Option<NdArray>,
    nthreads: usize,
) -> Result<NdArray> {
    FftFrontend::default().c2r(a, axes, lastsize, forward, inorm, out, nthreads)
}

/// [`FftFrontend::r2r_fftpack`] on the default front end.
pub fn r2r_fftpack(
    a: &NdArray,
    axes: Option<&[isize]>,
    real2hermitian: bool,
    forward: bool,
    inorm: i32,
    out: Option<NdArray>,
    nthreads: usize,
) -> Result<NdArray> {
    FftFrontend::default().r2r_fftpack(a, axes, real2hermitian, forward, inorm, out, nthreads)
}

/// [`FftFrontend::separable_hartley`] on the default front end.
pub fn separable_hartley(
    a: &NdArray,
    axes: Option<&[isize]>,
    inorm: i32,
    out: Option<NdArray>,
    nthreads: usize,
) -> Result<NdArray> {
    FftFrontend::default().separable_hartley(a, axes, inorm, out, nthreads)
}

/// [`FftFrontend::genuine_hartley`] on the default front end.
pub fn genuine_hartley(
    a: &NdArray,
    axes: Option<&[isize]>,
    inorm: i32,
    out: Option<NdArray>,
    nthreads: usize,
) -> Result<NdArray> {
    FftFrontend::default().genuine_hartley(a, axes, inorm, out, nthreads)
}

/// [`FftFrontend::complex2hartley`] on the default front end.
pub fn complex2hartley(
    spectrum: &NdArray,
    dims: &[usize],
    axes: Option<&[isize]>,
    out: Option<NdArray>,
) -> Result<NdArray> {
    FftFrontend::default().complex2hartley(spectrum, dims, axes, out)
}

/// [`FftFrontend::c2c_in_place`] on the default front end.
pub fn c2c_in_place(
    a: &mut NdArray,
    axes: Option<&[isize]>,
    forward: bool,
    inorm: i32,
    nthreads: usize,
) -> Result<()> {
    FftFrontend::default().c2c_in_place(a, axes, forward, inorm, nthreads)
}

/// [`FftFrontend::r2r_fftpack_in_place`] on the default front end.
pub fn r2r_fftpack_in_place(
    a: &mut NdArray,
    axes: Option<&[isize]>,
    real2hermitian: bool,
    forward: bool,
    inorm: i32,
    nthreads: usize,
) -> Result<()> {
    FftFrontend::default().r2r_fftpack_in_place(a, axes, real2hermitian, forward, inorm, nthreads)
}

/// [`FftFrontend::separable_hartley_in_place`] on the default front end.
pub fn separable_hartley_in_place(
    a: &mut NdArray,
    axes: Option<&[isize]>,
    inorm: i32,
    nthreads: usize,
) -> Result<()> {
    FftFrontend::default().separable_hartley_in_place(a, axes, inorm, nthreads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DType;
    use num_complex::Complex64;
    use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};
    use strided_view::StridedArray;

    #[derive(Default)]
    struct RecordingLock {
        held: AtomicIsize,
        releases: AtomicUsize,
    }

    impl ExecutionLock for RecordingLock {
        fn release(&self) {
            self.held.fetch_sub(1, Ordering::SeqCst);
            self.releases.fetch_add(1, Ordering::SeqCst);
        }

        fn acquire(&self) {
            self.held.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn ramp(dims: &[usize]) -> NdArray {
        let mut k = 0.0;
        NdArray::Float64(StridedArray::from_fn_row_major(dims, |_| {
            k += 1.0;
            k
        }))
    }

    #[test]
    fn lock_is_released_around_kernel_and_restored() {
        let lock = Arc::new(RecordingLock::default());
        let frontend = FftFrontend::default().with_execution_lock(lock.clone());
        frontend.c2c(&ramp(&[4, 4]), None, true, 0, None, 1).unwrap();
        assert_eq!(lock.held.load(Ordering::SeqCst), 0);
        assert_eq!(lock.releases.load(Ordering::SeqCst), 1);
        frontend.genuine_hartley(&ramp(&[6]), None, 0, None, 1).unwrap();
        assert_eq!(lock.held.load(Ordering::SeqCst), 0);
        assert_eq!(lock.releases.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn lock_is_restored_after_failure() {
        let lock = Arc::new(RecordingLock::default());
        let frontend = FftFrontend::default().with_execution_lock(lock.clone());
        let spectrum = NdArray::Complex128(StridedArray::row_major(&[2]));
        let err = frontend.complex2hartley(&spectrum, &[4], None, None);
        assert!(matches!(
            err,
            Err(FftError::IteratorMismatch {
                forward: 2,
                mirror: 3
            })
        ));
        assert_eq!(lock.releases.load(Ordering::SeqCst), 1);
        assert_eq!(lock.held.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn output_errors_surface_before_release() {
        let lock = Arc::new(RecordingLock::default());
        let frontend = FftFrontend::default().with_execution_lock(lock.clone());
        let bad_out = NdArray::Complex128(StridedArray::<Complex64>::row_major(&[5]));
        let err = frontend.c2r(
            &NdArray::Complex128(StridedArray::row_major(&[3])),
            None,
            5,
            false,
            0,
            Some(bad_out),
            1,
        );
        assert!(matches!(err, Err(FftError::OutputMismatch { .. })));
        assert_eq!(lock.releases.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn wrong_element_class_is_rejected() {
        let complex = NdArray::Complex128(StridedArray::row_major(&[4]));
        assert!(matches!(
            r2c(&complex, None, true, 0, None, 1),
            Err(FftError::UnsupportedDType {
                operation: "r2c",
                dtype: DType::Complex128
            })
        ));
        let mut real = ramp(&[4]);
        assert!(matches!(
            c2c_in_place(&mut real, None, true, 0, 1),
            Err(FftError::UnsupportedDType {
                operation: "c2c_in_place",
                ..
            })
        ));
        assert!(c2r(&ramp(&[4]), None, 0, false, 0, None, 1).is_err());
    }

    #[test]
    fn zero_length_axes_are_rejected() {
        let empty = NdArray::Float64(StridedArray::row_major(&[3, 0]));
        assert!(matches!(
            r2c(&empty, None, true, 0, None, 1),
            Err(FftError::InvalidShape { .. })
        ));
    }

    #[test]
    fn complex2hartley_checks_rank() {
        let spectrum = NdArray::Complex128(StridedArray::row_major(&[3]));
        let err = complex2hartley(&spectrum, &[4, 4], None, None);
        assert!(matches!(err, Err(FftError::Strided(_))));
    }

    #[test]
    fn debug_hides_lock_object() {
        let text = format!("{:?}", FftFrontend::default());
        assert!(text.contains("RustFftKernel"));
        assert!(text.contains("execution_lock: false"));
    }
}
