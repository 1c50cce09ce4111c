//! Precision-generic transform bodies.
//!
//! Each function here is instantiated once per [`Precision`] marker. The
//! front end picks the instantiation from the input's dtype tag, so nothing
//! below this layer looks at a tag again except to unwrap the array.

use num_complex::Complex;
use strided_view::StridedArray;

use crate::kernel::{FftKernel, KernelParams, Source};
use crate::mirror::{fill_hermitian, fold_hartley};
use crate::operations::OperationInfo;
use crate::output::prepare_output;
use crate::threading::{resolve_thread_count, ExecutionLock, LockRelease};
use crate::{AxisSet, DType, FftError, NdArray, Normalization, Precision, Result};

/// A validated transform call.
#[derive(Debug, Clone)]
pub(crate) struct TransformRequest {
    pub(crate) axes: AxisSet,
    pub(crate) forward: bool,
    pub(crate) normalization: Normalization,
    pub(crate) nthreads: usize,
}

impl TransformRequest {
    pub(crate) fn new(
        op: &OperationInfo,
        a: &NdArray,
        axes: Option<&[isize]>,
        forward: bool,
        inorm: i32,
        nthreads: usize,
    ) -> Result<Self> {
        validate_dims(a.dims())?;
        let axes = AxisSet::resolve(a.ndim(), axes)?;
        let normalization = Normalization::try_from(inorm)?;
        let nthreads = resolve_thread_count(nthreads);
        tracing::debug!(
            operation = op.name,
            dtype = %a.dtype(),
            dims = ?a.dims(),
            axes = ?axes.as_slice(),
            forward,
            ?normalization,
            nthreads,
            "dispatching transform"
        );
        Ok(Self {
            axes,
            forward,
            normalization,
            nthreads,
        })
    }

    fn params<T>(&self, fct: T) -> KernelParams<'_, T> {
        KernelParams {
            axes: self.axes.as_slice(),
            forward: self.forward,
            fct,
            nthreads: self.nthreads,
        }
    }
}

pub(crate) fn validate_dims(dims: &[usize]) -> Result<()> {
    if dims.contains(&0) {
        return Err(FftError::InvalidShape {
            dims: dims.to_vec(),
        });
    }
    Ok(())
}

/// Dtype of the array `op` returns at precision `P`.
fn output_dtype<P: Precision>(op: &OperationInfo) -> DType {
    op.output_dtype(P::KIND)
}

fn mismatch(op: &OperationInfo, a: &NdArray) -> FftError {
    FftError::UnsupportedDType {
        operation: op.name,
        dtype: a.dtype(),
    }
}

pub(crate) fn c2c<P: Precision, K: FftKernel>(
    kernel: &K,
    lock: Option<&dyn ExecutionLock>,
    op: &OperationInfo,
    a: &NdArray,
    out: Option<NdArray>,
    req: &TransformRequest,
) -> Result<NdArray> {
    let input = P::complex(a).ok_or_else(|| mismatch(op, a))?;
    let mut res = prepare_output(out, output_dtype::<P>(op), input.dims(), P::take_complex)?;
    let fct: P::Real = req
        .normalization
        .factor_for_axes(input.dims(), req.axes.as_slice());
    {
        let _released = LockRelease::new(lock);
        kernel.c2c(
            Source::View(input.view()),
            &mut res.view_mut(),
            req.params(fct),
        )?;
    }
    Ok(P::wrap_complex(res))
}

/// Complex transform of real input: half spectrum from the real kernel, then
/// the redundant half filled by conjugate symmetry.
pub(crate) fn c2c_sym<P: Precision, K: FftKernel>(
    kernel: &K,
    lock: Option<&dyn ExecutionLock>,
    op: &OperationInfo,
    a: &NdArray,
    out: Option<NdArray>,
    req: &TransformRequest,
) -> Result<NdArray> {
    let input = P::real(a).ok_or_else(|| mismatch(op, a))?;
    let mut res = prepare_output(out, output_dtype::<P>(op), input.dims(), P::take_complex)?;
    let fct: P::Real = req
        .normalization
        .factor_for_axes(input.dims(), req.axes.as_slice());
    {
        let _released = LockRelease::new(lock);
        let mut view = res.view_mut();
        kernel.r2c(&input.view(), &mut view, req.params(fct))?;
        fill_hermitian(&mut view, req.axes.as_slice());
    }
    Ok(P::wrap_complex(res))
}

pub(crate) fn r2c<P: Precision, K: FftKernel>(
    kernel: &K,
    lock: Option<&dyn ExecutionLock>,
    op: &OperationInfo,
    a: &NdArray,
    out: Option<NdArray>,
    req: &TransformRequest,
) -> Result<NdArray> {
    let input = P::real(a).ok_or_else(|| mismatch(op, a))?;
    let res = r2c_array::<P, K>(kernel, lock, input, out, req)?;
    Ok(P::wrap_complex(res))
}

fn r2c_array<P: Precision, K: FftKernel>(
    kernel: &K,
    lock: Option<&dyn ExecutionLock>,
    input: &StridedArray<P::Real>,
    out: Option<NdArray>,
    req: &TransformRequest,
) -> Result<StridedArray<Complex<P::Real>>> {
    let axes = req.axes.as_slice();
    let last = req.axes.last();
    let mut dims_out = input.dims().to_vec();
    dims_out[last] = dims_out[last] / 2 + 1;
    let mut res = prepare_output(out, P::COMPLEX, &dims_out, P::take_complex)?;
    let fct: P::Real = req.normalization.factor_for_axes(input.dims(), axes);
    {
        let _released = LockRelease::new(lock);
        kernel.r2c(&input.view(), &mut res.view_mut(), req.params(fct))?;
    }
    Ok(res)
}

pub(crate) fn c2r<P: Precision, K: FftKernel>(
    kernel: &K,
    lock: Option<&dyn ExecutionLock>,
    op: &OperationInfo,
    a: &NdArray,
    lastsize: usize,
    out: Option<NdArray>,
    req: &TransformRequest,
) -> Result<NdArray> {
    let input = P::complex(a).ok_or_else(|| mismatch(op, a))?;
    let last = req.axes.last();
    let n_in = input.dims()[last];
    let lastsize = if lastsize == 0 { 2 * n_in - 1 } else { lastsize };
    if lastsize / 2 + 1 != n_in {
        return Err(FftError::InconsistentLastSize {
            lastsize,
            expected: lastsize / 2 + 1,
            actual: n_in,
        });
    }
    let mut dims_out = input.dims().to_vec();
    dims_out[last] = lastsize;
    let mut res = prepare_output(out, output_dtype::<P>(op), &dims_out, P::take_real)?;
    let fct: P::Real = req
        .normalization
        .factor_for_axes(&dims_out, req.axes.as_slice());
    {
        let _released = LockRelease::new(lock);
        kernel.c2r(&input.view(), &mut res.view_mut(), req.params(fct))?;
    }
    Ok(P::wrap_real(res))
}

pub(crate) fn r2r_fftpack<P: Precision, K: FftKernel>(
    kernel: &K,
    lock: Option<&dyn ExecutionLock>,
    op: &OperationInfo,
    a: &NdArray,
    real2hermitian: bool,
    out: Option<NdArray>,
    req: &TransformRequest,
) -> Result<NdArray> {
    let input = P::real(a).ok_or_else(|| mismatch(op, a))?;
    let mut res = prepare_output(out, output_dtype::<P>(op), input.dims(), P::take_real)?;
    let fct: P::Real = req
        .normalization
        .factor_for_axes(input.dims(), req.axes.as_slice());
    {
        let _released = LockRelease::new(lock);
        kernel.r2r_fftpack(
            Source::View(input.view()),
            &mut res.view_mut(),
            real2hermitian,
            req.params(fct),
        )?;
    }
    Ok(P::wrap_real(res))
}

pub(crate) fn separable_hartley<P: Precision, K: FftKernel>(
    kernel: &K,
    lock: Option<&dyn ExecutionLock>,
    op: &OperationInfo,
    a: &NdArray,
    out: Option<NdArray>,
    req: &TransformRequest,
) -> Result<NdArray> {
    let input = P::real(a).ok_or_else(|| mismatch(op, a))?;
    let mut res = prepare_output(out, output_dtype::<P>(op), input.dims(), P::take_real)?;
    let fct: P::Real = req
        .normalization
        .factor_for_axes(input.dims(), req.axes.as_slice());
    {
        let _released = LockRelease::new(lock);
        kernel.r2r_separable_hartley(
            Source::View(input.view()),
            &mut res.view_mut(),
            req.params(fct),
        )?;
    }
    Ok(P::wrap_real(res))
}

pub(crate) fn genuine_hartley<P: Precision, K: FftKernel>(
    kernel: &K,
    lock: Option<&dyn ExecutionLock>,
    op: &OperationInfo,
    a: &NdArray,
    out: Option<NdArray>,
    req: &TransformRequest,
) -> Result<NdArray> {
    let input = P::real(a).ok_or_else(|| mismatch(op, a))?;
    let spectrum_req = TransformRequest {
        forward: true,
        ..req.clone()
    };
    let spectrum = r2c_array::<P, K>(kernel, lock, input, None, &spectrum_req)?;
    let res = complex2hartley_array::<P>(lock, &spectrum, input.dims(), &req.axes, out)?;
    Ok(P::wrap_real(res))
}

pub(crate) fn complex2hartley<P: Precision>(
    lock: Option<&dyn ExecutionLock>,
    op: &OperationInfo,
    spectrum: &NdArray,
    dims: &[usize],
    axes: &AxisSet,
    out: Option<NdArray>,
) -> Result<NdArray> {
    let input = P::complex(spectrum).ok_or_else(|| mismatch(op, spectrum))?;
    let res = complex2hartley_array::<P>(lock, input, dims, axes, out)?;
    Ok(P::wrap_real(res))
}

fn complex2hartley_array<P: Precision>(
    lock: Option<&dyn ExecutionLock>,
    spectrum: &StridedArray<Complex<P::Real>>,
    dims: &[usize],
    axes: &AxisSet,
    out: Option<NdArray>,
) -> Result<StridedArray<P::Real>> {
    let mut res = prepare_output(out, P::REAL, dims, P::take_real)?;
    {
        let _released = LockRelease::new(lock);
        fold_hartley(&spectrum.view(), &mut res.view_mut(), axes.as_slice())?;
    }
    Ok(res)
}

pub(crate) fn c2c_in_place<P: Precision, K: FftKernel>(
    kernel: &K,
    lock: Option<&dyn ExecutionLock>,
    op: &OperationInfo,
    a: &mut NdArray,
    req: &TransformRequest,
) -> Result<()> {
    let dtype = a.dtype();
    let array = P::complex_mut(a).ok_or(FftError::UnsupportedDType {
        operation: op.name,
        dtype,
    })?;
    let fct: P::Real = req
        .normalization
        .factor_for_axes(array.dims(), req.axes.as_slice());
    let _released = LockRelease::new(lock);
    kernel.c2c(Source::InPlace, &mut array.view_mut(), req.params(fct))
}

pub(crate) fn r2r_fftpack_in_place<P: Precision, K: FftKernel>(
    kernel: &K,
    lock: Option<&dyn ExecutionLock>,
    op: &OperationInfo,
    a: &mut NdArray,
    real2hermitian: bool,
    req: &TransformRequest,
) -> Result<()> {
    let dtype = a.dtype();
    let array = P::real_mut(a).ok_or(FftError::UnsupportedDType {
        operation: op.name,
        dtype,
    })?;
    let fct: P::Real = req
        .normalization
        .factor_for_axes(array.dims(), req.axes.as_slice());
    let _released = LockRelease::new(lock);
    kernel.r2r_fftpack(
        Source::InPlace,
        &mut array.view_mut(),
        real2hermitian,
        req.params(fct),
    )
}

pub(crate) fn separable_hartley_in_place<P: Precision, K: FftKernel>(
    kernel: &K,
    lock: Option<&dyn ExecutionLock>,
    op: &OperationInfo,
    a: &mut NdArray,
    req: &TransformRequest,
) -> Result<()> {
    let dtype = a.dtype();
    let array = P::real_mut(a).ok_or(FftError::UnsupportedDType {
        operation: op.name,
        dtype,
    })?;
    let fct: P::Real = req
        .normalization
        .factor_for_axes(array.dims(), req.axes.as_slice());
    let _released = LockRelease::new(lock);
    kernel.r2r_separable_hartley(Source::InPlace, &mut array.view_mut(), req.params(fct))
}
