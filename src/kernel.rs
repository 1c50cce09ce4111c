//! Transform kernels.
//!
//! [`FftKernel`] is the seam between the front end and the code that actually
//! computes 1-D transforms along axes of strided arrays. [`RustFftKernel`] is
//! the bundled implementation: each axis pass gathers every 1-D lane along
//! the axis into a contiguous buffer, runs a `rustfft` plan over it and
//! scatters the result, with lanes distributed over worker threads.

use std::sync::Arc;

use num_complex::Complex;
use num_traits::Zero;
use rustfft::{Fft, FftDirection, FftNum, FftPlanner};
use strided_traits::{Conj, ElementOp, RealScalar};
use strided_view::{StridedArray, StridedView, StridedViewMut};

use crate::threading::{SendPtr, Workers};
use crate::{FftError, Result};

/// Real scalar type the kernels can transform.
pub trait FftFloat: RealScalar + FftNum {}

impl<T: RealScalar + FftNum> FftFloat for T {}

/// Per-call kernel parameters.
#[derive(Debug, Clone, Copy)]
pub struct KernelParams<'a, T> {
    /// Axes in pass order. Must be non-empty and in range.
    pub axes: &'a [usize],
    /// Exponent sign: `true` for `exp(-2*pi*i*j*k/n)`.
    pub forward: bool,
    /// Scale applied once to the result.
    pub fct: T,
    pub nthreads: usize,
}

/// Where the first pass of a transform reads from.
#[derive(Debug)]
pub enum Source<'a, T> {
    /// A separate array with the same shape as the output.
    View(StridedView<'a, T>),
    /// The output itself.
    InPlace,
}

/// Multi-axis transform kernels over strided views.
pub trait FftKernel: Send + Sync {
    /// Complex-to-complex transform along `params.axes`.
    fn c2c<T: FftFloat>(
        &self,
        input: Source<'_, Complex<T>>,
        output: &mut StridedViewMut<'_, Complex<T>>,
        params: KernelParams<'_, T>,
    ) -> Result<()>;

    /// Real-to-complex transform.
    ///
    /// Fills the first `n/2 + 1` entries along the last axis of `output`,
    /// where `n` is the input length on that axis; other entries on that axis
    /// are left untouched.
    fn r2c<T: FftFloat>(
        &self,
        input: &StridedView<'_, T>,
        output: &mut StridedViewMut<'_, Complex<T>>,
        params: KernelParams<'_, T>,
    ) -> Result<()>;

    /// Complex-to-real transform of a half spectrum. The output length on the
    /// last axis selects `n`; the input must hold `n/2 + 1` entries there.
    fn c2r<T: FftFloat>(
        &self,
        input: &StridedView<'_, Complex<T>>,
        output: &mut StridedViewMut<'_, T>,
        params: KernelParams<'_, T>,
    ) -> Result<()>;

    /// Real transform in FFTPACK halfcomplex storage, applied axis by axis.
    fn r2r_fftpack<T: FftFloat>(
        &self,
        input: Source<'_, T>,
        output: &mut StridedViewMut<'_, T>,
        real2hermitian: bool,
        params: KernelParams<'_, T>,
    ) -> Result<()>;

    /// Separable Hartley transform: per axis, `re + im` of the forward FFT.
    fn r2r_separable_hartley<T: FftFloat>(
        &self,
        input: Source<'_, T>,
        output: &mut StridedViewMut<'_, T>,
        params: KernelParams<'_, T>,
    ) -> Result<()>;
}

/// Kernel backed by `rustfft`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustFftKernel;

fn direction(forward: bool) -> FftDirection {
    if forward {
        FftDirection::Forward
    } else {
        FftDirection::Inverse
    }
}

struct LaneReader<T> {
    ptr: *const T,
    stride: isize,
    len: usize,
}

impl<T: Copy> LaneReader<T> {
    #[inline]
    fn get(&self, i: usize) -> T {
        assert!(i < self.len);
        // SAFETY: `ptr` addresses the first element of a lane with `len`
        // in-bounds elements spaced by `stride`.
        unsafe { *self.ptr.offset(i as isize * self.stride) }
    }
}

struct LaneWriter<T> {
    ptr: *mut T,
    stride: isize,
    len: usize,
}

impl<T: Copy> LaneWriter<T> {
    #[inline]
    fn set(&mut self, i: usize, value: T) {
        assert!(i < self.len);
        // SAFETY: as for `LaneReader::get`; lanes handed to different
        // workers never share elements.
        unsafe { *self.ptr.offset(i as isize * self.stride) = value }
    }
}

/// One axis pass: the lane grid is `dims` with `axis` collapsed.
struct Pass<'a, S, D> {
    src: SendPtr<S>,
    src_strides: &'a [isize],
    src_len: usize,
    dst: SendPtr<D>,
    dst_strides: &'a [isize],
    dst_len: usize,
    dims: &'a [usize],
    axis: usize,
}

/// Offsets of the first element of every lane along `axis`, for two layouts
/// that share `dims` off that axis.
fn lane_bases(dims: &[usize], axis: usize, a: &[isize], b: &[isize]) -> Vec<(isize, isize)> {
    let outer = |i: usize| i != axis;
    if (0..dims.len()).any(|i| outer(i) && dims[i] == 0) {
        return Vec::new();
    }
    let count: usize = (0..dims.len())
        .filter(|&i| outer(i))
        .map(|i| dims[i])
        .product();
    let mut bases = Vec::with_capacity(count);
    let mut pos = vec![0usize; dims.len()];
    let (mut oa, mut ob) = (0isize, 0isize);
    for _ in 0..count {
        bases.push((oa, ob));
        for i in (0..dims.len()).rev().filter(|&i| outer(i)) {
            pos[i] += 1;
            oa += a[i];
            ob += b[i];
            if pos[i] < dims[i] {
                break;
            }
            oa -= pos[i] as isize * a[i];
            ob -= pos[i] as isize * b[i];
            pos[i] = 0;
        }
    }
    bases
}

fn run_pass<T, S, D, L, W>(
    pass: Pass<'_, S, D>,
    fft: &Arc<dyn Fft<T>>,
    workers: &Workers,
    load: L,
    store: W,
) -> Result<()>
where
    T: FftFloat,
    S: Copy,
    D: Copy,
    L: Fn(&LaneReader<S>, &mut [Complex<T>]) + Sync,
    W: Fn(&[Complex<T>], &mut LaneWriter<D>) + Sync,
{
    let lanes = lane_bases(pass.dims, pass.axis, pass.src_strides, pass.dst_strides);
    let n = fft.len();
    let src_stride = pass.src_strides[pass.axis];
    let dst_stride = pass.dst_strides[pass.axis];
    let (src_len, dst_len) = (pass.src_len, pass.dst_len);
    let (src, dst) = (pass.src, pass.dst);
    tracing::trace!(
        axis = pass.axis,
        len = n,
        lanes = lanes.len(),
        threads = workers.nthreads(),
        "fft axis pass"
    );
    workers.run_lanes(&lanes, n, |chunk| {
        let mut buf = vec![Complex::<T>::zero(); n];
        let mut scratch = vec![Complex::<T>::zero(); fft.get_inplace_scratch_len()];
        for &(src_base, dst_base) in chunk {
            let reader = LaneReader {
                ptr: src.as_const().wrapping_offset(src_base),
                stride: src_stride,
                len: src_len,
            };
            load(&reader, buf.as_mut_slice());
            fft.process_with_scratch(&mut buf, &mut scratch);
            let mut writer = LaneWriter {
                ptr: dst.as_ptr().wrapping_offset(dst_base),
                stride: dst_stride,
                len: dst_len,
            };
            store(buf.as_slice(), &mut writer);
        }
        Ok(())
    })
}

/// Complex lane pass from `src` into `dst` over the region `dims`.
#[allow(clippy::too_many_arguments)]
fn complex_pass<T: FftFloat>(
    planner: &mut FftPlanner<T>,
    src: (SendPtr<Complex<T>>, &[isize]),
    dst: (SendPtr<Complex<T>>, &[isize]),
    dims: &[usize],
    axis: usize,
    forward: bool,
    scale: T,
    workers: &Workers,
) -> Result<()> {
    let n = dims[axis];
    let fft = planner.plan_fft(n, direction(forward));
    let pass = Pass {
        src: src.0,
        src_strides: src.1,
        src_len: n,
        dst: dst.0,
        dst_strides: dst.1,
        dst_len: n,
        dims,
        axis,
    };
    run_pass(
        pass,
        &fft,
        workers,
        |lane, buf| {
            for (i, b) in buf.iter_mut().enumerate() {
                *b = lane.get(i);
            }
        },
        |buf, lane| {
            for (i, &b) in buf.iter().enumerate() {
                lane.set(i, b * scale);
            }
        },
    )
}

fn last_axis(axes: &[usize]) -> Result<usize> {
    axes.last().copied().ok_or(FftError::InvalidAxes {
        detail: "kernel called without axes",
    })
}

fn check_same_dims(input: &[usize], output: &[usize]) -> Result<()> {
    if input == output {
        Ok(())
    } else {
        Err(FftError::ShapeMismatch(input.to_vec(), output.to_vec()))
    }
}

/// `input` and `output` agree off `axis`; on `axis` the predicate decides.
fn check_dims_except(
    input: &[usize],
    output: &[usize],
    axis: usize,
    on_axis: impl Fn(usize, usize) -> bool,
) -> Result<()> {
    let ok = input.len() == output.len()
        && input
            .iter()
            .zip(output)
            .enumerate()
            .all(|(i, (&a, &b))| if i == axis { on_axis(a, b) } else { a == b });
    if ok {
        Ok(())
    } else {
        Err(FftError::ShapeMismatch(input.to_vec(), output.to_vec()))
    }
}

/// Split a real source into the pointer/strides pair of the first pass.
fn first_source<T>(
    input: &Source<'_, T>,
    output: (SendPtr<T>, &[isize]),
    dims: &[usize],
) -> Result<(SendPtr<T>, Vec<isize>)> {
    match input {
        Source::View(view) => {
            check_same_dims(view.dims(), dims)?;
            Ok((SendPtr(view.ptr() as *mut T), view.strides().to_vec()))
        }
        Source::InPlace => Ok((output.0, output.1.to_vec())),
    }
}

/// Pack a full spectrum of a real length-`n` sequence into FFTPACK
/// halfcomplex order `[r0, r1, i1, r2, i2, ...]`, ending with `r(n/2)` when
/// `n` is even.
pub(crate) fn pack_halfcomplex<T: FftFloat>(
    spectrum: &[Complex<T>],
    scale: T,
    mut emit: impl FnMut(usize, T),
) {
    let n = spectrum.len();
    emit(0, spectrum[0].re * scale);
    let (mut i, mut k) = (1, 1);
    while i + 1 < n {
        emit(i, spectrum[k].re * scale);
        emit(i + 1, spectrum[k].im * scale);
        i += 2;
        k += 1;
    }
    if i < n {
        emit(i, spectrum[k].re * scale);
    }
}

/// Expand FFTPACK halfcomplex storage into the full Hermitian spectrum.
pub(crate) fn unpack_halfcomplex<T: FftFloat>(packed: impl Fn(usize) -> T, out: &mut [Complex<T>]) {
    let n = out.len();
    out[0] = Complex::new(packed(0), T::zero());
    let (mut i, mut k) = (1, 1);
    while i + 1 < n {
        let v = Complex::new(packed(i), packed(i + 1));
        out[k] = v;
        out[n - k] = Conj::apply(v);
        i += 2;
        k += 1;
    }
    if i < n {
        out[k] = Complex::new(packed(i), T::zero());
    }
}

impl FftKernel for RustFftKernel {
    fn c2c<T: FftFloat>(
        &self,
        input: Source<'_, Complex<T>>,
        output: &mut StridedViewMut<'_, Complex<T>>,
        params: KernelParams<'_, T>,
    ) -> Result<()> {
        last_axis(params.axes)?;
        let dims = output.dims().to_vec();
        let out_strides = output.strides().to_vec();
        let out_ptr = SendPtr(output.as_mut_ptr());
        let (first_ptr, first_strides) = first_source(&input, (out_ptr, &out_strides), &dims)?;
        let mut planner = FftPlanner::new();
        let workers = Workers::new(params.nthreads, output.len())?;
        for (k, &axis) in params.axes.iter().enumerate() {
            let (src, scale) = if k == 0 {
                ((first_ptr, first_strides.as_slice()), params.fct)
            } else {
                ((out_ptr, out_strides.as_slice()), T::one())
            };
            complex_pass(
                &mut planner,
                src,
                (out_ptr, &out_strides),
                &dims,
                axis,
                params.forward,
                scale,
                &workers,
            )?;
        }
        Ok(())
    }

    fn r2c<T: FftFloat>(
        &self,
        input: &StridedView<'_, T>,
        output: &mut StridedViewMut<'_, Complex<T>>,
        params: KernelParams<'_, T>,
    ) -> Result<()> {
        let last = last_axis(params.axes)?;
        let in_dims = input.dims().to_vec();
        let n = in_dims[last];
        let half = n / 2 + 1;
        check_dims_except(&in_dims, output.dims(), last, |_, o| o >= half)?;
        let out_strides = output.strides().to_vec();
        let out_ptr = SendPtr(output.as_mut_ptr());
        let mut planner = FftPlanner::new();
        let workers = Workers::new(params.nthreads, output.len())?;

        let fft = planner.plan_fft(n, direction(params.forward));
        let fct = params.fct;
        let pass = Pass {
            src: SendPtr(input.ptr() as *mut T),
            src_strides: input.strides(),
            src_len: n,
            dst: out_ptr,
            dst_strides: &out_strides,
            dst_len: half,
            dims: &in_dims,
            axis: last,
        };
        run_pass(
            pass,
            &fft,
            &workers,
            |lane, buf| {
                for (i, b) in buf.iter_mut().enumerate() {
                    *b = Complex::new(lane.get(i), T::zero());
                }
            },
            |buf, lane| {
                for (i, &b) in buf[..half].iter().enumerate() {
                    lane.set(i, b * fct);
                }
            },
        )?;

        let mut region = in_dims;
        region[last] = half;
        for &axis in &params.axes[..params.axes.len() - 1] {
            complex_pass(
                &mut planner,
                (out_ptr, &out_strides),
                (out_ptr, &out_strides),
                &region,
                axis,
                params.forward,
                T::one(),
                &workers,
            )?;
        }
        Ok(())
    }

    fn c2r<T: FftFloat>(
        &self,
        input: &StridedView<'_, Complex<T>>,
        output: &mut StridedViewMut<'_, T>,
        params: KernelParams<'_, T>,
    ) -> Result<()> {
        let last = last_axis(params.axes)?;
        let out_dims = output.dims().to_vec();
        let n = out_dims[last];
        let half = n / 2 + 1;
        check_dims_except(input.dims(), &out_dims, last, |i, _| i == half)?;
        let mut planner = FftPlanner::new();
        let workers = Workers::new(params.nthreads, output.len())?;

        let mut staged: Option<StridedArray<Complex<T>>> = None;
        let in_ptr = SendPtr(input.ptr() as *mut Complex<T>);
        let (spec_ptr, spec_strides) = if params.axes.len() > 1 {
            let tmp = staged.insert(StridedArray::row_major(input.dims()));
            let tmp_strides = tmp.strides().to_vec();
            let tmp_ptr = SendPtr(tmp.data_mut().as_mut_ptr());
            let region = input.dims().to_vec();
            for (k, &axis) in params.axes[..params.axes.len() - 1].iter().enumerate() {
                let src = if k == 0 {
                    (in_ptr, input.strides())
                } else {
                    (tmp_ptr, tmp_strides.as_slice())
                };
                complex_pass(
                    &mut planner,
                    src,
                    (tmp_ptr, &tmp_strides),
                    &region,
                    axis,
                    params.forward,
                    T::one(),
                    &workers,
                )?;
            }
            (tmp_ptr, tmp_strides)
        } else {
            (in_ptr, input.strides().to_vec())
        };

        let out_strides = output.strides().to_vec();
        let fft = planner.plan_fft(n, direction(params.forward));
        let fct = params.fct;
        let pass = Pass {
            src: spec_ptr,
            src_strides: &spec_strides,
            src_len: half,
            dst: SendPtr(output.as_mut_ptr()),
            dst_strides: &out_strides,
            dst_len: n,
            dims: &out_dims,
            axis: last,
        };
        run_pass(
            pass,
            &fft,
            &workers,
            |lane, buf| {
                for (k, b) in buf.iter_mut().enumerate() {
                    *b = if k < half {
                        lane.get(k)
                    } else {
                        Conj::apply(lane.get(n - k))
                    };
                }
            },
            |buf, lane| {
                for (i, b) in buf.iter().enumerate() {
                    lane.set(i, b.re * fct);
                }
            },
        )
    }

    fn r2r_fftpack<T: FftFloat>(
        &self,
        input: Source<'_, T>,
        output: &mut StridedViewMut<'_, T>,
        real2hermitian: bool,
        params: KernelParams<'_, T>,
    ) -> Result<()> {
        last_axis(params.axes)?;
        let dims = output.dims().to_vec();
        let out_strides = output.strides().to_vec();
        let out_ptr = SendPtr(output.as_mut_ptr());
        let (first_ptr, first_strides) = first_source(&input, (out_ptr, &out_strides), &dims)?;
        let mut planner = FftPlanner::new();
        let workers = Workers::new(params.nthreads, output.len())?;
        for (k, &axis) in params.axes.iter().enumerate() {
            let n = dims[axis];
            let (src, src_strides, scale) = if k == 0 {
                (first_ptr, first_strides.as_slice(), params.fct)
            } else {
                (out_ptr, out_strides.as_slice(), T::one())
            };
            let fft = planner.plan_fft(n, direction(params.forward));
            let pass = Pass {
                src,
                src_strides,
                src_len: n,
                dst: out_ptr,
                dst_strides: &out_strides,
                dst_len: n,
                dims: &dims,
                axis,
            };
            run_pass(
                pass,
                &fft,
                &workers,
                |lane, buf| {
                    if real2hermitian {
                        for (i, b) in buf.iter_mut().enumerate() {
                            *b = Complex::new(lane.get(i), T::zero());
                        }
                    } else {
                        unpack_halfcomplex(|i| lane.get(i), buf);
                    }
                },
                |buf, lane| {
                    if real2hermitian {
                        pack_halfcomplex(buf, scale, |i, v| lane.set(i, v));
                    } else {
                        for (i, b) in buf.iter().enumerate() {
                            lane.set(i, b.re * scale);
                        }
                    }
                },
            )?;
        }
        Ok(())
    }

    fn r2r_separable_hartley<T: FftFloat>(
        &self,
        input: Source<'_, T>,
        output: &mut StridedViewMut<'_, T>,
        params: KernelParams<'_, T>,
    ) -> Result<()> {
        last_axis(params.axes)?;
        let dims = output.dims().to_vec();
        let out_strides = output.strides().to_vec();
        let out_ptr = SendPtr(output.as_mut_ptr());
        let (first_ptr, first_strides) = first_source(&input, (out_ptr, &out_strides), &dims)?;
        let mut planner = FftPlanner::new();
        let workers = Workers::new(params.nthreads, output.len())?;
        for (k, &axis) in params.axes.iter().enumerate() {
            let n = dims[axis];
            let (src, src_strides, scale) = if k == 0 {
                (first_ptr, first_strides.as_slice(), params.fct)
            } else {
                (out_ptr, out_strides.as_slice(), T::one())
            };
            let fft = planner.plan_fft(n, FftDirection::Forward);
            let pass = Pass {
                src,
                src_strides,
                src_len: n,
                dst: out_ptr,
                dst_strides: &out_strides,
                dst_len: n,
                dims: &dims,
                axis,
            };
            run_pass(
                pass,
                &fft,
                &workers,
                |lane, buf| {
                    for (i, b) in buf.iter_mut().enumerate() {
                        *b = Complex::new(lane.get(i), T::zero());
                    }
                },
                |buf, lane| {
                    for (i, b) in buf.iter().enumerate() {
                        lane.set(i, (b.re + b.im) * scale);
                    }
                },
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn params(axes: &[usize], forward: bool) -> KernelParams<'_, f64> {
        KernelParams {
            axes,
            forward,
            fct: 1.0,
            nthreads: 1,
        }
    }

    #[test]
    fn lane_bases_cover_outer_grid() {
        let bases = lane_bases(&[2, 3], 1, &[3, 1], &[1, 2]);
        assert_eq!(bases, vec![(0, 0), (3, 1)]);
        let bases = lane_bases(&[2, 3], 0, &[3, 1], &[1, 2]);
        assert_eq!(bases, vec![(0, 0), (1, 2), (2, 4)]);
    }

    #[test]
    fn halfcomplex_packing_round_trips() {
        for n in [1usize, 2, 5, 8] {
            let packed: Vec<f64> = (0..n).map(|i| i as f64 + 0.5).collect();
            let mut full = vec![Complex::zero(); n];
            unpack_halfcomplex(|i| packed[i], &mut full);
            let mut repacked = vec![0.0; n];
            pack_halfcomplex(&full, 1.0, |i, v| repacked[i] = v);
            assert_eq!(repacked, packed);
        }
    }

    #[test]
    fn c2c_of_impulse_is_flat() {
        let mut src = StridedArray::<Complex<f64>>::row_major(&[4]);
        src.set(&[0], Complex::new(1.0, 0.0));
        let mut out = StridedArray::<Complex<f64>>::row_major(&[4]);
        RustFftKernel
            .c2c(
                Source::View(src.view()),
                &mut out.view_mut(),
                params(&[0], true),
            )
            .unwrap();
        for v in out.to_row_major_vec() {
            assert_relative_eq!(v.re, 1.0);
            assert_relative_eq!(v.im, 0.0);
        }
    }

    #[test]
    fn r2c_then_c2r_recovers_input() {
        let src = StridedArray::<f64>::from_fn_row_major(&[3, 5], |idx| {
            (idx[0] * 5 + idx[1]) as f64 - 3.0
        });
        let mut spec = StridedArray::<Complex<f64>>::row_major(&[3, 3]);
        RustFftKernel
            .r2c(&src.view(), &mut spec.view_mut(), params(&[0, 1], true))
            .unwrap();
        let mut back = StridedArray::<f64>::row_major(&[3, 5]);
        let inverse = KernelParams {
            fct: 1.0 / 15.0,
            ..params(&[0, 1], false)
        };
        RustFftKernel
            .c2r(&spec.view(), &mut back.view_mut(), inverse)
            .unwrap();
        for (a, b) in back.to_row_major_vec().iter().zip(src.to_row_major_vec()) {
            assert_relative_eq!(*a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn kernel_rejects_mismatched_views() {
        let src = StridedArray::<Complex<f64>>::row_major(&[4]);
        let mut out = StridedArray::<Complex<f64>>::row_major(&[5]);
        let err = RustFftKernel.c2c(
            Source::View(src.view()),
            &mut out.view_mut(),
            params(&[0], true),
        );
        assert!(matches!(err, Err(FftError::ShapeMismatch(_, _))));
    }

    #[test]
    fn hartley_of_cosine() {
        let n = 8;
        let src = StridedArray::<f64>::from_fn_row_major(&[n], |idx| {
            (2.0 * std::f64::consts::PI * idx[0] as f64 / n as f64).cos()
        });
        let mut out = StridedArray::<f64>::row_major(&[n]);
        RustFftKernel
            .r2r_separable_hartley(Source::View(src.view()), &mut out.view_mut(), params(&[0], true))
            .unwrap();
        let h = out.to_row_major_vec();
        assert_relative_eq!(h[1], 4.0, epsilon = 1e-12);
        assert_relative_eq!(h[7], 4.0, epsilon = 1e-12);
        assert_relative_eq!(h[0], 0.0, epsilon = 1e-12);
    }
}
