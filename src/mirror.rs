//! Forward and mirror-offset iteration, and the post-passes built on them.
//!
//! [`MirrorIter`] walks the non-redundant half of a Hermitian-symmetric array
//! and yields, for each position, its own offset together with the offset of
//! the position reflected through the origin along every transformed axis.
//! [`fill_hermitian`] and [`fold_hartley`] use that pairing to rebuild a full
//! spectrum from its half and to turn a half spectrum into a Hartley
//! transform.

use num_complex::Complex;
use smallvec::SmallVec;
use strided_traits::{Conj, ElementOp, RealScalar};
use strided_view::{StridedView, StridedViewMut};

use crate::{FftError, Result};

type SVec<T> = SmallVec<[T; 8]>;

/// Row-major walk over every element of a strided layout, yielding relative
/// element offsets.
#[derive(Debug, Clone)]
pub struct ForwardIter {
    dims: SVec<usize>,
    strides: SVec<isize>,
    pos: SVec<usize>,
    ofs: isize,
    remaining: usize,
}

impl ForwardIter {
    pub fn new(dims: &[usize], strides: &[isize]) -> Self {
        Self {
            dims: SmallVec::from_slice(dims),
            strides: SmallVec::from_slice(strides),
            pos: SmallVec::from_elem(0, dims.len()),
            ofs: 0,
            remaining: dims.iter().product(),
        }
    }

    /// Number of positions not yet yielded.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl Iterator for ForwardIter {
    type Item = isize;

    fn next(&mut self) -> Option<isize> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.ofs;
        self.remaining -= 1;
        for i in (0..self.dims.len()).rev() {
            self.pos[i] += 1;
            self.ofs += self.strides[i];
            if self.pos[i] < self.dims[i] {
                break;
            }
            self.ofs -= self.pos[i] as isize * self.strides[i];
            self.pos[i] = 0;
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for ForwardIter {}

/// Walk over the non-redundant half of an array with Hermitian symmetry
/// along `axes`, yielding `(ofs, mirror_ofs)` pairs.
///
/// The walk covers the full extent of every axis except the last entry of
/// `axes`, which is cut to `n/2 + 1`. The mirror of coordinate `p` along a
/// transformed axis of length `n` is `(n - p) mod n`; other axes map to
/// themselves.
#[derive(Debug, Clone)]
pub struct MirrorIter {
    dims: SVec<usize>,
    extent: SVec<usize>,
    strides: SVec<isize>,
    mirrored: SVec<bool>,
    pos: SVec<usize>,
    ofs: isize,
    rev_ofs: isize,
    remaining: usize,
}

impl MirrorIter {
    pub fn new(dims: &[usize], strides: &[isize], axes: &[usize]) -> Self {
        let mut extent: SVec<usize> = SmallVec::from_slice(dims);
        let mut mirrored: SVec<bool> = SmallVec::from_elem(false, dims.len());
        for &axis in axes {
            mirrored[axis] = true;
        }
        if let Some(&last) = axes.last() {
            extent[last] = dims[last] / 2 + 1;
        }
        let remaining = if dims.contains(&0) {
            0
        } else {
            extent.iter().product()
        };
        Self {
            dims: SmallVec::from_slice(dims),
            extent,
            strides: SmallVec::from_slice(strides),
            mirrored,
            pos: SmallVec::from_elem(0, dims.len()),
            ofs: 0,
            rev_ofs: 0,
            remaining,
        }
    }

    /// Number of positions not yet yielded.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    fn coord(&self, axis: usize, p: usize) -> isize {
        if self.mirrored[axis] && p != 0 {
            (self.dims[axis] - p) as isize
        } else {
            p as isize
        }
    }
}

impl Iterator for MirrorIter {
    type Item = (isize, isize);

    fn next(&mut self) -> Option<(isize, isize)> {
        if self.remaining == 0 {
            return None;
        }
        let current = (self.ofs, self.rev_ofs);
        self.remaining -= 1;
        for i in (0..self.extent.len()).rev() {
            let old = self.pos[i];
            let new = if old + 1 < self.extent[i] { old + 1 } else { 0 };
            let stride = self.strides[i];
            self.ofs += (new as isize - old as isize) * stride;
            self.rev_ofs += (self.coord(i, new) - self.coord(i, old)) * stride;
            self.pos[i] = new;
            if new != 0 {
                break;
            }
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for MirrorIter {}

/// Complete a Hermitian spectrum whose non-redundant half along `axes` is
/// already stored in `out`, writing the conjugate of every stored value to
/// its mirrored position.
pub fn fill_hermitian<T: RealScalar>(out: &mut StridedViewMut<'_, Complex<T>>, axes: &[usize]) {
    for (ofs, rev_ofs) in MirrorIter::new(out.dims(), out.strides(), axes) {
        // SAFETY: both offsets come from in-bounds coordinates of `out`.
        unsafe {
            let value = out.read_at(ofs);
            out.write_at(rev_ofs, Conj::apply(value));
        }
    }
}

/// Turn the half spectrum `spectrum` of a real array into its Hartley
/// transform in `out`, writing `re + im` at each position and `re - im` at
/// its mirror.
pub fn fold_hartley<T: RealScalar>(
    spectrum: &StridedView<'_, Complex<T>>,
    out: &mut StridedViewMut<'_, T>,
    axes: &[usize],
) -> Result<()> {
    let forward = ForwardIter::new(spectrum.dims(), spectrum.strides());
    let mirror = MirrorIter::new(out.dims(), out.strides(), axes);
    if forward.remaining() != mirror.remaining() {
        return Err(FftError::IteratorMismatch {
            forward: forward.remaining(),
            mirror: mirror.remaining(),
        });
    }
    for (src, (ofs, rev_ofs)) in forward.zip(mirror) {
        // SAFETY: offsets come from in-bounds coordinates of their views.
        unsafe {
            let v = spectrum.read_at(src);
            out.write_at(ofs, v.re + v.im);
            out.write_at(rev_ofs, v.re - v.im);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strided_view::{row_major_strides, StridedArray};

    /// Offset of the position reflected through the origin along `axes`.
    fn mirror_offset(dims: &[usize], strides: &[isize], axes: &[usize], index: &[usize]) -> isize {
        index
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                let q = if axes.contains(&i) && p != 0 {
                    dims[i] - p
                } else {
                    p
                };
                q as isize * strides[i]
            })
            .sum()
    }

    fn unravel(dims: &[usize], mut linear: usize) -> Vec<usize> {
        let mut index = vec![0; dims.len()];
        for i in (0..dims.len()).rev() {
            index[i] = linear % dims[i];
            linear /= dims[i];
        }
        index
    }

    #[test]
    fn forward_iter_matches_row_major_offsets() {
        let dims = [2, 3, 2];
        let strides = [1, 2, 6];
        let offsets: Vec<isize> = ForwardIter::new(&dims, &strides).collect();
        let expected: Vec<isize> = (0..12)
            .map(|k| {
                let idx = unravel(&dims, k);
                idx.iter().zip(&strides).map(|(&p, &s)| p as isize * s).sum()
            })
            .collect();
        assert_eq!(offsets, expected);
    }

    #[test]
    fn mirror_iter_halves_last_axis() {
        let dims = [4, 6];
        let strides = row_major_strides(&dims);
        let iter = MirrorIter::new(&dims, &strides, &[0, 1]);
        assert_eq!(iter.remaining(), 4 * 4);
        assert_eq!(iter.len(), 16);
    }

    #[test]
    fn mirror_iter_pairs_agree_with_direct_reflection() {
        let dims = [3, 4, 5];
        let strides = [-7isize, 30, 2];
        let axes = [2, 0];
        let extent = [2, 4, 5];
        let pairs: Vec<(isize, isize)> = MirrorIter::new(&dims, &strides, &axes).collect();
        assert_eq!(pairs.len(), extent.iter().product::<usize>());
        for (k, &(ofs, rev)) in pairs.iter().enumerate() {
            let idx = unravel(&extent, k);
            let direct: isize = idx.iter().zip(&strides).map(|(&p, &s)| p as isize * s).sum();
            assert_eq!(ofs, direct);
            assert_eq!(rev, mirror_offset(&dims, &strides, &axes, &idx));
        }
    }

    #[test]
    fn mirror_of_origin_is_origin() {
        let mut iter = MirrorIter::new(&[5], &[1], &[0]);
        assert_eq!(iter.next(), Some((0, 0)));
        assert_eq!(iter.next(), Some((1, 4)));
        assert_eq!(iter.next(), Some((2, 3)));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn fill_hermitian_conjugates_into_mirror() {
        let mut a = StridedArray::<Complex<f64>>::row_major(&[4]);
        a.set(&[0], Complex::new(1.0, 0.0));
        a.set(&[1], Complex::new(2.0, 3.0));
        a.set(&[2], Complex::new(-1.0, 0.0));
        fill_hermitian(&mut a.view_mut(), &[0]);
        assert_eq!(a.get(&[3]), Complex::new(2.0, -3.0));
    }

    #[test]
    fn fold_hartley_combines_parts() {
        let mut spectrum = StridedArray::<Complex<f64>>::row_major(&[3]);
        spectrum.set(&[0], Complex::new(6.0, 0.0));
        spectrum.set(&[1], Complex::new(-1.0, 2.0));
        spectrum.set(&[2], Complex::new(-2.0, 0.0));
        let mut out = StridedArray::<f64>::row_major(&[4]);
        fold_hartley(&spectrum.view(), &mut out.view_mut(), &[0]).unwrap();
        assert_eq!(out.to_row_major_vec(), vec![6.0, 1.0, -2.0, -3.0]);
    }

    #[test]
    fn fold_hartley_rejects_inconsistent_shapes() {
        let spectrum = StridedArray::<Complex<f64>>::row_major(&[2]);
        let mut out = StridedArray::<f64>::row_major(&[4]);
        let err = fold_hartley(&spectrum.view(), &mut out.view_mut(), &[0]).unwrap_err();
        assert!(matches!(
            err,
            FftError::IteratorMismatch {
                forward: 2,
                mirror: 3
            }
        ));
    }
}
