//! Axis-list normalization.

use smallvec::SmallVec;

use crate::{FftError, Result};

/// Ordered list of in-range axes a transform runs over.
///
/// Built only through [`AxisSet::resolve`], so it is never empty, never
/// longer than the array rank, and every entry is `< rank`. Repeated axes are
/// kept; the transform runs along such an axis once per occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisSet {
    axes: SmallVec<[usize; 8]>,
}

impl AxisSet {
    /// Resolve a caller-supplied axis list against an array of rank `rank`.
    ///
    /// `None` selects every axis in ascending order. Negative entries count
    /// from the end.
    pub fn resolve(rank: usize, axes: Option<&[isize]>) -> Result<Self> {
        let Some(requested) = axes else {
            if rank == 0 {
                return Err(FftError::InvalidAxes {
                    detail: "zero-dimensional arrays have no axes",
                });
            }
            return Ok(Self {
                axes: (0..rank).collect(),
            });
        };
        if requested.is_empty() || requested.len() > rank {
            return Err(FftError::InvalidAxes {
                detail: "bad axes argument",
            });
        }
        let resolved = requested
            .iter()
            .map(|&axis| {
                let shifted = if axis < 0 { axis + rank as isize } else { axis };
                if shifted < 0 || shifted as usize >= rank {
                    Err(FftError::AxisOutOfRange { axis, rank })
                } else {
                    Ok(shifted as usize)
                }
            })
            .collect::<Result<SmallVec<_>>>()?;
        Ok(Self { axes: resolved })
    }

    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.axes
    }

    /// The final axis, along which real/complex transforms halve the extent.
    #[must_use]
    pub fn last(&self) -> usize {
        self.axes[self.axes.len() - 1]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.axes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.axes.iter().copied()
    }
}

/// Shorthand for [`AxisSet::resolve`].
pub fn makeaxes(rank: usize, axes: Option<&[isize]>) -> Result<AxisSet> {
    AxisSet::resolve(rank, axes)
}
