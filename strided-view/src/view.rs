//! Dynamic-rank strided views and the owned array behind them.
//!
//! All three types share a [`Layout`]: `dims`, signed element `strides` and a
//! base `offset` into a flat buffer. Offsets handed to the `*_at` accessors
//! are relative to that base, i.e. `sum(index[i] * strides[i])`.

use std::marker::PhantomData;
use std::ops::{Index, IndexMut};
use std::sync::Arc;

use crate::{Result, StridedError};

/// Order in which a multi-index walk advances its axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Last axis fastest.
    RowMajor,
    /// First axis fastest.
    ColMajor,
}

/// Column-major strides (first index varies fastest).
pub fn col_major_strides(dims: &[usize]) -> Vec<isize> {
    let mut acc = 1isize;
    dims.iter()
        .map(|&d| {
            let s = acc;
            acc *= d as isize;
            s
        })
        .collect()
}

/// Row-major strides (last index varies fastest).
pub fn row_major_strides(dims: &[usize]) -> Vec<isize> {
    let mut strides = col_major_strides(&dims.iter().rev().copied().collect::<Vec<_>>());
    strides.reverse();
    strides
}

/// Call `f` with every multi-index of `dims`, advancing axes in `order`.
fn walk_indices(dims: &[usize], order: Order, mut f: impl FnMut(&[usize])) {
    let total: usize = dims.iter().product();
    let rank = dims.len();
    let mut idx = vec![0usize; rank];
    for _ in 0..total {
        f(&idx);
        let mut step = |d: usize| {
            idx[d] += 1;
            if idx[d] < dims[d] {
                return true;
            }
            idx[d] = 0;
            false
        };
        match order {
            Order::RowMajor => {
                for d in (0..rank).rev() {
                    if step(d) {
                        break;
                    }
                }
            }
            Order::ColMajor => {
                for d in 0..rank {
                    if step(d) {
                        break;
                    }
                }
            }
        }
    }
}

/// Shape, strides and base offset of a strided region.
#[derive(Clone, PartialEq, Eq)]
pub struct Layout {
    dims: Arc<[usize]>,
    strides: Arc<[isize]>,
    offset: isize,
}

impl std::fmt::Debug for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layout")
            .field("dims", &&*self.dims)
            .field("strides", &&*self.strides)
            .field("offset", &self.offset)
            .finish()
    }
}

impl Layout {
    /// Build a layout and check that every element it addresses lies in a
    /// buffer of `len` elements.
    pub fn checked(len: usize, dims: &[usize], strides: &[isize], offset: isize) -> Result<Self> {
        if dims.len() != strides.len() {
            return Err(StridedError::StrideLengthMismatch);
        }
        let layout = Self {
            dims: Arc::from(dims),
            strides: Arc::from(strides),
            offset,
        };
        if layout.is_empty() {
            return Ok(layout);
        }
        let (lo, hi) = layout.extent()?;
        if lo < 0 || hi as usize >= len {
            return Err(StridedError::OffsetOverflow);
        }
        Ok(layout)
    }

    fn contiguous(dims: &[usize], order: Order) -> Self {
        let strides = match order {
            Order::RowMajor => row_major_strides(dims),
            Order::ColMajor => col_major_strides(dims),
        };
        Self {
            dims: Arc::from(dims),
            strides: Arc::from(strides),
            offset: 0,
        }
    }

    /// Lowest and highest absolute buffer offsets the layout touches.
    fn extent(&self) -> Result<(isize, isize)> {
        let mut lo = self.offset;
        let mut hi = self.offset;
        for (&d, &s) in self.dims.iter().zip(self.strides.iter()) {
            if d < 2 {
                continue;
            }
            let span = s
                .checked_mul(d as isize - 1)
                .ok_or(StridedError::OffsetOverflow)?;
            let bound = if span >= 0 { &mut hi } else { &mut lo };
            *bound = bound.checked_add(span).ok_or(StridedError::OffsetOverflow)?;
        }
        Ok((lo, hi))
    }

    /// Reorder axes so that axis `i` of the result is axis `perm[i]` of `self`.
    pub fn permuted(&self, perm: &[usize]) -> Result<Self> {
        let rank = self.dims.len();
        if perm.len() != rank {
            return Err(StridedError::RankMismatch(perm.len(), rank));
        }
        let mut seen = vec![false; rank];
        for &p in perm {
            if p >= rank || std::mem::replace(&mut seen[p], true) {
                return Err(StridedError::InvalidAxis { axis: p, rank });
            }
        }
        Ok(Self {
            dims: perm.iter().map(|&p| self.dims[p]).collect(),
            strides: perm.iter().map(|&p| self.strides[p]).collect(),
            offset: self.offset,
        })
    }

    /// Relative offset of `indices`; panics on a rank mismatch or an
    /// out-of-range index.
    pub fn offset_of(&self, indices: &[usize]) -> isize {
        assert_eq!(indices.len(), self.dims.len(), "wrong number of indices");
        indices
            .iter()
            .zip(self.dims.iter().zip(self.strides.iter()))
            .map(|(&i, (&d, &s))| {
                assert!(i < d, "index {i} out of bounds for dim {d}");
                i as isize * s
            })
            .sum()
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    #[inline]
    pub fn offset(&self) -> isize {
        self.offset
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dims.contains(&0)
    }
}

macro_rules! layout_accessors {
    () => {
        #[inline]
        pub fn layout(&self) -> &Layout {
            &self.layout
        }

        #[inline]
        pub fn dims(&self) -> &[usize] {
            self.layout.dims()
        }

        #[inline]
        pub fn strides(&self) -> &[isize] {
            self.layout.strides()
        }

        #[inline]
        pub fn offset(&self) -> isize {
            self.layout.offset()
        }

        #[inline]
        pub fn ndim(&self) -> usize {
            self.layout.ndim()
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.layout.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.layout.is_empty()
        }
    };
}

/// Borrowed read-only strided view.
pub struct StridedView<'a, T> {
    ptr: *const T,
    layout: Layout,
    _data: PhantomData<&'a [T]>,
}

unsafe impl<T: Sync> Send for StridedView<'_, T> {}
unsafe impl<T: Sync> Sync for StridedView<'_, T> {}

impl<T> Clone for StridedView<'_, T> {
    fn clone(&self) -> Self {
        Self {
            ptr: self.ptr,
            layout: self.layout.clone(),
            _data: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for StridedView<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StridedView").field(&self.layout).finish()
    }
}

impl<'a, T> StridedView<'a, T> {
    pub fn new(data: &'a [T], dims: &[usize], strides: &[isize], offset: isize) -> Result<Self> {
        let layout = Layout::checked(data.len(), dims, strides, offset)?;
        Ok(Self {
            ptr: data.as_ptr().wrapping_offset(offset),
            layout,
            _data: PhantomData,
        })
    }

    layout_accessors!();

    /// Pointer to the element at the base offset.
    #[inline]
    pub fn ptr(&self) -> *const T {
        self.ptr
    }

    pub fn permute(&self, perm: &[usize]) -> Result<StridedView<'a, T>> {
        Ok(Self {
            ptr: self.ptr,
            layout: self.layout.permuted(perm)?,
            _data: PhantomData,
        })
    }
}

impl<T: Copy> StridedView<'_, T> {
    pub fn get(&self, indices: &[usize]) -> T {
        // SAFETY: `offset_of` asserts the index is in bounds.
        unsafe { self.read_at(self.layout.offset_of(indices)) }
    }

    /// # Safety
    /// `ofs` must be the relative offset of an in-bounds index.
    #[inline]
    pub unsafe fn read_at(&self, ofs: isize) -> T {
        *self.ptr.offset(ofs)
    }
}

/// Borrowed writable strided view.
pub struct StridedViewMut<'a, T> {
    ptr: *mut T,
    layout: Layout,
    _data: PhantomData<&'a mut [T]>,
}

unsafe impl<T: Send> Send for StridedViewMut<'_, T> {}

impl<T> std::fmt::Debug for StridedViewMut<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StridedViewMut").field(&self.layout).finish()
    }
}

impl<'a, T> StridedViewMut<'a, T> {
    pub fn new(
        data: &'a mut [T],
        dims: &[usize],
        strides: &[isize],
        offset: isize,
    ) -> Result<Self> {
        let layout = Layout::checked(data.len(), dims, strides, offset)?;
        Ok(Self {
            ptr: data.as_mut_ptr().wrapping_offset(offset),
            layout,
            _data: PhantomData,
        })
    }

    layout_accessors!();

    #[inline]
    pub fn ptr(&self) -> *const T {
        self.ptr.cast_const()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr
    }

    /// Reborrow read-only.
    pub fn as_view(&self) -> StridedView<'_, T> {
        StridedView {
            ptr: self.ptr.cast_const(),
            layout: self.layout.clone(),
            _data: PhantomData,
        }
    }
}

impl<T: Copy> StridedViewMut<'_, T> {
    pub fn get(&self, indices: &[usize]) -> T {
        // SAFETY: `offset_of` asserts the index is in bounds.
        unsafe { self.read_at(self.layout.offset_of(indices)) }
    }

    pub fn set(&mut self, indices: &[usize], value: T) {
        let ofs = self.layout.offset_of(indices);
        // SAFETY: as in `get`.
        unsafe { self.write_at(ofs, value) }
    }

    /// # Safety
    /// `ofs` must be the relative offset of an in-bounds index.
    #[inline]
    pub unsafe fn read_at(&self, ofs: isize) -> T {
        *self.ptr.offset(ofs)
    }

    /// # Safety
    /// `ofs` must be the relative offset of an in-bounds index.
    #[inline]
    pub unsafe fn write_at(&mut self, ofs: isize, value: T) {
        *self.ptr.offset(ofs) = value;
    }
}

/// Owned strided array: a flat buffer plus the [`Layout`] that reads it.
#[derive(Clone)]
pub struct StridedArray<T> {
    data: Vec<T>,
    layout: Layout,
}

impl<T> std::fmt::Debug for StridedArray<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StridedArray").field(&self.layout).finish()
    }
}

impl<T: Clone + Default> StridedArray<T> {
    /// Column-major array of `T::default()`.
    pub fn col_major(dims: &[usize]) -> Self {
        Self::filled(dims, Order::ColMajor)
    }

    /// Row-major array of `T::default()`.
    pub fn row_major(dims: &[usize]) -> Self {
        Self::filled(dims, Order::RowMajor)
    }

    fn filled(dims: &[usize], order: Order) -> Self {
        Self {
            data: vec![T::default(); dims.iter().product()],
            layout: Layout::contiguous(dims, order),
        }
    }
}

impl<T> StridedArray<T> {
    /// Contiguous array whose elements are produced by `f`, called once per
    /// index in `order`.
    pub fn from_fn(dims: &[usize], order: Order, mut f: impl FnMut(&[usize]) -> T) -> Self {
        let mut data = Vec::with_capacity(dims.iter().product());
        walk_indices(dims, order, |idx| data.push(f(idx)));
        Self {
            data,
            layout: Layout::contiguous(dims, order),
        }
    }

    pub fn from_fn_col_major(dims: &[usize], f: impl FnMut(&[usize]) -> T) -> Self {
        Self::from_fn(dims, Order::ColMajor, f)
    }

    pub fn from_fn_row_major(dims: &[usize], f: impl FnMut(&[usize]) -> T) -> Self {
        Self::from_fn(dims, Order::RowMajor, f)
    }

    /// Wrap an existing buffer. Strides may be negative as long as `offset`
    /// leaves room for them.
    pub fn from_parts(
        data: Vec<T>,
        dims: &[usize],
        strides: &[isize],
        offset: isize,
    ) -> Result<Self> {
        let layout = Layout::checked(data.len(), dims, strides, offset)?;
        Ok(Self { data, layout })
    }

    /// Reorder axes without moving data.
    pub fn permute(self, perm: &[usize]) -> Result<Self> {
        let layout = self.layout.permuted(perm)?;
        Ok(Self {
            data: self.data,
            layout,
        })
    }

    layout_accessors!();

    /// Backing buffer in memory order; may hold elements outside the layout.
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn view(&self) -> StridedView<'_, T> {
        StridedView {
            ptr: self.data.as_ptr().wrapping_offset(self.layout.offset),
            layout: self.layout.clone(),
            _data: PhantomData,
        }
    }

    pub fn view_mut(&mut self) -> StridedViewMut<'_, T> {
        StridedViewMut {
            ptr: self.data.as_mut_ptr().wrapping_offset(self.layout.offset),
            layout: self.layout.clone(),
            _data: PhantomData,
        }
    }

    fn storage_index(&self, indices: &[usize]) -> usize {
        (self.layout.offset + self.layout.offset_of(indices)) as usize
    }
}

impl<T: Copy> StridedArray<T> {
    pub fn get(&self, indices: &[usize]) -> T {
        self[indices]
    }

    pub fn set(&mut self, indices: &[usize], value: T) {
        self[indices] = value;
    }

    /// Elements in row-major index order, whatever the layout.
    pub fn to_row_major_vec(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len());
        walk_indices(self.dims(), Order::RowMajor, |idx| out.push(self.get(idx)));
        out
    }
}

impl<T> Index<&[usize]> for StridedArray<T> {
    type Output = T;

    fn index(&self, indices: &[usize]) -> &T {
        &self.data[self.storage_index(indices)]
    }
}

impl<T> IndexMut<&[usize]> for StridedArray<T> {
    fn index_mut(&mut self, indices: &[usize]) -> &mut T {
        let idx = self.storage_index(indices);
        &mut self.data[idx]
    }
}
