//! Dynamic-rank strided views over flat buffers.
//!
//! A view reads a flat buffer through `dims`, signed element `strides` and a
//! base `offset`, so transposed, reversed and offset layouts are all
//! described without copying.

pub mod view;

pub use view::{
    col_major_strides, row_major_strides, Layout, Order, StridedArray, StridedView,
    StridedViewMut,
};

/// Errors raised while building or reshaping a view.
#[derive(Debug, thiserror::Error)]
pub enum StridedError {
    /// A permutation or operand has the wrong number of axes.
    #[error("rank mismatch: {0} vs {1}")]
    RankMismatch(usize, usize),

    #[error("invalid axis {axis} for rank {rank}")]
    InvalidAxis { axis: usize, rank: usize },

    #[error("stride and dims length mismatch")]
    StrideLengthMismatch,

    /// Offset arithmetic overflowed or left the buffer.
    #[error("offset overflow while computing pointer")]
    OffsetOverflow,
}

pub type Result<T> = std::result::Result<T, StridedError>;
