//! Output array preparation.

use strided_view::StridedArray;

use crate::{DType, FftError, NdArray, Result};

/// Accept a caller-provided destination or allocate a fresh one.
///
/// A provided array must carry `dtype` and have exactly `dims`; its strides
/// are kept as they are. Without one, a zeroed row-major array is allocated.
pub(crate) fn prepare_output<T: Clone + Default>(
    out: Option<NdArray>,
    dtype: DType,
    dims: &[usize],
    take: fn(NdArray) -> std::result::Result<StridedArray<T>, NdArray>,
) -> Result<StridedArray<T>> {
    let Some(array) = out else {
        return Ok(StridedArray::row_major(dims));
    };
    let found = array.dtype();
    let array = take(array).map_err(|_| FftError::OutputMismatch {
        expected: dtype,
        found,
    })?;
    if array.dims() != dims {
        return Err(FftError::OutputShapeMismatch {
            expected: dims.to_vec(),
            found: array.dims().to_vec(),
        });
    }
    Ok(array)
}
