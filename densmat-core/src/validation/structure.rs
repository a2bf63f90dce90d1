//! Invariant checks for row layouts and assembled matrices

use crate::error::{DecodeError, Result};
use crate::matrix::SparseDensityMatrix;

/// Validate a prefix-sum offset array against a nonzero count
///
/// Offsets must start at zero, never decrease and end at `nnz`.
pub fn validate_row_offsets(offsets: &[usize], nnz: usize) -> Result<()> {
    if offsets.first() != Some(&0) || offsets.last() != Some(&nnz) {
        return Err(DecodeError::InconsistentLayout);
    }
    if offsets.windows(2).any(|w| w[0] > w[1]) {
        return Err(DecodeError::InconsistentLayout);
    }
    Ok(())
}

/// Validate array lengths and per-row uniqueness of a finished matrix
pub fn validate_structure(matrix: &SparseDensityMatrix) -> Result<()> {
    let nnz = matrix.local_columns().len();
    validate_row_offsets(matrix.row_offsets(), nnz)?;

    if matrix.images().len() != nnz || matrix.channels().iter().any(|c| c.len() != nnz) {
        return Err(DecodeError::InconsistentLayout);
    }

    let images = matrix.supercell().image_count() as u32;
    if matrix.images().iter().any(|&i| i >= images) {
        return Err(DecodeError::OutOfRangeSupercellImage);
    }

    for row in 0..matrix.orbital_count() {
        let mut previous = None;
        for (local, image) in matrix.row_entries(row) {
            let key = (image, local);
            if previous.is_some_and(|p| p >= key) {
                return Err(DecodeError::DuplicateColumnInRow);
            }
            previous = Some(key);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_row_offsets() {
        assert_eq!(validate_row_offsets(&[0, 2, 2, 5], 5), Ok(()));
        assert_eq!(validate_row_offsets(&[0], 0), Ok(()));
        assert_eq!(
            validate_row_offsets(&[0, 3, 2], 2),
            Err(DecodeError::InconsistentLayout)
        );
        assert_eq!(
            validate_row_offsets(&[1, 2], 2),
            Err(DecodeError::InconsistentLayout)
        );
        assert_eq!(
            validate_row_offsets(&[0, 2], 3),
            Err(DecodeError::InconsistentLayout)
        );
    }
}
