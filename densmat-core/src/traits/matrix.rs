//! Read access to an assembled sparse matrix

use alloc::vec::Vec;

/// Format-agnostic read access to a sparse, multi-channel matrix
pub trait SparseMatrix {
    /// Get all channel values at a position, if the entry is stored
    ///
    /// `col` addresses the supercell-wide column space, i.e.
    /// `image * orbitals + local_orbital`.
    fn get_element(&self, row: usize, col: usize) -> Option<Vec<f64>>;

    /// Get matrix dimensions as (rows, supercell-wide columns)
    fn dimensions(&self) -> (usize, usize);

    /// Get number of stored entries
    fn nnz(&self) -> usize;
}
