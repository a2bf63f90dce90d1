//! Serializable summaries of decoded matrices

use serde::{Deserialize, Serialize};

use densmat_core::{Orientation, SparseDensityMatrix, SpinKind};

use crate::error::Result;

/// Shape and content statistics of a decoded matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixSummary {
    /// Number of orbitals (rows)
    pub orbitals: usize,
    /// Spin treatment
    pub spin: SpinKind,
    /// Spin channels, overlap excluded
    pub spin_channels: usize,
    /// Stored entries
    pub nnz: usize,
    /// Entries in the fullest row
    pub max_row_nnz: usize,
    /// Rows without entries
    pub empty_rows: usize,
    /// Row ownership of the matrix
    pub orientation: Orientation,
    /// Repeat counts from the header
    pub declared_supercell: [u32; 3],
    /// Repeat counts used for image resolution
    pub effective_supercell: [u32; 3],
    /// Number of supercell images
    pub images: usize,
    /// Whether no overlap channel is present
    pub orthogonal: bool,
    /// Sum of the first channel over home-cell diagonal entries
    pub home_trace: f64,
}

impl MatrixSummary {
    /// Collect statistics from a decoded matrix
    pub fn from_matrix(matrix: &SparseDensityMatrix) -> Self {
        let counts = matrix.layout().counts();
        let home_trace = (0..matrix.orbital_count())
            .map(|row| {
                matrix
                    .row_entries(row)
                    .zip(matrix.row_values(row, 0))
                    .filter(|((local, image), _)| *image == 0 && *local as usize == row)
                    .map(|(_, value)| *value)
                    .sum::<f64>()
            })
            .sum();

        Self {
            orbitals: matrix.orbital_count(),
            spin: matrix.spin_kind(),
            spin_channels: matrix.spin_channels(),
            nnz: matrix.local_columns().len(),
            max_row_nnz: counts.iter().copied().max().unwrap_or(0) as usize,
            empty_rows: counts.iter().filter(|&&c| c == 0).count(),
            orientation: matrix.orientation(),
            declared_supercell: matrix.supercell().declared,
            effective_supercell: matrix.supercell().effective,
            images: matrix.supercell().image_count(),
            orthogonal: matrix.is_orthogonal(),
            home_trace,
        }
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::decode_reader;
    use densmat_core::fixtures::encode_density_matrix;
    use densmat_core::{DecodeOptions, MatrixHeader};
    use std::io::Cursor;

    #[test]
    fn test_summary() {
        let header = MatrixHeader {
            orbital_count: 3,
            spin_channels: 1,
            supercell: [3, 1, 1],
        };
        // Row 0: (0), (1 in image 1); row 1: none; row 2: (2)
        let bytes = encode_density_matrix(
            &header,
            &[2, 0, 1],
            &[1, 5, 3],
            &[vec![0.5, 0.1, 0.25]],
        );
        let matrix = decode_reader(Cursor::new(bytes), &DecodeOptions::default()).unwrap();
        let summary = MatrixSummary::from_matrix(&matrix);

        assert_eq!(summary.orbitals, 3);
        assert_eq!(summary.nnz, 3);
        assert_eq!(summary.images, 3);
        assert_eq!(summary.effective_supercell, [3, 1, 1]);
        assert!(!summary.orthogonal);
        assert_eq!(summary.home_trace, 0.75);

        let json = summary.to_json().unwrap();
        let parsed: MatrixSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, summary);
    }
}
