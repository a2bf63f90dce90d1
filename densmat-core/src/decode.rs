//! Stage decoders for density-matrix files
//!
//! The stages must run in file order over one [`RecordStream`]: each stage
//! needs the counts produced by the previous one to know how many bytes to
//! read next.

use alloc::vec::Vec;

use crate::error::DecodeError;
use crate::format::constants::HEADER_WORDS;
use crate::format::{MatrixHeader, RowLayout};
use crate::matrix::{Orientation, SparseDensityMatrix};
use crate::record::{MarkerCheck, RecordStream};
use crate::spin::{convert_spin_layout, CollinearLayout};
use crate::supercell::{resolve_images, ImageOrder};
use crate::traits::ByteSource;
use crate::validation::validate_structure;

/// Read the header record (first record, leading skip 4)
pub fn decode_header<S: ByteSource>(
    stream: &mut RecordStream<S>,
) -> Result<MatrixHeader, S::Error> {
    let words: Vec<i32> = stream.read_record(HEADER_WORDS)?;
    Ok(MatrixHeader::from_words(&words)?)
}

/// Read the per-orbital nonzero counts record
pub fn decode_row_layout<S: ByteSource>(
    stream: &mut RecordStream<S>,
    header: &MatrixHeader,
) -> Result<RowLayout, S::Error> {
    let counts: Vec<i32> = stream.read_record(header.orbitals())?;
    Ok(RowLayout::from_counts(&counts)?)
}

/// Read one column record per row and shift indices to 0-based
pub fn decode_columns<S: ByteSource>(
    stream: &mut RecordStream<S>,
    layout: &RowLayout,
) -> Result<Vec<i64>, S::Error> {
    let mut columns = Vec::new();
    for &count in layout.counts() {
        let row: Vec<i32> = stream.read_record(count as usize)?;
        for col in row {
            let col = col as i64 - 1;
            if col < 0 {
                return Err(DecodeError::InvalidColumnIndex.into());
            }
            columns.push(col);
        }
    }
    Ok(columns)
}

/// Read the value records, channel-major and row-minor
pub fn decode_values<S: ByteSource>(
    stream: &mut RecordStream<S>,
    header: &MatrixHeader,
    layout: &RowLayout,
) -> Result<Vec<Vec<f64>>, S::Error> {
    let mut channels = Vec::with_capacity(header.channels());
    for _ in 0..header.channels() {
        let mut values = Vec::new();
        for &count in layout.counts() {
            let row: Vec<f64> = stream.read_record(count as usize)?;
            values.extend_from_slice(&row);
        }
        channels.push(values);
    }
    Ok(channels)
}

/// Matrix exactly as stored in the file, before any transform
#[derive(Debug, Clone, PartialEq)]
pub struct RawDensityMatrix {
    /// Header record
    pub header: MatrixHeader,
    /// Row counts and offsets
    pub layout: RowLayout,
    /// Global 0-based column of every entry
    pub columns: Vec<i64>,
    /// One value array per stored spin channel
    pub channels: Vec<Vec<f64>>,
}

impl RawDensityMatrix {
    /// Total number of nonzeros
    pub fn nnz(&self) -> usize {
        self.layout.nnz()
    }

    /// Largest column index referenced, if any entry exists
    pub fn max_column(&self) -> Option<i64> {
        self.columns.iter().copied().max()
    }
}

/// Run the four stage decoders in file order
pub fn decode_raw<S: ByteSource>(
    stream: &mut RecordStream<S>,
) -> Result<RawDensityMatrix, S::Error> {
    let header = decode_header(stream)?;
    let layout = decode_row_layout(stream, &header)?;
    let columns = decode_columns(stream, &layout)?;
    let channels = decode_values(stream, &header, &layout)?;

    Ok(RawDensityMatrix {
        header,
        layout,
        columns,
        channels,
    })
}

/// Options controlling the transforms applied after raw decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecodeOptions {
    /// Record marker validation
    pub marker_check: MarkerCheck,
    /// Canonical form of two-channel (collinear) matrices
    pub collinear_layout: CollinearLayout,
    /// Order in which the file enumerates supercell images
    pub image_order: ImageOrder,
    /// Row ownership of the finished matrix
    pub orientation: Orientation,
}

impl DecodeOptions {
    /// Set record marker validation
    pub fn with_marker_check(mut self, marker_check: MarkerCheck) -> Self {
        self.marker_check = marker_check;
        self
    }

    /// Set the canonical collinear layout
    pub fn with_collinear_layout(mut self, collinear_layout: CollinearLayout) -> Self {
        self.collinear_layout = collinear_layout;
        self
    }

    /// Set the image enumeration order used by the file
    pub fn with_image_order(mut self, image_order: ImageOrder) -> Self {
        self.image_order = image_order;
        self
    }

    /// Set the orientation of the finished matrix
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }
}

/// Decode a complete file into a finished [`SparseDensityMatrix`]
pub fn decode_density_matrix<S: ByteSource>(
    source: S,
    options: &DecodeOptions,
) -> Result<SparseDensityMatrix, S::Error> {
    let mut stream = RecordStream::new(source).with_marker_check(options.marker_check);
    let raw = decode_raw(&mut stream)?;
    Ok(assemble(raw, options)?)
}

/// Apply the spin, supercell and overlap transforms to a raw matrix
pub fn assemble(
    raw: RawDensityMatrix,
    options: &DecodeOptions,
) -> crate::error::Result<SparseDensityMatrix> {
    let RawDensityMatrix {
        header,
        layout,
        columns,
        channels,
    } = raw;

    let (kind, channels) = convert_spin_layout(channels, options.collinear_layout)?;
    let resolved = resolve_images(&header, &columns, options.image_order)?;

    let mut matrix = SparseDensityMatrix::from_parts(header, layout, resolved, kind, channels);
    matrix.augment_overlap(options.orientation)?;
    validate_structure(&matrix)?;
    Ok(matrix)
}
