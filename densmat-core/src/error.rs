//! Error types for density-matrix decoding

/// Errors that can occur while decoding or assembling a density matrix
///
/// Every variant is fatal for the decode call that produced it. A record
/// stream that has gone out of step cannot be resynchronized, so no partial
/// result is ever returned alongside one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Stream ended before a record's payload was complete
    TruncatedRecord,
    /// Header values make no sense (non-positive dimension, negative repeats)
    MalformedHeader,
    /// Spin channel count outside {1, 2, 4, 8}
    UnsupportedSpinChannelCount,
    /// A resolved supercell image exceeds the declared repeat counts
    OutOfRangeSupercellImage,
    /// Two entries of one row resolve to the same (orbital, image) position
    DuplicateColumnInRow,
    /// Leading record marker disagrees with the payload size
    RecordMarkerMismatch,
    /// A per-orbital nonzero count is negative
    NegativeRowCount,
    /// A column index is below the 1-based origin
    InvalidColumnIndex,
    /// Size arithmetic would overflow
    ArraySizeOverflow,
    /// Row offsets or array lengths disagree with each other
    InconsistentLayout,
    /// The overlap channel has already been appended
    OverlapAlreadyPresent,
    /// A supplied overlap channel does not match the number of nonzeros
    OverlapLengthMismatch,
}

/// Coarse grouping of [`DecodeError`] variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Byte-level framing problems
    Format,
    /// Row or column layout problems
    Layout,
    /// Decoded values are inconsistent with the header
    Consistency,
    /// The caller used the API out of order
    Usage,
}

impl DecodeError {
    /// Category this error belongs to
    pub const fn category(&self) -> ErrorCategory {
        match self {
            DecodeError::TruncatedRecord
            | DecodeError::RecordMarkerMismatch
            | DecodeError::ArraySizeOverflow => ErrorCategory::Format,
            DecodeError::MalformedHeader
            | DecodeError::UnsupportedSpinChannelCount
            | DecodeError::NegativeRowCount
            | DecodeError::InvalidColumnIndex
            | DecodeError::InconsistentLayout => ErrorCategory::Layout,
            DecodeError::OutOfRangeSupercellImage | DecodeError::DuplicateColumnInRow => {
                ErrorCategory::Consistency
            }
            DecodeError::OverlapAlreadyPresent | DecodeError::OverlapLengthMismatch => {
                ErrorCategory::Usage
            }
        }
    }
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            DecodeError::TruncatedRecord => "Stream ended in the middle of a record",
            DecodeError::MalformedHeader => "Malformed density matrix header",
            DecodeError::UnsupportedSpinChannelCount => "Unsupported spin channel count",
            DecodeError::OutOfRangeSupercellImage => "Supercell image outside declared repeats",
            DecodeError::DuplicateColumnInRow => "Duplicate column in row",
            DecodeError::RecordMarkerMismatch => "Record marker does not match payload size",
            DecodeError::NegativeRowCount => "Negative nonzero count for orbital row",
            DecodeError::InvalidColumnIndex => "Column index below 1-based origin",
            DecodeError::ArraySizeOverflow => "Array size calculation would overflow",
            DecodeError::InconsistentLayout => "Row offsets and array lengths disagree",
            DecodeError::OverlapAlreadyPresent => "Overlap channel already present",
            DecodeError::OverlapLengthMismatch => "Overlap length does not match nonzero count",
        };
        write!(f, "{msg}")
    }
}

/// Result type for decode operations
pub type Result<T> = core::result::Result<T, DecodeError>;
