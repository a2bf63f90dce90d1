//! Row layout derived from per-orbital nonzero counts

use alloc::vec::Vec;
use core::ops::Range;

use crate::error::{DecodeError, Result};

/// Per-row nonzero counts and their prefix-sum offsets
///
/// `offsets` has one more entry than `counts`; `offsets[0] == 0` and the last
/// entry is the total number of nonzeros.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RowLayout {
    counts: Vec<u32>,
    offsets: Vec<usize>,
}

impl RowLayout {
    /// Build a layout from the raw counts record
    pub fn from_counts(raw: &[i32]) -> Result<Self> {
        let mut counts = Vec::with_capacity(raw.len());
        let mut offsets = Vec::with_capacity(raw.len() + 1);
        let mut total: usize = 0;
        offsets.push(total);

        for &count in raw {
            if count < 0 {
                return Err(DecodeError::NegativeRowCount);
            }
            total = total
                .checked_add(count as usize)
                .ok_or(DecodeError::ArraySizeOverflow)?;
            counts.push(count as u32);
            offsets.push(total);
        }

        Ok(Self { counts, offsets })
    }

    /// Build a layout from row offsets that are already known to be valid
    pub(crate) fn from_offsets(offsets: Vec<usize>) -> Self {
        let counts = offsets.windows(2).map(|w| (w[1] - w[0]) as u32).collect();
        Self { counts, offsets }
    }

    /// Nonzero count of every row
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Prefix-sum offsets, `rows() + 1` entries
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.counts.len()
    }

    /// Total number of nonzeros
    pub fn nnz(&self) -> usize {
        self.offsets.last().copied().unwrap_or(0)
    }

    /// Entry range of a row in the flat column/value arrays
    pub fn row_range(&self, row: usize) -> Range<usize> {
        self.offsets[row]..self.offsets[row + 1]
    }
}
