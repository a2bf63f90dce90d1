//! Test fixtures: encoders for the sequential record layout
//!
//! Only compiled for tests or with the `fixtures` feature. These produce
//! byte images that the decoders can consume; they are not a general
//! purpose writer.

use alloc::vec::Vec;

use crate::format::MatrixHeader;
use crate::traits::RecordElement;

/// Builds a byte image of marker-bracketed records
#[derive(Debug, Default, Clone)]
pub struct RecordWriter {
    bytes: Vec<u8>,
}

impl RecordWriter {
    /// Create an empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record: marker, payload, marker
    pub fn record<T: RecordElement>(&mut self, values: &[T]) -> &mut Self {
        let marker = ((values.len() * T::SIZE) as i32).to_le_bytes();
        self.bytes.extend_from_slice(&marker);
        for &value in values {
            self.bytes
                .extend_from_slice(bytemuck::bytes_of(&value.to_le()));
        }
        self.bytes.extend_from_slice(&marker);
        self
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether nothing has been written
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Take the byte image
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

/// Encode a whole density-matrix file
///
/// `columns` are the flat 1-based on-disk column indices, row after row.
/// `channels` holds one flat value array per spin channel.
pub fn encode_density_matrix(
    header: &MatrixHeader,
    counts: &[i32],
    columns: &[i32],
    channels: &[Vec<f64>],
) -> Vec<u8> {
    let mut writer = RecordWriter::new();
    writer.record(&header.to_words());
    writer.record(counts);

    let mut start = 0;
    for &count in counts {
        let end = start + count as usize;
        writer.record(&columns[start..end]);
        start = end;
    }

    for channel in channels {
        let mut start = 0;
        for &count in counts {
            let end = start + count as usize;
            writer.record(&channel[start..end]);
            start = end;
        }
    }

    writer.finish()
}
