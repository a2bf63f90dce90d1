//! Sequential record stream
//!
//! Fortran sequential unformatted files bracket every record with a 4-byte
//! length marker before and after the payload. The decoders never look at
//! the markers: between two payloads they simply skip 8 bytes (the trailing
//! marker of the previous record plus the leading marker of the next one),
//! and before the very first payload they skip 4. Getting a skip wrong
//! desynchronizes every read after it.

use alloc::vec::Vec;

use crate::error::DecodeError;
use crate::format::constants::{FIRST_RECORD_SKIP, MARKER_SIZE, READ_CHUNK, RECORD_SKIP};
use crate::traits::{ByteSource, RecordElement};

/// Whether leading record markers are checked against payload sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MarkerCheck {
    /// Treat markers as opaque skip bytes
    #[default]
    Ignore,
    /// Compare the 4 bytes preceding each payload with its byte length
    Validate,
}

/// Typed, fixed-count reader over a [`ByteSource`]
#[derive(Debug)]
pub struct RecordStream<S> {
    source: S,
    records_read: usize,
    bytes_consumed: usize,
    marker_check: MarkerCheck,
}

impl<S: ByteSource> RecordStream<S> {
    /// Wrap a source positioned at offset 0
    pub fn new(source: S) -> Self {
        Self {
            source,
            records_read: 0,
            bytes_consumed: 0,
            marker_check: MarkerCheck::Ignore,
        }
    }

    /// Set marker validation
    pub fn with_marker_check(mut self, marker_check: MarkerCheck) -> Self {
        self.marker_check = marker_check;
        self
    }

    /// Number of records read so far
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    /// Bytes consumed from the source so far, markers included
    pub fn bytes_consumed(&self) -> usize {
        self.bytes_consumed
    }

    /// Give back the underlying source
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Skip bytes expected before the next record's payload
    pub fn next_skip(&self) -> usize {
        if self.records_read == 0 {
            FIRST_RECORD_SKIP
        } else {
            RECORD_SKIP
        }
    }

    /// Read the next record, choosing the leading skip from the position
    pub fn read_record<T: RecordElement>(&mut self, count: usize) -> Result<Vec<T>, S::Error> {
        let skip = self.next_skip();
        self.read_fixed(count, skip)
    }

    /// Skip `leading_skip` raw bytes, then read `count` elements of `T`
    ///
    /// Advances the stream by `leading_skip + count * T::SIZE` bytes.
    pub fn read_fixed<T: RecordElement>(
        &mut self,
        count: usize,
        leading_skip: usize,
    ) -> Result<Vec<T>, S::Error> {
        let payload_len = count
            .checked_mul(T::SIZE)
            .ok_or(DecodeError::ArraySizeOverflow)?;

        self.skip_markers(leading_skip, payload_len)?;

        let mut payload = Vec::new();
        while payload.len() < payload_len {
            let start = payload.len();
            let step = (payload_len - start).min(READ_CHUNK);
            payload
                .try_reserve(step)
                .map_err(|_| DecodeError::ArraySizeOverflow)?;
            payload.resize(start + step, 0);
            self.source.read_exact(&mut payload[start..])?;
        }
        self.bytes_consumed += leading_skip + payload_len;
        self.records_read += 1;

        Ok(payload.chunks_exact(T::SIZE).map(T::read_le).collect())
    }

    fn skip_markers(&mut self, leading_skip: usize, payload_len: usize) -> Result<(), S::Error> {
        if self.marker_check == MarkerCheck::Ignore || leading_skip < MARKER_SIZE {
            return self.source.skip(leading_skip);
        }

        self.source.skip(leading_skip - MARKER_SIZE)?;
        let mut marker = [0u8; MARKER_SIZE];
        self.source.read_exact(&mut marker)?;
        if i32::from_le_bytes(marker) as i64 != payload_len as i64 {
            return Err(DecodeError::RecordMarkerMismatch.into());
        }
        Ok(())
    }
}
