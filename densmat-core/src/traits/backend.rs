//! Byte source trait for sequential decoding
//!
//! Decoders never seek. They ask the source for exactly the bytes they need,
//! in file order, so anything that can be read front to back can back a
//! decode: a slice, a file, a memory map or a downloaded buffer.

use crate::error::DecodeError;

/// Trait for sequentially readable byte sources
pub trait ByteSource {
    /// Error type of the source; decode errors must convert into it
    type Error: From<DecodeError>;

    /// Fill `buf` completely from the current position
    ///
    /// A source that runs out of bytes must report
    /// [`DecodeError::TruncatedRecord`] (converted into `Self::Error`).
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Discard `len` bytes from the current position
    ///
    /// Default implementation reads into a small scratch buffer.
    fn skip(&mut self, len: usize) -> Result<(), Self::Error> {
        let mut scratch = [0u8; 64];
        let mut remaining = len;
        while remaining > 0 {
            let step = remaining.min(scratch.len());
            self.read_exact(&mut scratch[..step])?;
            remaining -= step;
        }
        Ok(())
    }
}

/// Byte source over an in-memory slice
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> SliceSource<'a> {
    /// Start reading `data` at offset 0
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Current offset from the start of the slice
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    fn advance(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if len > self.remaining() {
            return Err(DecodeError::TruncatedRecord);
        }
        let start = self.position;
        self.position += len;
        Ok(&self.data[start..self.position])
    }
}

impl ByteSource for SliceSource<'_> {
    type Error = DecodeError;

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), DecodeError> {
        let bytes = self.advance(buf.len())?;
        buf.copy_from_slice(bytes);
        Ok(())
    }

    fn skip(&mut self, len: usize) -> Result<(), DecodeError> {
        self.advance(len).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_source() {
        let data = [1u8, 2, 3, 4, 5];
        let mut source = SliceSource::new(&data);
        let mut buf = [0u8; 2];
        source.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [1, 2]);
        source.skip(1).unwrap();
        assert_eq!(source.position(), 3);
        assert_eq!(source.remaining(), 2);

        let mut big = [0u8; 3];
        assert_eq!(
            source.read_exact(&mut big),
            Err(DecodeError::TruncatedRecord)
        );
        // Failed reads leave the position untouched
        assert_eq!(source.position(), 3);
    }
}
