//! Byte source over any `std::io::Read`

use std::io::{self, Read};

use densmat_core::{ByteSource, DecodeError};

use crate::error::Error;

/// Adapts a reader to the core [`ByteSource`] trait
///
/// An early end of stream surfaces as [`DecodeError::TruncatedRecord`]; every
/// other I/O failure is passed through as [`Error::Io`].
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

fn map_read_error(err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        Error::Decode(DecodeError::TruncatedRecord)
    } else {
        Error::Io(err)
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    type Error = Error;

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        self.reader.read_exact(buf).map_err(map_read_error)
    }

    fn skip(&mut self, len: usize) -> Result<(), Error> {
        let skipped = io::copy(&mut (&mut self.reader).take(len as u64), &mut io::sink())
            .map_err(map_read_error)?;
        if skipped < len as u64 {
            return Err(Error::Decode(DecodeError::TruncatedRecord));
        }
        Ok(())
    }
}
