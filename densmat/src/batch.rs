//! Parallel decoding of independent files
//!
//! Decode calls share nothing, so a set of files can be spread over the
//! rayon pool. Every file gets its own stream and its own result; one
//! failure does not affect the others.

use rayon::prelude::*;
use tracing::warn;

use densmat_core::{DecodeOptions, SparseDensityMatrix};

use crate::error::Result;
use crate::reader::DmFile;
use crate::transport::{FallbackTransport, Transport};

/// Decode many locations through the default transport chain
///
/// Results are returned in input order.
pub fn decode_many<S: AsRef<str> + Sync>(
    locations: &[S],
    options: &DecodeOptions,
) -> Vec<Result<SparseDensityMatrix>> {
    decode_many_with(&FallbackTransport::default(), locations, options)
}

/// Decode many locations through one shared transport
pub fn decode_many_with<T: Transport + ?Sized, S: AsRef<str> + Sync>(
    transport: &T,
    locations: &[S],
    options: &DecodeOptions,
) -> Vec<Result<SparseDensityMatrix>> {
    locations
        .par_iter()
        .map(|location| {
            let file = DmFile::at(location.as_ref()).with_options(*options);
            let result = file.read_with(transport);
            if let Err(err) = &result {
                warn!(location = file.location(), error = %err, "failed to decode");
            }
            result
        })
        .collect()
}
