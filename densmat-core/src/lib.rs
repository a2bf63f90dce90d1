#![no_std]

//! densmat-core - Spin density-matrix record layout and sparse assembly
//!
//! This crate decodes the sequential unformatted record layout written by
//! the simulation code and assembles it into an owned sparse matrix. It
//! performs no I/O of its own: bytes come in through a [`ByteSource`].
//!
//! Pipeline, in file order:
//!
//! 1. [`decode::decode_header`]
//! 2. [`decode::decode_row_layout`]
//! 3. [`decode::decode_columns`]
//! 4. [`decode::decode_values`]
//!
//! followed by [`spin::convert_spin_layout`], [`supercell::resolve_images`]
//! and [`SparseDensityMatrix::augment_overlap`].

extern crate alloc;

pub mod decode;
pub mod error;
pub mod format;
pub mod matrix;
pub mod record;
pub mod spin;
pub mod supercell;
pub mod traits;
pub mod validation;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use decode::{decode_density_matrix, decode_raw, DecodeOptions, RawDensityMatrix};
pub use error::*;
pub use format::*;
pub use matrix::{Orientation, SparseDensityMatrix};
pub use record::{MarkerCheck, RecordStream};
pub use spin::{CollinearLayout, SpinKind};
pub use supercell::{ImageOrder, SupercellInfo, SyntheticGeometry};
pub use traits::*;
