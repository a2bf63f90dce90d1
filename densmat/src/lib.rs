//! densmat - Spin density-matrix file reader
//!
//! This library reads the sparse, spin-resolved density matrix written by the
//! simulation code as a sequential unformatted file and hands back an owned
//! [`SparseDensityMatrix`].
//!
//! ## Architecture
//!
//! densmat splits format definitions from I/O:
//!
//! - **densmat-core**: record layout, decoders and sparse assembly (no I/O)
//! - **densmat**: transports, file entry points, batch decoding and summaries
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use densmat::{DecodeOptions, DmFile, SparseMatrix};
//!
//! fn example() -> Result<(), densmat::Error> {
//!     let matrix = DmFile::open("calc/aiida.DM")
//!         .with_options(DecodeOptions::default())
//!         .read()?;
//!
//!     let (rows, cols) = matrix.dimensions();
//!     println!("{rows} x {cols}, {} stored entries", matrix.nnz());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **mmap**: memory-mapped transport, tried before buffered reads
//! - **http**: download remote files before decoding
//! - **serde**: serializable summaries and matrices
//! - **cli**: the `dm_info` example

// Re-export core abstractions
pub use densmat_core::{
    // Pipeline
    decode_density_matrix, decode_raw, DecodeOptions, RawDensityMatrix,
    // Data model
    MatrixHeader, RowLayout, SparseDensityMatrix, SupercellInfo, SparseMatrix,
    // Configuration
    CollinearLayout, ImageOrder, MarkerCheck, Orientation, SpinKind,
    // Error handling
    DecodeError, ErrorCategory,
};

pub mod batch;
pub mod error;
pub mod reader;
pub mod source;
#[cfg(feature = "serde")]
pub mod summary;
pub mod transport;

pub use error::{Error, Result};
pub use reader::{decode_reader, read_density_matrix, read_density_matrix_in, DmFile};
pub use source::ReaderSource;
pub use transport::{FallbackTransport, LocalFile, Transport};

#[cfg(feature = "mmap")]
pub use transport::MmapFile;

#[cfg(feature = "http")]
pub use transport::http::HttpTransport;

#[cfg(feature = "serde")]
pub use summary::MatrixSummary;
