//! Record layout definitions for density-matrix files
//!
//! Pure data definitions for the on-disk layout. No I/O happens here.

pub mod constants;
pub mod header;
pub mod layout;

pub use header::MatrixHeader;
pub use layout::RowLayout;
