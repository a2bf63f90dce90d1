//! Structural validation of decoded matrices
//!
//! Pure checks over the assembled arrays, no I/O.

pub mod structure;

pub use structure::{validate_row_offsets, validate_structure};
