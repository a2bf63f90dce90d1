//! Abstract interfaces used by the decoders
//!
//! The byte source seam lets the no_std decoders run over an in-memory slice
//! or, through the std crate, over any reader.

pub mod backend;
pub mod element;
pub mod matrix;

pub use backend::{ByteSource, SliceSource};
pub use element::RecordElement;
pub use matrix::SparseMatrix;
