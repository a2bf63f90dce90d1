//! Layout constants for the sequential unformatted record convention

/// Size of one record length marker in bytes
pub const MARKER_SIZE: usize = 4;

/// Bytes to skip before the first record's payload (its leading marker)
pub const FIRST_RECORD_SKIP: usize = MARKER_SIZE;

/// Bytes to skip between two payloads (trailing + leading marker)
pub const RECORD_SKIP: usize = 2 * MARKER_SIZE;

/// Number of 32-bit words in the header record
pub const HEADER_WORDS: usize = 5;

/// Largest payload slice read at once; buffers grow only as bytes arrive
pub const READ_CHUNK: usize = 64 * 1024;

/// Spin channel counts the decoder understands
pub const SUPPORTED_SPIN_CHANNELS: [u32; 4] = [1, 2, 4, 8];

/// Conventional file name of the density matrix inside a calculation folder
pub const DEFAULT_FILE_NAME: &str = "aiida.DM";
