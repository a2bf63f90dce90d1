//! Header record of a density-matrix file
//!
//! The header is the first record in the file: five 32-bit integers holding
//! the orbital count, the number of spin channels and the supercell repeat
//! counts along the three lattice directions.

use super::constants::{HEADER_WORDS, SUPPORTED_SPIN_CHANNELS};
use crate::error::{DecodeError, Result};

/// Decoded header record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatrixHeader {
    /// Number of orbitals (matrix dimension)
    pub orbital_count: u32,
    /// Number of stored real components per entry
    pub spin_channels: u32,
    /// Supercell repeat counts along each lattice direction
    pub supercell: [u32; 3],
}

impl MatrixHeader {
    /// Build a header from the raw words of the header record
    ///
    /// Word order is `[orbital_count, spin_channels, nsc_x, nsc_y, nsc_z]`.
    pub fn from_words(words: &[i32]) -> Result<Self> {
        if words.len() < HEADER_WORDS {
            return Err(DecodeError::TruncatedRecord);
        }

        let orbital_count = words[0];
        if orbital_count <= 0 {
            return Err(DecodeError::MalformedHeader);
        }

        let spin_channels = words[1];
        if spin_channels <= 0 || !SUPPORTED_SPIN_CHANNELS.contains(&(spin_channels as u32)) {
            return Err(DecodeError::UnsupportedSpinChannelCount);
        }

        let mut supercell = [0u32; 3];
        for (axis, &count) in words[2..HEADER_WORDS].iter().enumerate() {
            if count < 0 {
                return Err(DecodeError::MalformedHeader);
            }
            supercell[axis] = count as u32;
        }

        Ok(Self {
            orbital_count: orbital_count as u32,
            spin_channels: spin_channels as u32,
            supercell,
        })
    }

    /// Raw header words, in file order
    pub fn to_words(&self) -> [i32; HEADER_WORDS] {
        [
            self.orbital_count as i32,
            self.spin_channels as i32,
            self.supercell[0] as i32,
            self.supercell[1] as i32,
            self.supercell[2] as i32,
        ]
    }

    /// Orbital count as an index type
    pub fn orbitals(&self) -> usize {
        self.orbital_count as usize
    }

    /// Spin channel count as an index type
    pub fn channels(&self) -> usize {
        self.spin_channels as usize
    }

    /// Whether the file declares any supercell extent at all
    pub fn supercell_declared(&self) -> bool {
        self.supercell.iter().any(|&n| n != 0)
    }
}
