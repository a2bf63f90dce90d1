//! Spin channel conversion from file storage to canonical order
//!
//! The file stores one real value per channel per entry. The canonical
//! layout differs by channel count:
//!
//! | channels | kind          | canonical channels                                   |
//! |----------|---------------|------------------------------------------------------|
//! | 1        | unpolarized   | total                                                |
//! | 2        | polarized     | total, z-polarization (or up, down)                  |
//! | 4        | non-collinear | Re uu, Re dd, Re ud, Im ud                           |
//! | 8        | spin-orbit    | Re uu, Re dd, Re ud, Im ud, Im uu, Im dd, Re du, Im du |
//!
//! The imaginary up-down components are stored with the opposite sign
//! convention, so they are negated on the way in.

use alloc::vec::Vec;

use crate::error::{DecodeError, Result};

/// Spin treatment implied by the channel count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpinKind {
    Unpolarized,
    Polarized,
    NonCollinear,
    SpinOrbit,
}

impl SpinKind {
    /// Map a stored channel count to a spin kind
    pub fn from_channels(channels: usize) -> Result<Self> {
        match channels {
            1 => Ok(SpinKind::Unpolarized),
            2 => Ok(SpinKind::Polarized),
            4 => Ok(SpinKind::NonCollinear),
            8 => Ok(SpinKind::SpinOrbit),
            _ => Err(DecodeError::UnsupportedSpinChannelCount),
        }
    }

    /// Number of real channels for this kind
    pub const fn channels(&self) -> usize {
        match self {
            SpinKind::Unpolarized => 1,
            SpinKind::Polarized => 2,
            SpinKind::NonCollinear => 4,
            SpinKind::SpinOrbit => 8,
        }
    }
}

impl core::fmt::Display for SpinKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SpinKind::Unpolarized => write!(f, "unpolarized"),
            SpinKind::Polarized => write!(f, "polarized"),
            SpinKind::NonCollinear => write!(f, "non-collinear"),
            SpinKind::SpinOrbit => write!(f, "spin-orbit"),
        }
    }
}

/// Canonical form of a two-channel matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CollinearLayout {
    /// (up + down, up - down)
    #[default]
    ChargeMagnetization,
    /// (up, down) as stored
    UpDown,
}

/// Source channel and sign of every canonical channel
struct ChannelMap {
    source: &'static [usize],
    sign: &'static [f64],
}

const NON_COLLINEAR: ChannelMap = ChannelMap {
    source: &[0, 1, 2, 3],
    sign: &[1.0, 1.0, 1.0, -1.0],
};

const SPIN_ORBIT: ChannelMap = ChannelMap {
    source: &[0, 1, 2, 3, 4, 5, 6, 7],
    sign: &[1.0, 1.0, 1.0, -1.0, 1.0, 1.0, 1.0, -1.0],
};

/// Relabel decoded channels into the canonical layout
///
/// Entry order, row structure and column indices are untouched; only the
/// per-entry channel values change.
pub fn convert_spin_layout(
    channels: Vec<Vec<f64>>,
    collinear: CollinearLayout,
) -> Result<(SpinKind, Vec<Vec<f64>>)> {
    let kind = SpinKind::from_channels(channels.len())?;

    let converted = match kind {
        SpinKind::Unpolarized => channels,
        SpinKind::Polarized => match collinear {
            CollinearLayout::UpDown => channels,
            CollinearLayout::ChargeMagnetization => {
                let (up, down) = (&channels[0], &channels[1]);
                let total = up.iter().zip(down).map(|(u, d)| u + d).collect();
                let polarization = up.iter().zip(down).map(|(u, d)| u - d).collect();
                alloc::vec![total, polarization]
            }
        },
        SpinKind::NonCollinear => remap(channels, &NON_COLLINEAR),
        SpinKind::SpinOrbit => remap(channels, &SPIN_ORBIT),
    };

    Ok((kind, converted))
}

fn remap(mut channels: Vec<Vec<f64>>, map: &ChannelMap) -> Vec<Vec<f64>> {
    let mut out = Vec::with_capacity(map.source.len());
    for (&source, &sign) in map.source.iter().zip(map.sign) {
        let mut values = core::mem::take(&mut channels[source]);
        if sign < 0.0 {
            values.iter_mut().for_each(|v| *v = -*v);
        }
        out.push(values);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_unpolarized_identity() {
        let (kind, out) =
            convert_spin_layout(vec![vec![1.0, 2.0]], CollinearLayout::default()).unwrap();
        assert_eq!(kind, SpinKind::Unpolarized);
        assert_eq!(out, vec![vec![1.0, 2.0]]);
    }

    #[test]
    fn test_polarized_charge_magnetization() {
        let (kind, out) = convert_spin_layout(
            vec![vec![1.0, 0.5], vec![0.25, 0.5]],
            CollinearLayout::ChargeMagnetization,
        )
        .unwrap();
        assert_eq!(kind, SpinKind::Polarized);
        assert_eq!(out, vec![vec![1.25, 1.0], vec![0.75, 0.0]]);
    }

    #[test]
    fn test_polarized_up_down() {
        let channels = vec![vec![1.0], vec![2.0]];
        let (_, out) = convert_spin_layout(channels.clone(), CollinearLayout::UpDown).unwrap();
        assert_eq!(out, channels);
    }

    #[test]
    fn test_non_collinear_conjugates_off_diagonal() {
        let channels = vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]];
        let (kind, out) = convert_spin_layout(channels, CollinearLayout::default()).unwrap();
        assert_eq!(kind, SpinKind::NonCollinear);
        assert_eq!(out, vec![vec![1.0], vec![2.0], vec![3.0], vec![-4.0]]);
    }

    #[test]
    fn test_spin_orbit() {
        let channels: Vec<Vec<f64>> = (0..8).map(|c| vec![c as f64 + 1.0]).collect();
        let (kind, out) = convert_spin_layout(channels, CollinearLayout::default()).unwrap();
        assert_eq!(kind, SpinKind::SpinOrbit);
        let flat: Vec<f64> = out.iter().map(|c| c[0]).collect();
        assert_eq!(flat, vec![1.0, 2.0, 3.0, -4.0, 5.0, 6.0, 7.0, -8.0]);
    }

    #[test]
    fn test_unsupported_count() {
        let result = convert_spin_layout(vec![vec![1.0]; 3], CollinearLayout::default());
        assert_eq!(result, Err(DecodeError::UnsupportedSpinChannelCount));
    }
}
