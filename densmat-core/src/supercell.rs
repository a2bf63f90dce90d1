//! Supercell image resolution
//!
//! Column indices beyond the home cell address orbitals in periodic images:
//! `image = col / orbitals`, `local = col % orbitals`. The image index is
//! kept per entry rather than folded away, together with a table of the
//! integer lattice offset of every image.
//!
//! Images are enumerated over a synthetic geometry: the orbitals placed as
//! pseudo-sites on a 1-D line, repeated along the three lattice directions.
//! Along an axis with `r` repeats the offsets run over `-(r/2) ..= (r-1)/2`.

use alloc::vec::Vec;
use core::ops::RangeInclusive;

use hashbrown::HashMap;

use crate::error::{DecodeError, Result};
use crate::format::MatrixHeader;

/// Order in which the file enumerates supercell images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImageOrder {
    /// Home cell first, then lexicographic by signed offset (axis 1 major)
    #[default]
    HomeFirst,
    /// Axis 1 fastest, every axis starting at its most negative offset
    AxisMinorCentered,
}

/// Offsets spanned by an axis with `repeats` images
pub fn axis_offsets(repeats: u32) -> RangeInclusive<i32> {
    let repeats = repeats.max(1) as i32;
    -(repeats / 2)..=(repeats - 1) / 2
}

/// Orbitals on a line, repeated along three lattice directions
///
/// Lattice vectors are `(orbitals, 0, 0)`, `(0, 1, 0)` and `(0, 0, 1)`;
/// orbital `i` of the home cell sits at `(i, 0, 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticGeometry {
    orbitals: u32,
    repeats: [u32; 3],
}

impl SyntheticGeometry {
    /// Create a geometry; zero repeat counts are treated as one
    pub fn new(orbitals: u32, repeats: [u32; 3]) -> Self {
        Self {
            orbitals,
            repeats: repeats.map(|r| r.max(1)),
        }
    }

    /// Repeat counts, each at least one
    pub fn repeats(&self) -> [u32; 3] {
        self.repeats
    }

    /// Total number of images, home cell included
    pub fn image_count(&self) -> Result<u32> {
        self.repeats
            .iter()
            .try_fold(1u32, |acc, &r| acc.checked_mul(r))
            .ok_or(DecodeError::ArraySizeOverflow)
    }

    /// Lattice offsets of every image in the given order
    pub fn offsets(&self, order: ImageOrder) -> Vec<[i32; 3]> {
        let [a, b, c] = self.repeats;
        let mut offsets = Vec::new();

        match order {
            ImageOrder::HomeFirst => {
                offsets.push([0, 0, 0]);
                for x in axis_offsets(a) {
                    for y in axis_offsets(b) {
                        for z in axis_offsets(c) {
                            if [x, y, z] != [0, 0, 0] {
                                offsets.push([x, y, z]);
                            }
                        }
                    }
                }
            }
            ImageOrder::AxisMinorCentered => {
                for z in axis_offsets(c) {
                    for y in axis_offsets(b) {
                        for x in axis_offsets(a) {
                            offsets.push([x, y, z]);
                        }
                    }
                }
            }
        }

        offsets
    }

    /// Cartesian position of an orbital's pseudo-site in an image
    pub fn site_position(&self, orbital: u32, offset: [i32; 3]) -> [f64; 3] {
        [
            orbital as f64 + offset[0] as f64 * self.orbitals as f64,
            offset[1] as f64,
            offset[2] as f64,
        ]
    }
}

/// Supercell description attached to a decoded matrix
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SupercellInfo {
    /// Repeat counts as written in the header
    pub declared: [u32; 3],
    /// Repeat counts actually used for enumeration
    pub effective: [u32; 3],
    /// Lattice offset of every image, indexed by image
    pub offsets: Vec<[i32; 3]>,
}

impl SupercellInfo {
    /// Home cell only
    pub fn home_only(declared: [u32; 3]) -> Self {
        Self {
            declared,
            effective: [1, 1, 1],
            offsets: alloc::vec![[0, 0, 0]],
        }
    }

    /// Number of images
    pub fn image_count(&self) -> usize {
        self.offsets.len()
    }

    /// Image holding the opposite offset of every image
    ///
    /// Opposite offsets wrap periodically per axis, so on an axis with an
    /// even repeat count the outermost image is its own mirror. `None` only
    /// if `offsets` does not cover the effective repeats.
    pub fn mirror_table(&self) -> Vec<Option<u32>> {
        let index: HashMap<[i32; 3], u32> = self
            .offsets
            .iter()
            .enumerate()
            .map(|(i, &offset)| (offset, i as u32))
            .collect();

        self.offsets
            .iter()
            .map(|offset| {
                let mirrored: [i32; 3] = core::array::from_fn(|axis| {
                    wrap_offset(-offset[axis], self.effective[axis])
                });
                index.get(&mirrored).copied()
            })
            .collect()
    }
}

/// Fold an offset back into `axis_offsets(repeats)`
fn wrap_offset(offset: i32, repeats: u32) -> i32 {
    let repeats = repeats.max(1) as i32;
    let low = repeats / 2;
    (offset + low).rem_euclid(repeats) - low
}

/// Per-entry local orbital and image index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    /// Local orbital of every entry
    pub local: Vec<u32>,
    /// Image index of every entry, into `supercell.offsets`
    pub image: Vec<u32>,
    /// Image table
    pub supercell: SupercellInfo,
    /// Whether the image decomposition ran
    pub triggered: bool,
}

/// Whether any column needs to be decomposed into (orbital, image)
///
/// True when the header declares a supercell or a column lies beyond the
/// home cell.
pub fn needs_resolution(header: &MatrixHeader, columns: &[i64]) -> bool {
    let beyond_home = columns
        .iter()
        .any(|&col| col >= header.orbital_count as i64);
    header.supercell_declared() || beyond_home
}

/// Split global columns into (local orbital, image) pairs
///
/// With a declared supercell every image must fall inside the declared
/// repeats. Without one, images are laid out along the first lattice
/// direction, using the smallest odd repeat count that covers them all, in
/// home-first order.
pub fn resolve_images(
    header: &MatrixHeader,
    columns: &[i64],
    order: ImageOrder,
) -> Result<ResolvedColumns> {
    if !needs_resolution(header, columns) {
        return Ok(ResolvedColumns {
            local: columns.iter().map(|&col| col as u32).collect(),
            image: alloc::vec![0; columns.len()],
            supercell: SupercellInfo::home_only(header.supercell),
            triggered: false,
        });
    }

    let orbitals = header.orbital_count as i64;
    let max_image = columns.iter().map(|&col| col / orbitals).max().unwrap_or(0);

    let (geometry, file_order) = if header.supercell_declared() {
        (SyntheticGeometry::new(header.orbital_count, header.supercell), order)
    } else {
        let span = u32::try_from(max_image + 1).map_err(|_| DecodeError::ArraySizeOverflow)?;
        let span = span | 1;
        (
            SyntheticGeometry::new(header.orbital_count, [span, 1, 1]),
            ImageOrder::HomeFirst,
        )
    };

    let image_count = geometry.image_count()? as i64;
    if max_image >= image_count {
        return Err(DecodeError::OutOfRangeSupercellImage);
    }

    let canonical = geometry.offsets(ImageOrder::HomeFirst);
    let file_to_canonical = image_permutation(&geometry, file_order, &canonical);

    let mut local = Vec::with_capacity(columns.len());
    let mut image = Vec::with_capacity(columns.len());
    for &col in columns {
        local.push((col % orbitals) as u32);
        image.push(file_to_canonical[(col / orbitals) as usize]);
    }

    Ok(ResolvedColumns {
        local,
        image,
        supercell: SupercellInfo {
            declared: header.supercell,
            effective: geometry.repeats(),
            offsets: canonical,
        },
        triggered: true,
    })
}

fn image_permutation(
    geometry: &SyntheticGeometry,
    file_order: ImageOrder,
    canonical: &[[i32; 3]],
) -> Vec<u32> {
    if file_order == ImageOrder::HomeFirst {
        return (0..canonical.len() as u32).collect();
    }

    let index: HashMap<[i32; 3], u32> = canonical
        .iter()
        .enumerate()
        .map(|(i, &offset)| (offset, i as u32))
        .collect();

    geometry
        .offsets(file_order)
        .iter()
        .map(|offset| index[offset])
        .collect()
}
