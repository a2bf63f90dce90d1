//! Assembled sparse density matrix
//!
//! Owned struct of arrays: row offsets, per-entry local orbital and image,
//! and one flat value array per channel. After [`augment_overlap`] the last
//! channel is the overlap placeholder and every row is sorted by its
//! supercell-wide column `image * orbitals + local`.
//!
//! [`augment_overlap`]: SparseDensityMatrix::augment_overlap

use alloc::vec::Vec;

use crate::error::{DecodeError, Result};
use crate::format::{MatrixHeader, RowLayout};
use crate::spin::SpinKind;
use crate::supercell::{ResolvedColumns, SupercellInfo};
use crate::traits::SparseMatrix;

/// Which index owns the rows of the finished matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    /// Swap row and column roles; an entry in image `k` moves to the image
    /// with the opposite offset
    #[default]
    Transposed,
    /// Keep rows as stored in the file
    AsStored,
}

/// Sparse, spin-resolved density matrix over a periodic supercell
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SparseDensityMatrix {
    header: MatrixHeader,
    spin: SpinKind,
    layout: RowLayout,
    local: Vec<u32>,
    image: Vec<u32>,
    channels: Vec<Vec<f64>>,
    has_overlap: bool,
    orientation: Orientation,
    supercell: SupercellInfo,
}

/// Entry arrays being rebuilt by a finalization step
struct Entries {
    offsets: Vec<usize>,
    local: Vec<u32>,
    image: Vec<u32>,
    channels: Vec<Vec<f64>>,
}

impl SparseDensityMatrix {
    pub(crate) fn from_parts(
        header: MatrixHeader,
        layout: RowLayout,
        resolved: ResolvedColumns,
        spin: SpinKind,
        channels: Vec<Vec<f64>>,
    ) -> Self {
        Self {
            header,
            spin,
            layout,
            local: resolved.local,
            image: resolved.image,
            channels,
            has_overlap: false,
            orientation: Orientation::AsStored,
            supercell: resolved.supercell,
        }
    }

    /// Append the zero overlap channel and finalize row order
    ///
    /// Marks the matrix as belonging to a non-orthogonal basis. Callers with
    /// real overlap values hand them over with [`with_overlap`]. A second
    /// call fails with [`DecodeError::OverlapAlreadyPresent`].
    ///
    /// [`with_overlap`]: Self::with_overlap
    pub fn augment_overlap(&mut self, orientation: Orientation) -> Result<()> {
        if self.has_overlap {
            return Err(DecodeError::OverlapAlreadyPresent);
        }

        let entries = match orientation {
            Orientation::Transposed => self.transposed()?,
            Orientation::AsStored => self.entries(),
        };
        let mut entries = sort_entries(entries, self.header.orbital_count)?;

        entries.channels.push(alloc::vec![0.0; entries.local.len()]);
        self.commit(entries);
        self.has_overlap = true;
        self.orientation = orientation;
        Ok(())
    }

    /// Sort every row ascending by supercell-wide column
    ///
    /// Rows that are already sorted are left untouched.
    pub fn sort_rows(&mut self) -> Result<()> {
        let entries = sort_entries(self.entries(), self.header.orbital_count)?;
        self.commit(entries);
        Ok(())
    }

    /// Replace the zero overlap placeholder with real values
    ///
    /// `None` keeps the placeholder. Values follow the entry order of this
    /// matrix.
    pub fn with_overlap(mut self, overlap: Option<Vec<f64>>) -> Result<Self> {
        if !self.has_overlap {
            self.augment_overlap(self.orientation)?;
        }
        if let Some(values) = overlap {
            if values.len() != self.nnz() {
                return Err(DecodeError::OverlapLengthMismatch);
            }
            if let Some(slot) = self.channels.last_mut() {
                *slot = values;
            }
        }
        Ok(self)
    }

    fn entries(&self) -> Entries {
        Entries {
            offsets: self.layout.offsets().to_vec(),
            local: self.local.clone(),
            image: self.image.clone(),
            channels: self.channels.clone(),
        }
    }

    fn commit(&mut self, entries: Entries) {
        self.layout = RowLayout::from_offsets(entries.offsets);
        self.local = entries.local;
        self.image = entries.image;
        self.channels = entries.channels;
    }

    fn transposed(&self) -> Result<Entries> {
        let rows = self.orbital_count();
        let nnz = self.nnz();
        let mirror = self.supercell.mirror_table();

        let mut offsets = alloc::vec![0usize; rows + 1];
        for &col in &self.local {
            offsets[col as usize + 1] += 1;
        }
        for row in 0..rows {
            offsets[row + 1] += offsets[row];
        }

        let mut next = offsets.clone();
        let mut local = alloc::vec![0u32; nnz];
        let mut image = alloc::vec![0u32; nnz];
        let mut channels: Vec<Vec<f64>> = self
            .channels
            .iter()
            .map(|_| alloc::vec![0.0; nnz])
            .collect();

        for row in 0..rows {
            for entry in self.layout.row_range(row) {
                let target_row = self.local[entry] as usize;
                let slot = next[target_row];
                next[target_row] += 1;

                local[slot] = row as u32;
                image[slot] = mirror
                    .get(self.image[entry] as usize)
                    .copied()
                    .flatten()
                    .ok_or(DecodeError::OutOfRangeSupercellImage)?;
                for (out, values) in channels.iter_mut().zip(&self.channels) {
                    out[slot] = values[entry];
                }
            }
        }

        Ok(Entries {
            offsets,
            local,
            image,
            channels,
        })
    }

    /// Number of orbitals (rows)
    pub fn orbital_count(&self) -> usize {
        self.header.orbitals()
    }

    /// Header the matrix was decoded from
    pub fn header(&self) -> &MatrixHeader {
        &self.header
    }

    /// Spin treatment
    pub fn spin_kind(&self) -> SpinKind {
        self.spin
    }

    /// Row ownership of this matrix
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Supercell image table
    pub fn supercell(&self) -> &SupercellInfo {
        &self.supercell
    }

    /// Row counts and offsets
    pub fn layout(&self) -> &RowLayout {
        &self.layout
    }

    /// Prefix-sum row offsets
    pub fn row_offsets(&self) -> &[usize] {
        self.layout.offsets()
    }

    /// Local orbital of every entry
    pub fn local_columns(&self) -> &[u32] {
        &self.local
    }

    /// Image index of every entry
    pub fn images(&self) -> &[u32] {
        &self.image
    }

    /// Supercell-wide column of every entry
    pub fn global_columns(&self) -> impl Iterator<Item = u64> + '_ {
        let orbitals = self.header.orbital_count as u64;
        self.local
            .iter()
            .zip(&self.image)
            .map(move |(&l, &i)| i as u64 * orbitals + l as u64)
    }

    /// (local orbital, image) pairs of one row
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (u32, u32)> + '_ {
        let range = self.layout.row_range(row);
        self.local[range.clone()]
            .iter()
            .copied()
            .zip(self.image[range].iter().copied())
    }

    /// Values of one channel in one row
    pub fn row_values(&self, row: usize, channel: usize) -> &[f64] {
        &self.channels[channel][self.layout.row_range(row)]
    }

    /// Number of value channels, overlap included
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of spin channels, overlap excluded
    pub fn spin_channels(&self) -> usize {
        self.spin.channels()
    }

    /// Flat values of one channel
    pub fn channel(&self, channel: usize) -> &[f64] {
        &self.channels[channel]
    }

    /// All channels, overlap last when present
    pub fn channels(&self) -> &[Vec<f64>] {
        &self.channels
    }

    /// Overlap channel, if appended
    pub fn overlap(&self) -> Option<&[f64]> {
        if self.has_overlap {
            self.channels.last().map(Vec::as_slice)
        } else {
            None
        }
    }

    /// Whether the matrix assumes an orthonormal basis
    pub fn is_orthogonal(&self) -> bool {
        !self.has_overlap
    }
}

impl SparseMatrix for SparseDensityMatrix {
    fn get_element(&self, row: usize, col: usize) -> Option<Vec<f64>> {
        if row >= self.orbital_count() {
            return None;
        }
        let range = self.layout.row_range(row);
        let orbitals = self.header.orbital_count as u64;
        let keys: Vec<u64> = self.local[range.clone()]
            .iter()
            .zip(&self.image[range.clone()])
            .map(|(&l, &i)| i as u64 * orbitals + l as u64)
            .collect();

        let position = keys.binary_search(&(col as u64)).ok()?;
        let entry = range.start + position;
        Some(self.channels.iter().map(|values| values[entry]).collect())
    }

    fn dimensions(&self) -> (usize, usize) {
        let rows = self.orbital_count();
        (rows, rows * self.supercell.image_count())
    }

    fn nnz(&self) -> usize {
        self.local.len()
    }
}

fn sort_entries(entries: Entries, orbitals: u32) -> Result<Entries> {
    let Entries {
        offsets,
        mut local,
        mut image,
        mut channels,
    } = entries;
    let orbitals = orbitals as u64;
    let key = |l: u32, i: u32| i as u64 * orbitals + l as u64;

    let mut order: Vec<usize> = Vec::new();
    for row in offsets.windows(2) {
        let (start, end) = (row[0], row[1]);

        order.clear();
        order.extend(start..end);
        order.sort_unstable_by_key(|&e| key(local[e], image[e]));

        if order
            .windows(2)
            .any(|w| key(local[w[0]], image[w[0]]) == key(local[w[1]], image[w[1]]))
        {
            return Err(DecodeError::DuplicateColumnInRow);
        }

        if order.iter().enumerate().all(|(i, &e)| e == start + i) {
            continue;
        }

        permute(&mut local[start..end], &order, start);
        permute(&mut image[start..end], &order, start);
        for values in channels.iter_mut() {
            permute(&mut values[start..end], &order, start);
        }
    }

    Ok(Entries {
        offsets,
        local,
        image,
        channels,
    })
}

fn permute<T: Copy>(row: &mut [T], order: &[usize], start: usize) {
    let sorted: Vec<T> = order.iter().map(|&e| row[e - start]).collect();
    row.copy_from_slice(&sorted);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supercell::{resolve_images, ImageOrder, SyntheticGeometry};
    use alloc::vec;

    fn build(
        orbitals: u32,
        supercell: [u32; 3],
        counts: &[i32],
        columns: &[i64],
        values: Vec<f64>,
    ) -> SparseDensityMatrix {
        let header = MatrixHeader {
            orbital_count: orbitals,
            spin_channels: 1,
            supercell,
        };
        let layout = RowLayout::from_counts(counts).unwrap();
        let resolved = resolve_images(&header, columns, ImageOrder::default()).unwrap();
        SparseDensityMatrix::from_parts(
            header,
            layout,
            resolved,
            SpinKind::Unpolarized,
            vec![values],
        )
    }

    #[test]
    fn test_augment_sorts_rows() {
        let mut m = build(3, [0, 0, 0], &[3, 0, 1], &[2, 0, 1, 2], vec![1.0, 2.0, 3.0, 4.0]);
        m.augment_overlap(Orientation::AsStored).unwrap();

        assert_eq!(m.local_columns(), &[0, 1, 2, 2]);
        assert_eq!(m.channel(0), &[2.0, 3.0, 1.0, 4.0]);
        assert_eq!(m.overlap(), Some(&[0.0, 0.0, 0.0, 0.0][..]));
        assert_eq!(m.channel_count(), 2);
        assert!(!m.is_orthogonal());
    }

    #[test]
    fn test_double_augment_rejected() {
        let mut m = build(1, [0, 0, 0], &[1], &[0], vec![1.0]);
        m.augment_overlap(Orientation::AsStored).unwrap();
        assert_eq!(
            m.augment_overlap(Orientation::AsStored),
            Err(DecodeError::OverlapAlreadyPresent)
        );
        assert_eq!(m.channel_count(), 2);
    }

    #[test]
    fn test_resort_is_noop() {
        let mut m = build(2, [0, 0, 0], &[2, 1], &[1, 0, 1], vec![1.0, 2.0, 3.0]);
        m.augment_overlap(Orientation::AsStored).unwrap();
        let before = m.clone();
        m.sort_rows().unwrap();
        assert_eq!(m, before);
    }

    #[test]
    fn test_duplicate_column() {
        let mut m = build(2, [0, 0, 0], &[2, 0], &[1, 1], vec![1.0, 2.0]);
        assert_eq!(
            m.augment_overlap(Orientation::AsStored),
            Err(DecodeError::DuplicateColumnInRow)
        );
        // Failed finalization leaves the matrix unaugmented
        assert!(m.overlap().is_none());
    }

    #[test]
    fn test_transpose_home_cell() {
        // Row 0: (0,1) -> 1.0 ; row 1: (1,0) -> 2.0, (1,1) -> 3.0
        let mut m = build(2, [0, 0, 0], &[1, 2], &[1, 0, 1], vec![1.0, 2.0, 3.0]);
        m.augment_overlap(Orientation::Transposed).unwrap();

        assert_eq!(m.row_offsets(), &[0, 1, 3]);
        assert_eq!(m.row_entries(0).collect::<Vec<_>>(), vec![(1, 0)]);
        assert_eq!(m.row_entries(1).collect::<Vec<_>>(), vec![(0, 0), (1, 0)]);
        assert_eq!(m.channel(0), &[2.0, 1.0, 3.0]);
        assert_eq!(m.orientation(), Orientation::Transposed);
    }

    #[test]
    fn test_transpose_mirrors_images() {
        // Two orbitals, three images along axis 1: [home, -1, +1]
        // Row 0 references orbital 1 in image 1 (offset -1): column 3
        let mut m = build(2, [3, 1, 1], &[1, 0], &[3], vec![5.0]);
        m.augment_overlap(Orientation::Transposed).unwrap();

        // Becomes row 1, orbital 0, image with offset +1
        assert_eq!(m.row_entries(0).count(), 0);
        assert_eq!(m.row_entries(1).collect::<Vec<_>>(), vec![(0, 2)]);
        assert_eq!(m.supercell().offsets[2], [1, 0, 0]);
    }

    #[test]
    fn test_transpose_even_axis() {
        // Two images along axis 1: [home, -1]; -1 is its own periodic mirror
        // Row 0: orbital 1 in image 1 (column 3); row 1: orbital 0 at home
        let mut m = build(2, [2, 1, 1], &[1, 1], &[3, 0], vec![1.5, 2.5]);
        m.augment_overlap(Orientation::Transposed).unwrap();

        assert_eq!(m.row_entries(0).collect::<Vec<_>>(), vec![(1, 0)]);
        assert_eq!(m.row_entries(1).collect::<Vec<_>>(), vec![(0, 1)]);
        assert_eq!(m.channel(0), &[2.5, 1.5]);
        assert_eq!(m.supercell().offsets[1], [-1, 0, 0]);
    }

    #[test]
    fn test_transpose_two_axes() {
        // HomeFirst over [3, 2, 1]:
        // 0 (0,0,0), 1 (-1,-1,0), 2 (-1,0,0), 3 (0,-1,0), 4 (1,-1,0), 5 (1,0,0)
        let offsets = SyntheticGeometry::new(1, [3, 2, 1]).offsets(ImageOrder::HomeFirst);
        assert_eq!(offsets[1], [-1, -1, 0]);
        assert_eq!(offsets[4], [1, -1, 0]);

        // One orbital; the single row references images 1, 2 and 3
        let mut m = build(1, [3, 2, 1], &[3], &[1, 2, 3], vec![1.0, 2.0, 3.0]);
        m.augment_overlap(Orientation::Transposed).unwrap();

        // (-1,-1) -> (1,-1) = 4, (-1,0) -> (1,0) = 5, (0,-1) -> (0,-1) = 3
        assert_eq!(
            m.row_entries(0).collect::<Vec<_>>(),
            vec![(0, 3), (0, 4), (0, 5)]
        );
        assert_eq!(m.channel(0), &[3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_with_overlap() {
        let mut m = build(2, [0, 0, 0], &[1, 1], &[0, 1], vec![1.0, 2.0]);
        m.augment_overlap(Orientation::AsStored).unwrap();

        let replaced = m.clone().with_overlap(Some(vec![0.5, 0.25])).unwrap();
        assert_eq!(replaced.overlap(), Some(&[0.5, 0.25][..]));

        let kept = m.clone().with_overlap(None).unwrap();
        assert_eq!(kept.overlap(), Some(&[0.0, 0.0][..]));

        assert_eq!(
            m.with_overlap(Some(vec![1.0])),
            Err(DecodeError::OverlapLengthMismatch)
        );
    }

    #[test]
    fn test_sparse_matrix_access() {
        let mut m = build(2, [3, 1, 1], &[2, 1], &[0, 5, 1], vec![1.0, 2.0, 3.0]);
        m.augment_overlap(Orientation::AsStored).unwrap();

        assert_eq!(m.dimensions(), (2, 6));
        assert_eq!(m.nnz(), 3);
        assert_eq!(m.get_element(0, 0), Some(vec![1.0, 0.0]));
        assert_eq!(m.get_element(0, 5), Some(vec![2.0, 0.0]));
        assert_eq!(m.get_element(0, 1), None);
        assert_eq!(m.get_element(5, 0), None);
        assert_eq!(m.global_columns().collect::<Vec<_>>(), vec![0, 5, 1]);
    }
}
