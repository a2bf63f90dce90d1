//! File entry points for density-matrix decoding
//!
//! Each read acquires its byte stream once, decodes it front to back and
//! drops it before returning, on success and on failure alike.

use std::io::Read;
use std::path::{Path, PathBuf};

use densmat_core::constants::DEFAULT_FILE_NAME;
use densmat_core::decode::assemble;
use densmat_core::{DecodeOptions, RawDensityMatrix, RecordStream, SparseDensityMatrix};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::source::ReaderSource;
use crate::transport::{FallbackTransport, Transport};

/// Handle on a density-matrix file location
#[derive(Debug, Clone)]
pub struct DmFile {
    location: String,
    options: DecodeOptions,
}

impl DmFile {
    /// Refer to a local path
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self::at(path.as_ref().to_string_lossy())
    }

    /// Refer to any location a transport understands (path or URL)
    pub fn at(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            options: DecodeOptions::default(),
        }
    }

    /// Set decode options
    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    /// Location this handle points to
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Decode options in effect
    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Read through the default transport chain
    pub fn read(&self) -> Result<SparseDensityMatrix> {
        self.read_with(&FallbackTransport::default())
    }

    /// Read through a specific transport
    pub fn read_with<T: Transport + ?Sized>(&self, transport: &T) -> Result<SparseDensityMatrix> {
        let raw = self.read_raw_with(transport)?;
        let matrix = assemble(raw, &self.options)?;
        info!(
            location = %self.location,
            orbitals = matrix.orbital_count(),
            nnz = matrix.local_columns().len(),
            spin = %matrix.spin_kind(),
            images = matrix.supercell().image_count(),
            "decoded density matrix"
        );
        Ok(matrix)
    }

    /// Decode without the spin, supercell and overlap transforms
    pub fn read_raw(&self) -> Result<RawDensityMatrix> {
        self.read_raw_with(&FallbackTransport::default())
    }

    /// Decode through a specific transport without transforms
    pub fn read_raw_with<T: Transport + ?Sized>(&self, transport: &T) -> Result<RawDensityMatrix> {
        let reader = transport.open(&self.location)?;
        decode_raw_reader(reader, &self.options)
    }
}

fn decode_raw_reader<R: Read>(reader: R, options: &DecodeOptions) -> Result<RawDensityMatrix> {
    let mut stream =
        RecordStream::new(ReaderSource::new(reader)).with_marker_check(options.marker_check);
    let raw = densmat_core::decode_raw(&mut stream)?;

    debug!(
        orbitals = raw.header.orbital_count,
        spin_channels = raw.header.spin_channels,
        supercell = ?raw.header.supercell,
        nnz = raw.nnz(),
        max_column = ?raw.max_column(),
        records = stream.records_read(),
        bytes = stream.bytes_consumed(),
        "decoded raw records"
    );
    if densmat_core::supercell::needs_resolution(&raw.header, &raw.columns) {
        debug!("columns reference supercell images");
    }
    Ok(raw)
}

/// Decode a matrix from any reader positioned at the start of the file
pub fn decode_reader<R: Read>(reader: R, options: &DecodeOptions) -> Result<SparseDensityMatrix> {
    let raw = decode_raw_reader(reader, options)?;
    Ok(assemble(raw, options)?)
}

/// Read a local density-matrix file
pub fn read_density_matrix<P: AsRef<Path>>(
    path: P,
    options: &DecodeOptions,
) -> Result<SparseDensityMatrix> {
    DmFile::open(path).with_options(*options).read()
}

/// Read the density matrix stored in a calculation folder
///
/// `file_name` defaults to the name the simulation writes (`aiida.DM`).
pub fn read_density_matrix_in<P: AsRef<Path>>(
    folder: P,
    file_name: Option<&str>,
    options: &DecodeOptions,
) -> Result<SparseDensityMatrix> {
    let path: PathBuf = folder.as_ref().join(file_name.unwrap_or(DEFAULT_FILE_NAME));
    read_density_matrix(&path, options).map_err(|err| match err {
        Error::NoTransport(_) => Error::NoTransport(path.display().to_string()),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use densmat_core::fixtures::encode_density_matrix;
    use densmat_core::{DecodeError, MatrixHeader, Orientation, SparseMatrix};
    use std::io::{Cursor, Write};

    fn sample_bytes() -> Vec<u8> {
        let header = MatrixHeader {
            orbital_count: 2,
            spin_channels: 2,
            supercell: [0, 0, 0],
        };
        encode_density_matrix(
            &header,
            &[2, 1],
            &[1, 2, 2],
            &[vec![1.0, 0.5, 2.0], vec![0.5, 0.25, 1.0]],
        )
    }

    #[test]
    fn test_decode_reader() {
        let options = DecodeOptions::default().with_orientation(Orientation::AsStored);
        let matrix = decode_reader(Cursor::new(sample_bytes()), &options).unwrap();

        assert_eq!(matrix.orbital_count(), 2);
        assert_eq!(matrix.nnz(), 3);
        assert_eq!(matrix.channel_count(), 3);
        // total and polarization of (up, down)
        assert_eq!(matrix.channel(0), &[1.5, 0.75, 3.0]);
        assert_eq!(matrix.channel(1), &[0.5, 0.25, 1.0]);
        assert_eq!(matrix.overlap(), Some(&[0.0, 0.0, 0.0][..]));
    }

    #[test]
    fn test_read_from_folder() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("aiida.DM")).unwrap();
        file.write_all(&sample_bytes()).unwrap();
        drop(file);

        let matrix = read_density_matrix_in(dir.path(), None, &DecodeOptions::default()).unwrap();
        assert_eq!(matrix.dimensions(), (2, 2));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_density_matrix_in(dir.path(), Some("other.DM"), &DecodeOptions::default())
            .unwrap_err();
        match err {
            Error::NoTransport(location) => assert!(location.ends_with("other.DM")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_truncated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aiida.DM");
        let bytes = sample_bytes();
        std::fs::write(&path, &bytes[..bytes.len() - 6]).unwrap();

        let err = DmFile::open(&path).read().unwrap_err();
        assert_eq!(err.decode_error(), Some(DecodeError::TruncatedRecord));

        // Buffered reads surface the same error
        let err = DmFile::open(&path)
            .read_with(&crate::transport::LocalFile)
            .unwrap_err();
        assert_eq!(err.decode_error(), Some(DecodeError::TruncatedRecord));
    }

    #[test]
    fn test_random_layouts_keep_invariants() {
        use rand::rngs::StdRng;
        use rand::seq::SliceRandom;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..25 {
            let orbitals = rng.gen_range(1..12u32);
            let header = MatrixHeader {
                orbital_count: orbitals,
                spin_channels: *[1u32, 2, 4, 8].choose(&mut rng).unwrap(),
                supercell: [3, 1, 1],
            };

            let mut counts = Vec::new();
            let mut columns = Vec::new();
            let candidates: Vec<i32> = (1..=3 * orbitals as i32).collect();
            for _ in 0..orbitals {
                let count = rng.gen_range(0..=candidates.len().min(6));
                let picked: Vec<i32> = candidates
                    .choose_multiple(&mut rng, count)
                    .copied()
                    .collect();
                counts.push(count as i32);
                columns.extend(picked);
            }
            let nnz = columns.len();
            let values: Vec<Vec<f64>> = (0..header.spin_channels)
                .map(|_| (0..nnz).map(|_| rng.gen_range(-1.0..1.0)).collect())
                .collect();
            let bytes = encode_density_matrix(&header, &counts, &columns, &values);

            let raw = decode_raw_reader(Cursor::new(&bytes), &DecodeOptions::default()).unwrap();
            assert_eq!(raw.nnz(), nnz);
            assert_eq!(raw.columns.len(), nnz);
            assert!(raw.channels.iter().all(|c| c.len() == nnz));
            let offsets = raw.layout.offsets();
            assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
            assert_eq!(offsets[orbitals as usize], nnz);

            let options = DecodeOptions::default().with_orientation(Orientation::AsStored);
            let matrix = decode_reader(Cursor::new(&bytes), &options).unwrap();
            assert_eq!(matrix.nnz(), nnz);
            for row in 0..orbitals as usize {
                let keys: Vec<u64> = matrix
                    .row_entries(row)
                    .map(|(local, image)| image as u64 * orbitals as u64 + local as u64)
                    .collect();
                assert!(keys.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }

    #[test]
    fn test_inflated_counts_from_reader() {
        let mut writer = densmat_core::fixtures::RecordWriter::new();
        writer.record(&[4i32, 1, 0, 0, 0]);
        writer.record(&[i32::MAX; 4]);
        let bytes = writer.finish();

        let err = decode_reader(Cursor::new(bytes), &DecodeOptions::default()).unwrap_err();
        assert_eq!(err.decode_error(), Some(DecodeError::TruncatedRecord));
    }

    #[test]
    fn test_read_raw_keeps_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aiida.DM");
        std::fs::write(&path, sample_bytes()).unwrap();

        let raw = DmFile::open(&path).read_raw().unwrap();
        assert_eq!(raw.columns, vec![0, 1, 1]);
        assert_eq!(raw.channels[0], vec![1.0, 0.5, 2.0]);
    }
}
