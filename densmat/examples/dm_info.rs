use clap::{Parser, Subcommand, ValueEnum};

use densmat::{
    CollinearLayout, DecodeOptions, DmFile, FallbackTransport, ImageOrder, MarkerCheck,
    MatrixSummary, Orientation,
};

#[derive(Parser)]
#[command(author, version, long_about = None)]
#[command(about = "densmat CLI - inspect spin density-matrix files, local or remote")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Check record markers against payload sizes
    #[arg(long, global = true)]
    strict: bool,

    /// Keep rows as stored instead of transposing
    #[arg(long, global = true)]
    as_stored: bool,

    /// Keep collinear channels as (up, down)
    #[arg(long, global = true)]
    up_down: bool,

    /// Image enumeration order used by the file
    #[arg(long, global = true, value_enum, default_value_t = CliImageOrder::HomeFirst)]
    image_order: CliImageOrder,
}

#[derive(Clone, Copy, ValueEnum)]
enum CliImageOrder {
    HomeFirst,
    AxisMinor,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a summary of the matrix
    Info {
        /// Path or http(s) URL of the density matrix file
        location: String,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the stored entries of one row
    Row {
        /// Path or http(s) URL of the density matrix file
        location: String,

        /// Row (orbital) index
        row: usize,
    },
}

impl Cli {
    fn options(&self) -> DecodeOptions {
        DecodeOptions::default()
            .with_marker_check(if self.strict {
                MarkerCheck::Validate
            } else {
                MarkerCheck::Ignore
            })
            .with_orientation(if self.as_stored {
                Orientation::AsStored
            } else {
                Orientation::Transposed
            })
            .with_collinear_layout(if self.up_down {
                CollinearLayout::UpDown
            } else {
                CollinearLayout::ChargeMagnetization
            })
            .with_image_order(match self.image_order {
                CliImageOrder::HomeFirst => ImageOrder::HomeFirst,
                CliImageOrder::AxisMinor => ImageOrder::AxisMinorCentered,
            })
    }
}

fn transports() -> FallbackTransport {
    let chain = FallbackTransport::default();
    #[cfg(feature = "http")]
    let chain = chain.with(densmat::HttpTransport::new());
    chain
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let options = cli.options();
    let start_time = std::time::Instant::now();

    match &cli.command {
        Commands::Info { location, json } => {
            let matrix = DmFile::at(location.as_str())
                .with_options(options)
                .read_with(&transports())?;
            let summary = MatrixSummary::from_matrix(&matrix);

            if *json {
                println!("{}", summary.to_json()?);
            } else {
                println!("Density matrix: {location}");
                println!("  Orbitals: {}", summary.orbitals);
                println!("  Spin: {} ({} channels)", summary.spin, summary.spin_channels);
                println!("  Stored entries: {}", summary.nnz);
                println!("  Largest row: {} entries", summary.max_row_nnz);
                println!("  Empty rows: {}", summary.empty_rows);
                println!(
                    "  Supercell: declared {:?}, used {:?} ({} images)",
                    summary.declared_supercell, summary.effective_supercell, summary.images
                );
                println!("  Home-cell trace: {:.6}", summary.home_trace);
            }
        }
        Commands::Row { location, row } => {
            let matrix = DmFile::at(location.as_str())
                .with_options(options)
                .read_with(&transports())?;
            if *row >= matrix.orbital_count() {
                return Err(format!(
                    "row {row} out of range (matrix has {} orbitals)",
                    matrix.orbital_count()
                )
                .into());
            }

            let offsets = matrix.supercell().offsets.clone();
            for (i, (local, image)) in matrix.row_entries(*row).enumerate() {
                let values: Vec<f64> = (0..matrix.channel_count())
                    .map(|c| matrix.row_values(*row, c)[i])
                    .collect();
                println!(
                    "  ({row}, {local}) image {image} {:?} = {values:?}",
                    offsets[image as usize]
                );
            }
        }
    }

    eprintln!("Completed in {:.2?}", start_time.elapsed());
    Ok(())
}
