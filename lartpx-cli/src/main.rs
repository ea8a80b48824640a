//! Command-line entry point for the LArTPC pixel-readout simulation
//! pipeline.

use clap::{Parser, Subcommand};
use lartpx_core::{ElectronicsConfig, Geometry, GeometryConfig, PhysicsConfig};
use lartpx_io::{SegmentFileReader, SegmentReadOptions};
use lartpx_sim::SimState;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] lartpx_io::Error),

    #[error("core error: {0}")]
    Core(#[from] lartpx_core::Error),
}

/// Pixelated LArTPC detector-response simulator.
#[derive(Parser)]
#[command(name = "lartpx")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full simulation pipeline over a segment input file.
    Simulate {
        /// Input segment file.
        #[arg(long)]
        input: PathBuf,

        /// Geometry descriptor YAML.
        #[arg(long)]
        geometry: PathBuf,

        /// Physics descriptor YAML.
        #[arg(long)]
        physics: PathBuf,

        /// Electronics descriptor YAML.
        #[arg(long)]
        electronics: PathBuf,

        /// Output ADC sample file (CSV).
        #[arg(long)]
        output: PathBuf,

        /// Optional MC-truth side-channel output file (CSV).
        #[arg(long)]
        truth_output: Option<PathBuf>,

        /// Optional bad-channel list.
        #[arg(long)]
        bad_channels: Option<PathBuf>,

        /// Optional per-pixel discrimination threshold table.
        #[arg(long)]
        pixel_thresholds: Option<PathBuf>,

        /// Stop after this many segments.
        #[arg(long)]
        limit: Option<usize>,

        /// Global RNG seed.
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Verbose progress narration.
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show information about a segment input file without simulating.
    Info {
        /// Input segment file.
        input: PathBuf,
    },

    /// Run the pipeline N times over one input batch, reporting timing.
    Benchmark {
        /// Input segment file.
        input: PathBuf,

        /// Geometry descriptor YAML.
        #[arg(long)]
        geometry: PathBuf,

        /// Physics descriptor YAML.
        #[arg(long)]
        physics: PathBuf,

        /// Electronics descriptor YAML.
        #[arg(long)]
        electronics: PathBuf,

        /// Number of iterations.
        #[arg(short, long, default_value = "3")]
        iterations: usize,
    },
}

fn load_geometry(geometry: &PathBuf, physics: &PathBuf, electronics: &PathBuf) -> Result<Geometry> {
    let geometry_cfg = lartpx_io::load_geometry_config(geometry)?;
    let physics_cfg = lartpx_io::load_physics_config(physics)?;
    let electronics_cfg = lartpx_io::load_electronics_config(electronics)?;
    Ok(Geometry::from_configs(&geometry_cfg, physics_cfg, electronics_cfg)?)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            input,
            geometry,
            physics,
            electronics,
            output,
            truth_output,
            bad_channels,
            pixel_thresholds,
            limit,
            seed,
            verbose,
        } => {
            if verbose {
                eprintln!("Reading segments from {}", input.display());
            }
            let reader = SegmentFileReader::open(&input)?;
            let options = SegmentReadOptions {
                swap_xz: false,
                limit,
            };
            let records = reader.read_segments(options)?;
            if verbose {
                eprintln!("  {} segments read", records.len());
            }

            let geom = load_geometry(&geometry, &physics, &electronics)?;

            let mut thresholds = pixel_thresholds
                .as_ref()
                .map(lartpx_io::load_pixel_thresholds)
                .transpose()?
                .unwrap_or_default();
            if let Some(path) = &bad_channels {
                let disabled = lartpx_io::load_bad_channels(path)?;
                for pixel_id in disabled {
                    thresholds.insert(pixel_id, f64::INFINITY);
                }
            }

            let batch = lartpx_core::SegmentBatch::from_records(&records);
            let event_ids: Vec<u64> = {
                let mut seen = HashSet::new();
                batch
                    .event_id
                    .iter()
                    .filter(|e| seen.insert(**e))
                    .copied()
                    .collect()
            };

            let start = Instant::now();
            let mut state = SimState::new(seed, 64);
            for (batch_index, event_id) in event_ids.iter().enumerate() {
                if let Some((lo, hi)) = batch.event_range(*event_id) {
                    let event_records: Vec<_> = (lo..hi).map(|i| batch.record(i)).collect();
                    let event_batch = lartpx_core::SegmentBatch::from_records(&event_records);
                    lartpx_sim::simulate_batch(
                        &geom,
                        &event_batch,
                        &mut state,
                        *event_id,
                        batch_index as u64,
                        &thresholds,
                    )?;
                }
            }
            let elapsed = start.elapsed();

            if verbose {
                eprintln!("Writing {} ADC samples to {}", state.adc_samples.len(), output.display());
            }
            let mut writer = lartpx_io::SampleFileWriter::create(&output)?;
            writer.write_samples_csv(&state.adc_samples)?;

            if let Some(truth_path) = truth_output {
                if verbose {
                    eprintln!("Writing MC truth to {}", truth_path.display());
                }
                let mut truth_writer = lartpx_io::TruthFileWriter::create(&truth_path)?;
                truth_writer.write_truth_csv(&state.truth)?;
            }

            println!("Processed {} events in {:.2}s", event_ids.len(), elapsed.as_secs_f64());
            println!("Total ADC samples: {}", state.adc_samples.len());
        }

        Commands::Info { input } => {
            let reader = SegmentFileReader::open(&input)?;
            let records = reader.read_segments(SegmentReadOptions::default())?;

            println!("File: {}", input.display());
            println!("Segments: {}", records.len());

            if !records.is_empty() {
                let events: HashSet<u64> = records.iter().map(|r| r.event_id).collect();
                println!("Events: {}", events.len());

                let planes: HashSet<u32> = records.iter().map(|r| r.pixel_plane).collect();
                println!("Pixel planes: {planes:?}");

                let min_t = records.iter().map(|r| r.t).fold(f64::INFINITY, f64::min);
                let max_t = records.iter().map(|r| r.t).fold(f64::NEG_INFINITY, f64::max);
                println!("Time range: {min_t} - {max_t} us");
            }
        }

        Commands::Benchmark {
            input,
            geometry,
            physics,
            electronics,
            iterations,
        } => {
            let reader = SegmentFileReader::open(&input)?;
            let records = reader.read_segments(SegmentReadOptions::default())?;
            let geom = load_geometry(&geometry, &physics, &electronics)?;
            let batch = lartpx_core::SegmentBatch::from_records(&records);

            println!("Benchmarking with {} segments, {} iterations", records.len(), iterations);

            let mut times = Vec::with_capacity(iterations);
            for _ in 0..iterations {
                let start = Instant::now();
                let mut state = SimState::new(0, 64);
                lartpx_sim::simulate_batch(&geom, &batch, &mut state, 0, 0, &HashMap::new())?;
                times.push(start.elapsed().as_secs_f64() * 1000.0);
            }

            let min_time = times.iter().fold(f64::INFINITY, |a, &b| a.min(b));
            let max_time = times.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
            let mean_time = times.iter().sum::<f64>() / times.len() as f64;

            println!("Mean: {mean_time:.2} ms, Min: {min_time:.2} ms, Max: {max_time:.2} ms");
        }
    }

    Ok(())
}
