use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{error, info};

use cadence_dtw::{Aligner, Alignment, Boundary, Metric};
use cadence_io::{AlignmentName, AlignmentWriter, FeatureReader, ManifestReader};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Align narration audio features to text fragments with boundary-aware banded DTW")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for batch alignment (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Shared tuning parameters for the aligner.
#[derive(Args, Debug, Clone)]
struct TuningArgs {
    /// Cost of skipping a query element that has no matching reference frames
    #[arg(long, default_value_t = 0.75)]
    skip_penalty: f64,

    /// Band radius in reference frames around the diagonal
    #[arg(long, default_value_t = 100)]
    radius: i64,

    /// Frame distance: "euclidean" or "squared"
    #[arg(long, default_value = "euclidean")]
    metric: String,

    /// Refine the band from a half-resolution alignment instead of the diagonal
    #[arg(long, default_value_t = false)]
    multiscale: bool,

    /// Let the path start and end anywhere, charging the skip penalty per
    /// unmatched element at either end
    #[arg(long, default_value_t = false)]
    free_boundaries: bool,
}

impl TuningArgs {
    fn aligner(&self) -> Result<Aligner> {
        let metric = parse_metric(&self.metric)?;
        let boundary = if self.free_boundaries {
            Boundary::Free
        } else {
            Boundary::Fixed
        };
        Ok(Aligner::new(self.skip_penalty, self.radius)?
            .with_metric(metric)
            .with_boundary(boundary))
    }
}

#[derive(Subcommand)]
enum Command {
    /// Align one reference/query pair
    Align {
        /// Feature CSV of the reference (audio) sequence
        #[arg(long)]
        reference: PathBuf,

        /// Feature CSV of the query (text) sequence
        #[arg(long)]
        query: PathBuf,

        /// Alignment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        name: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// Align every pair listed in a manifest CSV (name,reference,query)
    Batch {
        /// Path to the manifest CSV
        #[arg(long)]
        manifest: PathBuf,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        tuning: TuningArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct AlignOutput {
    name: String,
    distance: f64,
    n_reference: usize,
    n_query: usize,
    path_len: usize,
    n_skipped: usize,
    output: PathBuf,
}

impl AlignOutput {
    fn new(name: &AlignmentName, alignment: &Alignment, output: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            distance: alignment.distance.value(),
            n_reference: alignment.path.n_reference(),
            n_query: alignment.path.n_query(),
            path_len: alignment.path.len(),
            n_skipped: alignment.path.skipped_queries().len(),
            output,
        }
    }
}

#[derive(Serialize)]
struct BatchOutput {
    n_jobs: usize,
    n_failed: usize,
    results: Vec<AlignOutput>,
    failures: Vec<FailureOutput>,
}

#[derive(Serialize)]
struct FailureOutput {
    name: String,
    error: String,
}

fn parse_metric(s: &str) -> Result<Metric> {
    match s {
        "euclidean" => Ok(Metric::Euclidean),
        "squared" => Ok(Metric::SquaredEuclidean),
        other => anyhow::bail!("unknown metric: {other} (expected euclidean or squared)"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Align {
            reference,
            query,
            name,
            output_dir,
            tuning,
        } => {
            let name = AlignmentName::new(name)?;
            let aligner = tuning.aligner()?;

            let s = FeatureReader::new(&reference)
                .read()
                .context("failed to read reference features")?;
            let t = FeatureReader::new(&query)
                .read()
                .context("failed to read query features")?;

            let alignment = if tuning.multiscale {
                aligner.align_multiscale(s.as_view(), t.as_view())
            } else {
                aligner.align(s.as_view(), t.as_view())
            }
            .with_context(|| format!("alignment {name} failed"))?;

            let writer = AlignmentWriter::new(&output_dir)?;
            let written = writer.write(&name, &alignment)?;

            let output = AlignOutput::new(&name, &alignment, written);
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Batch {
            manifest,
            output_dir,
            tuning,
        } => {
            let aligner = tuning.aligner()?;
            let jobs = ManifestReader::new(&manifest)
                .read()
                .context("failed to read manifest")?;

            let mut loaded = Vec::with_capacity(jobs.len());
            for job in &jobs {
                let s = FeatureReader::new(&job.reference)
                    .read()
                    .with_context(|| format!("failed to read reference features for {}", job.name))?;
                let t = FeatureReader::new(&job.query)
                    .read()
                    .with_context(|| format!("failed to read query features for {}", job.name))?;
                loaded.push((s, t));
            }
            let pairs: Vec<_> = loaded.iter().map(|(s, t)| (s.as_view(), t.as_view())).collect();

            let results: Vec<_> = if tuning.multiscale {
                pairs
                    .par_iter()
                    .map(|&(s, t)| aligner.align_multiscale(s, t))
                    .collect()
            } else {
                aligner.align_batch(&pairs)
            };

            let writer = AlignmentWriter::new(&output_dir)?;
            let mut output = BatchOutput {
                n_jobs: jobs.len(),
                n_failed: 0,
                results: Vec::new(),
                failures: Vec::new(),
            };
            for (job, result) in jobs.iter().zip(results) {
                match result {
                    Ok(alignment) => {
                        let written = writer.write(&job.name, &alignment)?;
                        output.results.push(AlignOutput::new(&job.name, &alignment, written));
                    }
                    Err(e) => {
                        error!(name = %job.name, error = %e, "alignment failed");
                        output.failures.push(FailureOutput {
                            name: job.name.to_string(),
                            error: e.to_string(),
                        });
                    }
                }
            }
            output.n_failed = output.failures.len();
            println!("{}", serde_json::to_string_pretty(&output)?);

            if output.n_failed > 0 {
                anyhow::bail!("{} of {} alignments failed", output.n_failed, output.n_jobs);
            }
        }
    }

    Ok(())
}
