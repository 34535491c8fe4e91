//! # Dotplot-bench CLI
//!
//! Command-line interface for the dotplot library.
//! Loads two FASTA files and benchmarks the selected matrix executors.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use dotplot::{Benchmark, BenchmarkConfig, ReportLog, Sequence, StrategyOutcome};
use log::{error, info, warn};

mod cli;

/// Command-line interface for dotplot-bench
#[derive(Parser, Debug)]
#[command(name = "dotplot-bench")]
#[command(about = "Dot-plot comparison matrices with sequential, shared-memory and distributed executors")]
#[command(long_about = "Builds the comparison matrix of two FASTA sequences and times it:
  dotplot-bench --file1 a.fasta --file2 b.fasta --sequential
  dotplot-bench --file1 a.fasta --file2 b.fasta --shared-memory --num-processes 1 2 4
  dotplot-bench --file1 a.fasta --file2 b.fasta --distributed --no-images

Outputs land under --output-dir:
  images/{sequential,shared,distributed,filtered}/*.png
  reports/*.txt and reports/*.json")]
#[command(version = env!("DOTPLOT_VERSION"))]
struct Cli {
    /// First sequence file in FASTA format (matrix rows)
    #[arg(long, value_name = "FASTA")]
    file1: PathBuf,

    /// Second sequence file in FASTA format (matrix columns)
    #[arg(long, value_name = "FASTA")]
    file2: PathBuf,

    /// Maximum number of symbols kept from each sequence
    #[arg(long, alias = "maxLen", default_value_t = 10_000)]
    max_len: usize,

    /// Run the sequential executor
    #[arg(long)]
    sequential: bool,

    /// Run the shared-memory worker-pool executor
    #[arg(long, alias = "multiprocessing")]
    shared_memory: bool,

    /// Run the distributed message-passing executor
    #[arg(long, alias = "mpi")]
    distributed: bool,

    /// Processor counts for the parallel executors, in order
    #[arg(long, alias = "num_processes", num_args = 1.., default_values_t = [1, 2, 4, 8, 16])]
    num_processes: Vec<usize>,

    /// Rendered view size for the parallel executors
    #[arg(long, default_value_t = 2000)]
    crop: usize,

    /// Rendered view size for the sequential executor
    #[arg(long, default_value_t = 5000)]
    sequential_crop: usize,

    /// Directory receiving images/ and reports/
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Skip rendering matrices and filtered masks
    #[arg(long)]
    no_images: bool,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn any_strategy(&self) -> bool {
        self.sequential || self.shared_memory || self.distributed
    }

    fn to_config(&self) -> BenchmarkConfig {
        BenchmarkConfig {
            processor_counts: self.num_processes.clone(),
            crop: self.crop,
            sequential_crop: self.sequential_crop,
            output_dir: self.output_dir.clone(),
            images: !self.no_images,
            progress: None,
        }
    }
}

fn main() {
    if let Err(e) = run() {
        error!("❌ Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let started = Instant::now();
    let cli = Cli::parse();

    // Initialize logging to stderr
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .init();

    if cli.verbose {
        eprintln!("🧬 Dotplot-bench v{} starting...", env!("DOTPLOT_VERSION"));
    }

    let load_start = Instant::now();
    let primary = load(&cli.file1, cli.max_len)?;
    let secondary = load(&cli.file2, cli.max_len)?;
    let load_time = load_start.elapsed();
    info!(
        "Loaded {} x {} symbols in {:.3}s",
        primary.len(),
        secondary.len(),
        load_time.as_secs_f64()
    );

    let mut load_report = ReportLog::new();
    load_report.push(format!("Sequence load time: {}", load_time.as_secs_f64()));
    load_report
        .flush_to(cli.output_dir.join("reports").join("load_time.txt"))
        .context("Failed to write load time report")?;

    if !cli.any_strategy() {
        warn!("No executor selected; pass --sequential, --shared-memory or --distributed");
        return Ok(());
    }

    let mut config = cli.to_config();
    let progress = if cli.no_progress {
        None
    } else {
        Some(cli::ProgressManager::new(
            primary.len() as u64,
            &format!("📊 Comparing {} x {} symbols", primary.len(), secondary.len()),
        ))
    };
    config.progress = progress.as_ref().map(|manager| manager.callback());

    let mut bench = Benchmark::new(config, primary, secondary).with_setup_time(started.elapsed());

    if cli.sequential {
        let outcome = bench.run_sequential().context("Sequential run failed")?;
        print_outcome(&outcome);
    }
    if cli.shared_memory {
        let outcome = bench
            .run_shared_memory()
            .context("Shared-memory run failed")?;
        print_outcome(&outcome);
    }
    if cli.distributed {
        let outcome = bench.run_distributed().context("Distributed run failed")?;
        print_outcome(&outcome);
    }

    eprintln!(
        "✅ Reports written to {}",
        cli.output_dir.join("reports").display()
    );
    Ok(())
}

/// Read a FASTA file and keep its first `max_len` symbols
fn load(path: &Path, max_len: usize) -> Result<Sequence> {
    let sequence = Sequence::from_fasta(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    Ok(sequence.truncated(max_len))
}

fn print_outcome(outcome: &StrategyOutcome) {
    println!("== {} ==", outcome.strategy);
    for line in outcome.lines.lines() {
        println!("{line}");
    }
}
