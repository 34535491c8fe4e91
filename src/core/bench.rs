//! Benchmark driver
//!
//! Runs a strategy once per processor count, renders the cropped matrix and
//! its filtered mask, then writes the timing analysis as text and JSON under
//! the configured output directory:
//!
//! ```text
//! <output_dir>/
//!   images/{sequential,shared,distributed,filtered}/*.png
//!   reports/{sequential,shared,distributed}.txt
//!   reports/{sequential,shared,distributed}.json
//!   reports/image_times.txt
//! ```

use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::info;

use crate::core::analysis::{PerformanceReport, PerformanceSample};
use crate::core::distributed::run_distributed;
use crate::core::error::{Error, Result};
use crate::core::filter::DiagonalFilter;
use crate::core::matrix::ComparisonMatrix;
use crate::core::options::{BuildOptions, ProgressCallback};
use crate::core::render::{save_filtered, save_grayscale};
use crate::core::report::ReportLog;
use crate::core::sequence::Sequence;
use crate::core::sequential::sequential_dotplot;
use crate::core::shared::shared_memory_dotplot;

/// Default processor-count series
pub const DEFAULT_PROCESSOR_COUNTS: [usize; 5] = [1, 2, 4, 8, 16];

/// Execution strategy being benchmarked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Sequential,
    SharedMemory,
    Distributed,
}

impl Strategy {
    /// Directory and file stem used for this strategy's outputs
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Sequential => "sequential",
            Strategy::SharedMemory => "shared",
            Strategy::Distributed => "distributed",
        }
    }

    fn unit(&self) -> &'static str {
        match self {
            Strategy::Sequential => "processors",
            Strategy::SharedMemory => "workers",
            Strategy::Distributed => "participants",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Strategy::Sequential => "Sequential",
            Strategy::SharedMemory => "Shared-memory",
            Strategy::Distributed => "Distributed",
        };
        f.write_str(label)
    }
}

/// Driver configuration
#[derive(Clone)]
pub struct BenchmarkConfig {
    /// Processor counts to run the parallel strategies with, in order
    pub processor_counts: Vec<usize>,

    /// Rendered view size for the parallel strategies
    pub crop: usize,

    /// Rendered view size for the sequential strategy
    pub sequential_crop: usize,

    /// Root of the `images/` and `reports/` trees
    pub output_dir: PathBuf,

    /// Render matrices and filtered masks
    pub images: bool,

    /// Optional per-row progress callback
    pub progress: Option<ProgressCallback>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            processor_counts: DEFAULT_PROCESSOR_COUNTS.to_vec(),
            crop: 2000,
            sequential_crop: 5000,
            output_dir: PathBuf::from("."),
            images: true,
            progress: None,
        }
    }
}

impl fmt::Debug for BenchmarkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BenchmarkConfig")
            .field("processor_counts", &self.processor_counts)
            .field("crop", &self.crop)
            .field("sequential_crop", &self.sequential_crop)
            .field("output_dir", &self.output_dir)
            .field("images", &self.images)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Everything one strategy run produced
#[derive(Debug, Clone)]
pub struct StrategyOutcome {
    pub strategy: Strategy,
    /// Matrix from the last configuration in the series
    pub matrix: ComparisonMatrix,
    pub samples: Vec<PerformanceSample>,
    pub report: PerformanceReport,
    pub lines: ReportLog,
}

/// Runs strategies over a fixed pair of sequences
pub struct Benchmark {
    config: BenchmarkConfig,
    primary: Sequence,
    secondary: Sequence,
    setup_time: Duration,
    filter: DiagonalFilter,
    image_times: ReportLog,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig, primary: Sequence, secondary: Sequence) -> Self {
        Self {
            config,
            primary,
            secondary,
            setup_time: Duration::ZERO,
            filter: DiagonalFilter::default(),
            image_times: ReportLog::new(),
        }
    }

    /// Non-parallel setup time added to every block time
    pub fn with_setup_time(mut self, setup_time: Duration) -> Self {
        self.setup_time = setup_time;
        self
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Render and filter timings collected so far
    pub fn image_times(&self) -> &ReportLog {
        &self.image_times
    }

    /// Single sequential run
    pub fn run_sequential(&mut self) -> Result<StrategyOutcome> {
        let strategy = Strategy::Sequential;
        info!(
            "Sequential run over {}x{} cells",
            self.primary.len(),
            self.secondary.len()
        );

        let start = Instant::now();
        let matrix = sequential_dotplot(&self.primary, &self.secondary, &self.build_options(1));
        let elapsed = start.elapsed();
        info!("Sequential run took {:.3}s", elapsed.as_secs_f64());

        self.render(
            &matrix,
            self.config.sequential_crop,
            &self.image_path(strategy.name(), "dotplot.png"),
            &self.image_path("filtered", "sequential.png"),
        )?;

        let samples = vec![PerformanceSample::new(1, elapsed)];
        let report = PerformanceReport::from_samples(&samples)?;

        let mut lines = ReportLog::new();
        lines.push(format!("Sequential elapsed time: {}", elapsed.as_secs_f64()));
        lines.push(format!(
            "Sequential block time: {}",
            (elapsed + self.setup_time).as_secs_f64()
        ));

        self.finish(StrategyOutcome {
            strategy,
            matrix,
            samples,
            report,
            lines,
        })
    }

    /// One shared-memory run per configured worker count
    pub fn run_shared_memory(&mut self) -> Result<StrategyOutcome> {
        self.run_series(Strategy::SharedMemory, |primary, secondary, options| {
            shared_memory_dotplot(primary, secondary, options)
        })
    }

    /// One distributed run per configured participant count
    pub fn run_distributed(&mut self) -> Result<StrategyOutcome> {
        self.run_series(Strategy::Distributed, |primary, secondary, options| {
            run_distributed(primary, secondary, options.workers, options)
        })
    }

    fn run_series<F>(&mut self, strategy: Strategy, build: F) -> Result<StrategyOutcome>
    where
        F: Fn(&Sequence, &Sequence, &BuildOptions) -> Result<ComparisonMatrix>,
    {
        let counts = self.config.processor_counts.clone();
        if counts.is_empty() {
            return Err(Error::InvalidInput(format!(
                "{strategy} run needs at least one processor count"
            )));
        }

        let unit = strategy.unit();
        let mut samples = Vec::with_capacity(counts.len());
        let mut last = None;

        for &count in &counts {
            let start = Instant::now();
            let matrix = build(&self.primary, &self.secondary, &self.build_options(count))?;
            let elapsed = start.elapsed();
            info!(
                "{strategy} run with {count} {unit} took {:.3}s",
                elapsed.as_secs_f64()
            );

            let stem = format!("{}_{count}_{unit}.png", strategy.name());
            self.render(
                &matrix,
                self.config.crop,
                &self.image_path(strategy.name(), &format!("dotplot_{count}_{unit}.png")),
                &self.image_path("filtered", &stem),
            )?;

            samples.push(PerformanceSample::new(count, elapsed));
            last = Some(matrix);
        }

        let report = PerformanceReport::from_samples(&samples)?;
        let mut lines = ReportLog::from(report.lines());
        if report.is_relative() {
            lines.push(format!(
                "Speedup and efficiency are relative to {} processors",
                counts[0]
            ));
        }
        for sample in &samples {
            lines.push(format!(
                "Block time with {} processors: {}",
                sample.processors,
                (sample.elapsed + self.setup_time).as_secs_f64()
            ));
        }

        let matrix = last.ok_or_else(|| {
            Error::InvalidInput(format!("{strategy} run produced no matrix"))
        })?;
        self.finish(StrategyOutcome {
            strategy,
            matrix,
            samples,
            report,
            lines,
        })
    }

    fn build_options(&self, workers: usize) -> BuildOptions {
        BuildOptions {
            progress: self.config.progress.clone(),
            workers,
        }
    }

    fn render(
        &mut self,
        matrix: &ComparisonMatrix,
        crop: usize,
        matrix_path: &Path,
        mask_path: &Path,
    ) -> Result<()> {
        if !self.config.images {
            return Ok(());
        }
        let view = matrix.crop(crop, crop);
        save_grayscale(&view, matrix_path, &mut self.image_times)?;
        save_filtered(&view, &self.filter, mask_path, &mut self.image_times)?;
        Ok(())
    }

    fn finish(&self, outcome: StrategyOutcome) -> Result<StrategyOutcome> {
        let name = outcome.strategy.name();
        outcome.lines.flush_to(self.report_path(&format!("{name}.txt")))?;
        write_json(&outcome.report, &self.report_path(&format!("{name}.json")))?;
        if self.config.images {
            self.image_times.flush_to(self.report_path("image_times.txt"))?;
        }
        Ok(outcome)
    }

    fn image_path(&self, dir: &str, file: &str) -> PathBuf {
        self.config.output_dir.join("images").join(dir).join(file)
    }

    fn report_path(&self, file: &str) -> PathBuf {
        self.config.output_dir.join("reports").join(file)
    }
}

fn write_json(report: &PerformanceReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config(dir: &Path, counts: Vec<usize>) -> BenchmarkConfig {
        BenchmarkConfig {
            processor_counts: counts,
            crop: 8,
            sequential_crop: 8,
            output_dir: dir.to_path_buf(),
            ..Default::default()
        }
    }

    fn benchmark(dir: &Path, counts: Vec<usize>) -> Benchmark {
        Benchmark::new(
            config(dir, counts),
            Sequence::from("GATTACAGATTACA"),
            Sequence::from("TACAGATTAC"),
        )
    }

    #[test]
    fn test_default_config() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.processor_counts, vec![1, 2, 4, 8, 16]);
        assert_eq!(config.crop, 2000);
        assert_eq!(config.sequential_crop, 5000);
        assert!(config.images);
    }

    #[test]
    fn test_sequential_outputs() {
        let dir = tempdir().unwrap();
        let mut bench = benchmark(dir.path(), vec![1]).with_setup_time(Duration::from_secs(1));
        let outcome = bench.run_sequential().unwrap();

        assert_eq!(outcome.matrix.shape(), (14, 10));
        assert_eq!(outcome.samples.len(), 1);
        assert_eq!(outcome.report.speedup, vec![1.0]);
        assert_eq!(outcome.lines.len(), 2);
        let block: f64 = outcome.lines.lines()[1]
            .trim_start_matches("Sequential block time: ")
            .parse()
            .unwrap();
        assert!(block >= 1.0);

        let reports = dir.path().join("reports");
        assert!(reports.join("sequential.txt").exists());
        assert!(reports.join("sequential.json").exists());
        assert!(reports.join("image_times.txt").exists());
        assert!(dir.path().join("images/sequential/dotplot.png").exists());
        assert!(dir.path().join("images/filtered/sequential.png").exists());
    }

    #[test]
    fn test_parallel_series_agree_with_sequential() {
        let dir = tempdir().unwrap();
        let mut bench = benchmark(dir.path(), vec![1, 2, 3]);
        let reference = bench.run_sequential().unwrap().matrix;
        let shared = bench.run_shared_memory().unwrap();
        let distributed = bench.run_distributed().unwrap();

        assert_eq!(shared.matrix, reference);
        assert_eq!(distributed.matrix, reference);
        assert_eq!(shared.report.processors, vec![1, 2, 3]);
        assert_eq!(distributed.samples.len(), 3);
        // Three metric blocks plus block times
        assert_eq!(shared.lines.len(), 12);

        for count in [1, 2, 3] {
            let shared_img = format!("images/shared/dotplot_{count}_workers.png");
            let dist_img = format!("images/distributed/dotplot_{count}_participants.png");
            assert!(dir.path().join(shared_img).exists());
            assert!(dir.path().join(dist_img).exists());
        }
        // Two images per configuration plus the sequential pair
        assert_eq!(bench.image_times().len(), 2 + 2 * 3 * 2);
    }

    #[test]
    fn test_json_report_round_trips() {
        let dir = tempdir().unwrap();
        let mut bench = benchmark(dir.path(), vec![1, 2]);
        let outcome = bench.run_shared_memory().unwrap();

        let raw = std::fs::read_to_string(dir.path().join("reports/shared.json")).unwrap();
        let parsed: PerformanceReport = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, outcome.report);
    }

    #[test]
    fn test_images_can_be_disabled() {
        let dir = tempdir().unwrap();
        let mut cfg = config(dir.path(), vec![2]);
        cfg.images = false;
        let mut bench = Benchmark::new(cfg, Sequence::from("ACGT"), Sequence::from("AGCT"));
        bench.run_distributed().unwrap();

        assert!(!dir.path().join("images").exists());
        assert!(bench.image_times().is_empty());
        assert!(dir.path().join("reports/distributed.txt").exists());
    }

    #[test]
    fn test_relative_series_is_flagged() {
        let dir = tempdir().unwrap();
        let mut bench = benchmark(dir.path(), vec![2, 4]);
        let outcome = bench.run_shared_memory().unwrap();
        assert!(outcome.report.is_relative());
        assert_eq!(outcome.report.speedup[0], 1.0);
        assert!(outcome
            .lines
            .lines()
            .iter()
            .any(|l| l == "Speedup and efficiency are relative to 2 processors"));
    }

    #[test]
    fn test_empty_series_rejected() {
        let dir = tempdir().unwrap();
        let mut bench = benchmark(dir.path(), vec![]);
        assert!(matches!(
            bench.run_shared_memory(),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_zero_count_propagates_executor_error() {
        let dir = tempdir().unwrap();
        let mut bench = benchmark(dir.path(), vec![0]);
        assert!(matches!(
            bench.run_distributed(),
            Err(Error::InvalidInput(_))
        ));
    }
}
