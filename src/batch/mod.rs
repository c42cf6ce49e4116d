//! Parallel batch conversion.
//!
//! Every input is an independent decode + convert, so jobs run on a rayon
//! pool with no shared mutable state beyond a cancellation flag and a
//! completion counter.
//!
//! # Example
//!
//! ```rust,ignore
//! use jp2raster::batch::BatchConverter;
//! use jp2raster::ConversionConfig;
//! use std::path::Path;
//!
//! let converter = BatchConverter::new(ConversionConfig::default())
//!     .max_parallel(4)
//!     .recursive(true)
//!     .output_dir("./png".into());
//!
//! let (stats, _results) = converter.process_directory(Path::new("./scans"))?;
//! println!("{} converted, {} failed", stats.successful, stats.failed);
//! ```

mod file_discovery;
mod job;

pub use file_discovery::{FileDiscovery, DEFAULT_PATTERNS};
pub use job::{BatchJob, JobResult, JobStatus};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use crate::adapter::ImageAdapter;
use crate::codec::{DecoderFactory, ImageFormat};
use crate::config::ConversionConfig;
use crate::error::{RasterError, Result};
use crate::handle::PlatformImage;
use crate::pipeline::{BatchStats, ConversionPipeline};
use crate::raster::DecodedRaster;

/// Batch converter for many encoded images.
pub struct BatchConverter {
    config: ConversionConfig,
    max_parallel: usize,
    recursive: bool,
    patterns: Vec<String>,
    output_dir: Option<PathBuf>,
    output_extension: String,
    cancelled: Arc<AtomicBool>,
}

impl BatchConverter {
    /// Create a batch converter using one thread per CPU.
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            config,
            max_parallel: num_cpus::get(),
            recursive: false,
            patterns: DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect(),
            output_dir: None,
            output_extension: "png".to_string(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Set maximum parallel jobs.
    pub fn max_parallel(mut self, n: usize) -> Self {
        self.max_parallel = n.max(1);
        self
    }

    /// Enable recursive directory scanning.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Set file patterns (replaces the defaults).
    pub fn patterns(mut self, patterns: Vec<String>) -> Self {
        self.patterns = patterns;
        self
    }

    /// Write converted images into this directory.
    pub fn output_dir(mut self, path: PathBuf) -> Self {
        self.output_dir = Some(path);
        self
    }

    /// Output file extension, which selects the output format.
    pub fn output_extension(mut self, extension: &str) -> Self {
        self.output_extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Handle that cancels the batch from another thread.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    /// Request cancellation; jobs not yet started are skipped.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn thread_pool(&self) -> Result<rayon::ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_parallel)
            .build()
            .map_err(|e| RasterError::Internal(e.to_string()))
    }

    /// Convert already-decoded rasters in parallel. Results keep input order.
    pub fn convert_rasters(&self, rasters: &[DecodedRaster]) -> Result<Vec<Result<PlatformImage>>> {
        let adapter = ImageAdapter::new(self.config.clone())?;
        let pool = self.thread_pool()?;

        Ok(pool.install(|| {
            rasters
                .par_iter()
                .map(|raster| adapter.convert(raster))
                .collect()
        }))
    }

    /// Discover and convert every matching file under `input_dir`.
    pub fn process_directory(&self, input_dir: &Path) -> Result<(BatchStats, Vec<JobResult>)> {
        self.process_directory_with(input_dir, |_, _| {})
    }

    /// Like [`process_directory`](Self::process_directory), calling
    /// `progress(done, total)` after each job.
    pub fn process_directory_with<F>(
        &self,
        input_dir: &Path,
        progress: F,
    ) -> Result<(BatchStats, Vec<JobResult>)>
    where
        F: Fn(usize, usize) + Send + Sync,
    {
        let files = FileDiscovery::new()
            .recursive(self.recursive)
            .patterns(self.patterns.clone())
            .discover(input_dir)?;

        if files.is_empty() {
            return Err(RasterError::Config(format!(
                "No matching files found in {}",
                input_dir.display()
            )));
        }

        self.run(&files, Some(input_dir), progress)
    }

    /// Convert an explicit list of files.
    pub fn process_files(&self, files: &[PathBuf]) -> Result<(BatchStats, Vec<JobResult>)> {
        if files.is_empty() {
            return Err(RasterError::Config("No files to process".into()));
        }
        self.run(files, None, |_, _| {})
    }

    fn run<F>(
        &self,
        files: &[PathBuf],
        base_dir: Option<&Path>,
        progress: F,
    ) -> Result<(BatchStats, Vec<JobResult>)>
    where
        F: Fn(usize, usize) + Send + Sync,
    {
        if !DecoderFactory::supports_jpeg2000() {
            let jpeg2000 = files
                .iter()
                .filter(|f| ImageFormat::from_path(f).is_jpeg2000())
                .count();
            if jpeg2000 > 0 {
                return Err(RasterError::Config(format!(
                    "{} of {} file(s) are JPEG 2000, which needs the `openjpeg` feature",
                    jpeg2000,
                    files.len()
                )));
            }
        }

        let start = Instant::now();
        let total = files.len();
        let pipeline = ConversionPipeline::new(self.config.clone())?;
        let pool = self.thread_pool()?;
        let completed = AtomicUsize::new(0);

        log::info!("Converting {} file(s) on {} thread(s)", total, self.max_parallel);

        let jobs: Vec<BatchJob> = files
            .iter()
            .enumerate()
            .map(|(id, file)| {
                let job = BatchJob::new(id, file.clone());
                match self.output_path(file, base_dir) {
                    Some(out) => job.with_output(out),
                    None => job,
                }
            })
            .collect();

        let results: Vec<JobResult> = pool.install(|| {
            jobs.into_par_iter()
                .map(|job| {
                    if self.is_cancelled() {
                        return JobResult::cancelled(job);
                    }
                    let result = Self::run_job(&pipeline, job);
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress(done, total);
                    result
                })
                .collect()
        });

        let mut stats = BatchStats {
            total_files: total,
            ..Default::default()
        };
        for result in &results {
            match (&result.status, &result.conversion) {
                (JobStatus::Completed, Some(conversion)) => {
                    stats.successful += 1;
                    stats.total_input_bytes += conversion.input_size;
                    stats.total_packed_bytes += conversion.packed_size;
                }
                (JobStatus::Cancelled, _) => stats.skipped += 1,
                _ => stats.failed += 1,
            }
        }
        stats.total_time_ms = start.elapsed().as_millis() as u64;

        Ok((stats, results))
    }

    fn run_job(pipeline: &ConversionPipeline, job: BatchJob) -> JobResult {
        let start = Instant::now();

        if let Some(parent) = job.output_path.as_deref().and_then(Path::parent) {
            if let Err(e) = std::fs::create_dir_all(parent) {
                return JobResult::failed(job, e.into(), start.elapsed().as_millis() as u64);
            }
        }

        let outcome = pipeline.convert_file(&job.source_path, job.output_path.as_deref());
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(conversion) => JobResult::completed(job, conversion, duration_ms),
            Err(e) => {
                log::warn!("Failed to convert {}: {}", job.file_name(), e);
                JobResult::failed(job, e, duration_ms)
            }
        }
    }

    /// Mirror the input's location under the output directory, swapping
    /// the extension.
    fn output_path(&self, file: &Path, base_dir: Option<&Path>) -> Option<PathBuf> {
        let output_dir = self.output_dir.as_ref()?;

        let relative = base_dir
            .and_then(|base| file.strip_prefix(base).ok())
            .map(Path::to_path_buf)
            .or_else(|| file.file_name().map(PathBuf::from))?;

        Some(output_dir.join(relative).with_extension(&self.output_extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, Rgb};
    use tempfile::TempDir;

    fn write_png(path: &Path) {
        let buf: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_raw(1, 1, vec![10, 20, 30]).unwrap();
        DynamicImage::ImageRgb8(buf).save(path).unwrap();
    }

    #[test]
    fn test_builder() {
        let converter = BatchConverter::new(ConversionConfig::default())
            .max_parallel(0)
            .recursive(true)
            .output_extension(".tiff");

        assert_eq!(converter.max_parallel, 1);
        assert!(converter.recursive);
        assert_eq!(converter.output_extension, "tiff");
        assert_eq!(BatchConverter::new(ConversionConfig::default()).max_parallel, num_cpus::get());
    }

    #[test]
    fn test_output_path_preserves_structure() {
        let converter =
            BatchConverter::new(ConversionConfig::default()).output_dir(PathBuf::from("/out"));

        let path = converter.output_path(Path::new("/in/a/scan.jp2"), Some(Path::new("/in")));
        assert_eq!(path, Some(PathBuf::from("/out/a/scan.png")));

        let path = converter.output_path(Path::new("/elsewhere/scan.j2k"), None);
        assert_eq!(path, Some(PathBuf::from("/out/scan.png")));
    }

    #[test]
    fn test_convert_rasters_keeps_order() {
        let rasters: Vec<DecodedRaster> = (0..16)
            .map(|i| DecodedRaster::gray(1, 1, 8, vec![i]))
            .collect();
        let converter = BatchConverter::new(ConversionConfig::default()).max_parallel(4);

        let results = converter.convert_rasters(&rasters).unwrap();

        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.as_ref().unwrap().data(), &[i as u8]);
        }
    }

    #[test]
    fn test_convert_rasters_reports_each_failure() {
        let rasters = vec![
            DecodedRaster::gray(1, 1, 8, vec![1]),
            DecodedRaster::gray(2, 2, 8, vec![1]),
        ];
        let results = BatchConverter::new(ConversionConfig::default())
            .convert_rasters(&rasters)
            .unwrap();

        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(RasterError::DimensionMismatch(_))));
    }

    #[test]
    fn test_process_directory() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        write_png(&input.path().join("one.png"));
        write_png(&input.path().join("two.png"));
        std::fs::write(input.path().join("broken.png"), b"not a png").unwrap();

        let counter = AtomicUsize::new(0);
        let converter = BatchConverter::new(ConversionConfig::default())
            .patterns(vec!["*.png".into()])
            .output_dir(output.path().to_path_buf())
            .output_extension("bmp");

        let (stats, results) = converter
            .process_directory_with(input.path(), |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        assert_eq!(stats.total_files, 3);
        assert_eq!(stats.successful, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(results.len(), 3);
        assert!(output.path().join("one.bmp").exists());
    }

    #[test]
    fn test_cancelled_batch_skips_jobs() {
        let input = TempDir::new().unwrap();
        write_png(&input.path().join("one.png"));

        let converter = BatchConverter::new(ConversionConfig::default());
        converter.cancel();

        let (stats, _) = converter.process_files(&[input.path().join("one.png")]).unwrap();
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.successful, 0);
    }

    #[cfg(not(feature = "openjpeg"))]
    #[test]
    fn test_jpeg2000_without_decoder_fails_up_front() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        std::fs::write(input.path().join("scan.jp2"), b"not decoded").unwrap();

        let converter = BatchConverter::new(ConversionConfig::default())
            .output_dir(output.path().to_path_buf());

        match converter.process_directory(input.path()) {
            Err(RasterError::Config(msg)) => assert!(msg.contains("openjpeg")),
            other => panic!("expected configuration error, got {:?}", other.map(|(s, _)| s)),
        }
        assert!(std::fs::read_dir(output.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_empty_directory() {
        let input = TempDir::new().unwrap();
        let converter = BatchConverter::new(ConversionConfig::default());
        assert!(converter.process_directory(input.path()).is_err());
    }
}
