//! Batch job definitions.

use std::path::PathBuf;

use crate::error::RasterError;
use crate::pipeline::ConversionResult;

/// Outcome of a batch job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Converted successfully.
    Completed,
    /// Decoding, conversion or writing failed.
    Failed,
    /// Not started because the batch was cancelled.
    Cancelled,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "Completed"),
            Self::Failed => write!(f, "Failed"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// One input of a batch.
#[derive(Debug, Clone)]
pub struct BatchJob {
    /// Position in the batch.
    pub id: usize,
    /// Source file path.
    pub source_path: PathBuf,
    /// Where the packed image is written, if anywhere.
    pub output_path: Option<PathBuf>,
}

impl BatchJob {
    /// Create a job without an output path.
    pub fn new(id: usize, source_path: PathBuf) -> Self {
        Self {
            id,
            source_path,
            output_path: None,
        }
    }

    /// Set the output path.
    pub fn with_output(mut self, path: PathBuf) -> Self {
        self.output_path = Some(path);
        self
    }

    /// File name of the source, for display.
    pub fn file_name(&self) -> String {
        self.source_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Result of a batch job.
#[derive(Debug)]
pub struct JobResult {
    /// The job that was processed.
    pub job: BatchJob,
    /// Final status.
    pub status: JobStatus,
    /// Conversion report when successful.
    pub conversion: Option<ConversionResult>,
    /// Error when failed.
    pub error: Option<RasterError>,
    /// Time taken in milliseconds.
    pub duration_ms: u64,
}

impl JobResult {
    pub(crate) fn completed(job: BatchJob, conversion: ConversionResult, duration_ms: u64) -> Self {
        Self {
            job,
            status: JobStatus::Completed,
            conversion: Some(conversion),
            error: None,
            duration_ms,
        }
    }

    pub(crate) fn failed(job: BatchJob, error: RasterError, duration_ms: u64) -> Self {
        Self {
            job,
            status: JobStatus::Failed,
            conversion: None,
            error: Some(error),
            duration_ms,
        }
    }

    pub(crate) fn cancelled(job: BatchJob) -> Self {
        Self {
            job,
            status: JobStatus::Cancelled,
            conversion: None,
            error: None,
            duration_ms: 0,
        }
    }
}
