//! Conversion pipeline module.
//!
//! Orchestrates decode → convert → (optionally) save for a single input,
//! and reports what happened in a [`ConversionResult`].

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;

use crate::adapter::ImageAdapter;
use crate::codec::{self, ImageFormat};
use crate::config::ConversionConfig;
use crate::error::Result;
use crate::handle::{PackedLayout, PlatformImage};
use crate::raster::DecodedRaster;

/// Result of converting one input.
#[derive(Debug, Serialize)]
pub struct ConversionResult {
    /// Source file path.
    pub source_path: PathBuf,
    /// Output file path (if written).
    pub output_path: Option<PathBuf>,
    /// Detected input format.
    pub format: String,
    /// Encoded input size in bytes.
    pub input_size: usize,
    /// Number of components in the decoded raster.
    pub components: usize,
    /// Per-component precisions reported by the decoder.
    pub precisions: Vec<u32>,
    /// Packed layout produced by the adapter.
    pub layout: PackedLayout,
    /// Packed buffer size in bytes.
    pub packed_size: usize,
    /// Time spent decoding and converting, in milliseconds.
    pub conversion_time_ms: u64,
    /// Any warnings generated.
    pub warnings: Vec<String>,
}

/// Statistics for batch conversion operations.
#[derive(Debug, Default, Clone, Serialize)]
pub struct BatchStats {
    /// Total files processed.
    pub total_files: usize,
    /// Successfully converted files.
    pub successful: usize,
    /// Failed files.
    pub failed: usize,
    /// Files not processed because of cancellation.
    pub skipped: usize,
    /// Total encoded input size.
    pub total_input_bytes: usize,
    /// Total packed size.
    pub total_packed_bytes: usize,
    /// Total processing time in milliseconds.
    pub total_time_ms: u64,
}

impl BatchStats {
    /// Packed bytes produced per encoded input byte.
    pub fn expansion_ratio(&self) -> f64 {
        if self.total_input_bytes == 0 {
            0.0
        } else {
            self.total_packed_bytes as f64 / self.total_input_bytes as f64
        }
    }
}

/// Pipeline for converting encoded images into packed buffers.
#[derive(Debug, Clone, Default)]
pub struct ConversionPipeline {
    adapter: ImageAdapter,
    dry_run: bool,
}

impl ConversionPipeline {
    /// Create a pipeline with the given configuration.
    pub fn new(config: ConversionConfig) -> Result<Self> {
        Ok(Self {
            adapter: ImageAdapter::new(config)?,
            dry_run: false,
        })
    }

    /// Set dry-run mode: convert but never write output files.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The adapter used for conversion.
    pub fn adapter(&self) -> &ImageAdapter {
        &self.adapter
    }

    /// Decode and convert an in-memory image.
    pub fn convert_bytes(&self, data: &[u8]) -> Result<PlatformImage> {
        let raster = codec::decode_bytes(data)?;
        self.adapter.convert(&raster)
    }

    /// Decode an input file and report its packed layout.
    pub fn analyze<P: AsRef<Path>>(&self, input_path: P) -> Result<(DecodedRaster, PackedLayout)> {
        let raster = codec::decode_file(input_path)?;
        let layout = self.adapter.plan(&raster)?;
        Ok((raster, layout))
    }

    /// Convert a file, writing the packed image to `output_path` when given.
    pub fn convert_file<P: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Option<&Path>,
    ) -> Result<ConversionResult> {
        let input_path = input_path.as_ref();
        let start = Instant::now();
        let mut warnings = Vec::new();

        log::info!("Processing: {}", input_path.display());

        let data = std::fs::read(input_path)?;
        let format = ImageFormat::detect(&data);
        let extension_format = ImageFormat::from_path(input_path);
        if extension_format != ImageFormat::Unknown && extension_format != format {
            warnings.push(format!(
                "Extension suggests {} but content is {}",
                extension_format, format
            ));
        }

        let raster = codec::decode_bytes(&data)?;

        if raster.color_space.is_ycc() {
            warnings.push(format!(
                "{} samples packed without colour transform",
                raster.color_space
            ));
        }
        if !raster.has_uniform_precision() {
            warnings.push("Components have differing precisions".into());
        }

        let image = self.adapter.convert(&raster)?;

        let written = match output_path {
            Some(out) if !self.dry_run => {
                image.save(out)?;
                Some(out.to_path_buf())
            }
            _ => None,
        };

        let conversion_time_ms = start.elapsed().as_millis() as u64;

        Ok(ConversionResult {
            source_path: input_path.to_path_buf(),
            output_path: written,
            format: format.name(),
            input_size: data.len(),
            components: raster.num_components(),
            precisions: raster.components.iter().map(|c| c.precision).collect(),
            packed_size: image.data().len(),
            layout: image.layout().clone(),
            conversion_time_ms,
            warnings,
        })
    }
}
