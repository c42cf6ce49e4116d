//! Decoder for non-JPEG 2000 formats backed by the `image` crate.

use crate::error::Result;
use crate::raster::DecodedRaster;

use super::{DecoderInfo, RasterDecoder};

/// Decodes PNG, TIFF, BMP and the other `image` formats into planar rasters.
#[derive(Debug, Default)]
pub struct ImageCrateDecoder;

impl ImageCrateDecoder {
    /// Create a new decoder.
    pub fn new() -> Self {
        Self
    }
}

impl RasterDecoder for ImageCrateDecoder {
    fn decode(&self, data: &[u8]) -> Result<DecodedRaster> {
        let image = image::load_from_memory(data)?;
        DecodedRaster::from_dynamic_image(&image)
    }

    fn info(&self) -> DecoderInfo {
        DecoderInfo {
            name: "image",
            library: "image",
            supports_jpeg2000: false,
        }
    }
}
