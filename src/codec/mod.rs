//! Codec surface: turning encoded bytes into decoded rasters.
//!
//! Decoding itself is delegated to external libraries:
//! - JPEG 2000 via OpenJPEG (`jpeg2k` crate, `openjpeg` feature)
//! - everything else via the `image` crate
//!
//! Each decoder copies what it needs out of the library's image structure
//! into an owned [`DecodedRaster`], so nothing borrowed from the codec
//! outlives the decode call.

mod format;
mod image_io;
#[cfg(feature = "openjpeg")]
mod openjpeg;

pub use format::{ImageFormat, J2K_CODESTREAM_START, JP2_SIGNATURE};
pub use image_io::ImageCrateDecoder;
#[cfg(feature = "openjpeg")]
pub use openjpeg::{from_jpeg2k_image, OpenJpegDecoder};

use std::path::Path;

use crate::error::{RasterError, Result};
use crate::raster::DecodedRaster;

/// Information about a decoder.
#[derive(Debug, Clone)]
pub struct DecoderInfo {
    /// Human-readable decoder name.
    pub name: &'static str,
    /// Backing library.
    pub library: &'static str,
    /// Whether JPEG 2000 input is handled.
    pub supports_jpeg2000: bool,
}

/// Trait for decoders producing planar rasters.
pub trait RasterDecoder: Send + Sync {
    /// Decode a complete encoded image held in memory.
    fn decode(&self, data: &[u8]) -> Result<DecodedRaster>;

    /// Get decoder information.
    fn info(&self) -> DecoderInfo;
}

/// Factory for creating decoder instances.
pub struct DecoderFactory;

impl DecoderFactory {
    /// Create a decoder for the given format.
    pub fn for_format(format: ImageFormat) -> Result<Box<dyn RasterDecoder>> {
        match format {
            ImageFormat::Jp2 | ImageFormat::J2k => Self::jpeg2000(),
            ImageFormat::Other(_) => Ok(Box::new(ImageCrateDecoder::new())),
            ImageFormat::Unknown => Err(RasterError::Codec("Unrecognized image format".into())),
        }
    }

    /// Detect the format of `data` and create a matching decoder.
    pub fn detect(data: &[u8]) -> Result<Box<dyn RasterDecoder>> {
        Self::for_format(ImageFormat::detect(data))
    }

    /// Whether this build can decode JPEG 2000.
    pub fn supports_jpeg2000() -> bool {
        cfg!(feature = "openjpeg")
    }

    #[cfg(feature = "openjpeg")]
    fn jpeg2000() -> Result<Box<dyn RasterDecoder>> {
        Ok(Box::new(OpenJpegDecoder::new()))
    }

    #[cfg(not(feature = "openjpeg"))]
    fn jpeg2000() -> Result<Box<dyn RasterDecoder>> {
        Err(RasterError::Codec(
            "JPEG 2000 decoding requires the `openjpeg` feature".into(),
        ))
    }
}

/// Decode an in-memory image of any supported format.
pub fn decode_bytes(data: &[u8]) -> Result<DecodedRaster> {
    let format = ImageFormat::detect(data);
    let decoder = DecoderFactory::for_format(format)?;

    log::debug!(
        "Decoding {} bytes as {} with {}",
        data.len(),
        format,
        decoder.info().name
    );

    decoder.decode(data)
}

/// Read and decode an image file.
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<DecodedRaster> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    decode_bytes(&data).map_err(|e| match e {
        RasterError::Codec(msg) => RasterError::Codec(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_format_rejected() {
        assert!(matches!(
            DecoderFactory::for_format(ImageFormat::Unknown),
            Err(RasterError::Codec(_))
        ));
        assert!(decode_bytes(b"garbage").is_err());
    }

    #[test]
    fn test_other_format_uses_image_crate() {
        let decoder = DecoderFactory::for_format(ImageFormat::Other(image::ImageFormat::Png)).unwrap();
        assert_eq!(decoder.info().library, "image");
        assert!(!decoder.info().supports_jpeg2000);
    }

    #[cfg(not(feature = "openjpeg"))]
    #[test]
    fn test_jpeg2000_requires_feature() {
        let err = DecoderFactory::for_format(ImageFormat::Jp2).err().unwrap();
        assert!(err.to_string().contains("openjpeg"));
        assert!(!DecoderFactory::supports_jpeg2000());
    }

    #[test]
    fn test_decode_file_missing() {
        assert!(matches!(
            decode_file("/nonexistent/input.jp2"),
            Err(RasterError::Io(_))
        ));
    }
}
