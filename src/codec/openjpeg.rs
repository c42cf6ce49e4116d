//! JPEG 2000 decoding through OpenJPEG.
//!
//! [`from_jpeg2k_image`] is the only place that touches the codec's image
//! structure: it copies dimensions, component properties, colour space and
//! samples into an owned raster. The `jpeg2k::Image` (and the `opj_image_t`
//! behind it) is dropped as soon as decoding returns.

use crate::error::{RasterError, Result};
use crate::raster::{ColorSpace, Component, DecodedRaster};

use super::{DecoderInfo, RasterDecoder};

impl From<jpeg2k::ColorSpace> for ColorSpace {
    fn from(color: jpeg2k::ColorSpace) -> Self {
        #[allow(unreachable_patterns)]
        match color {
            jpeg2k::ColorSpace::Unknown => ColorSpace::Unknown,
            jpeg2k::ColorSpace::Unspecified => ColorSpace::Unspecified,
            jpeg2k::ColorSpace::SRGB => ColorSpace::Srgb,
            jpeg2k::ColorSpace::Gray => ColorSpace::Gray,
            jpeg2k::ColorSpace::SYCC => ColorSpace::Sycc,
            jpeg2k::ColorSpace::EYCC => ColorSpace::Eycc,
            jpeg2k::ColorSpace::CMYK => ColorSpace::Cmyk,
            _ => ColorSpace::Unknown,
        }
    }
}

/// Copy a decoded OpenJPEG image into an owned raster.
///
/// Subsampled components (planes smaller than the image grid) are rejected
/// with [`RasterError::DimensionMismatch`]; upsampling is left to callers.
pub fn from_jpeg2k_image(image: &jpeg2k::Image) -> Result<DecodedRaster> {
    let (width, height) = (image.width(), image.height());

    let components = image
        .components()
        .iter()
        .enumerate()
        .map(|(index, comp)| {
            if comp.width() != width || comp.height() != height {
                return Err(RasterError::DimensionMismatch(format!(
                    "component {} is {}x{}, image is {}x{} (subsampled components are not supported)",
                    index,
                    comp.width(),
                    comp.height(),
                    width,
                    height
                )));
            }

            Ok(Component {
                precision: comp.precision(),
                is_signed: comp.is_signed(),
                is_alpha: comp.is_alpha(),
                samples: comp.data().to_vec(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DecodedRaster::new(
        width,
        height,
        image.color_space().into(),
        components,
    ))
}

/// JPEG 2000 decoder backed by OpenJPEG.
#[derive(Debug, Default)]
pub struct OpenJpegDecoder;

impl OpenJpegDecoder {
    /// Create a new decoder.
    pub fn new() -> Self {
        Self
    }
}

impl RasterDecoder for OpenJpegDecoder {
    fn decode(&self, data: &[u8]) -> Result<DecodedRaster> {
        let image = jpeg2k::Image::from_bytes(data)
            .map_err(|e| RasterError::Codec(format!("OpenJPEG decode failed: {}", e)))?;

        let raster = from_jpeg2k_image(&image)?;

        log::debug!(
            "OpenJPEG decoded {}x{} with {} component(s), colour space {}",
            raster.width,
            raster.height,
            raster.num_components(),
            raster.color_space
        );

        Ok(raster)
    }

    fn info(&self) -> DecoderInfo {
        DecoderInfo {
            name: "OpenJPEG",
            library: "jpeg2k",
            supports_jpeg2000: true,
        }
    }
}
