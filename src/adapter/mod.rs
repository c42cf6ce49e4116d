//! Conversion from decoded rasters to packed platform images.
//!
//! The adapter is a pure transform: it reads a [`DecodedRaster`], picks an
//! output layout from the component count and colour space, normalises every
//! sample to the configured channel depth and interleaves the planes into a
//! freshly allocated buffer owned by the returned [`PlatformImage`].
//!
//! # Example
//!
//! ```rust
//! use jp2raster::{convert, DecodedRaster};
//!
//! let raster = DecodedRaster::gray(2, 2, 8, vec![0, 64, 128, 255]);
//! let image = convert(&raster).unwrap();
//!
//! assert_eq!(image.data(), &[0, 64, 128, 255]);
//! assert_eq!(image.bytes_per_row(), 2);
//! ```

mod layout;
mod pack;
mod scale;

use crate::config::ConversionConfig;
use crate::error::Result;
use crate::handle::{PackedLayout, PlatformImage};
use crate::raster::DecodedRaster;

/// Converts decoded rasters into packed images using a fixed configuration.
///
/// Holds no mutable state, so one adapter can serve any number of threads.
#[derive(Debug, Clone, Default)]
pub struct ImageAdapter {
    config: ConversionConfig,
}

impl ImageAdapter {
    /// Create an adapter, rejecting configurations the packer cannot honour.
    pub fn new(config: ConversionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The adapter configuration.
    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Compute the packed layout for `raster` without converting it.
    ///
    /// Runs every check [`convert`](Self::convert) runs, so a successful plan
    /// means conversion can only fail on allocation.
    pub fn plan(&self, raster: &DecodedRaster) -> Result<PackedLayout> {
        self.resolve(raster).map(|(_, packed)| packed)
    }

    fn resolve(&self, raster: &DecodedRaster) -> Result<(layout::PixelLayout, PackedLayout)> {
        let pixel_layout = layout::resolve(raster, &self.config)?;
        raster.validate()?;

        let bits_per_component = self.config.bits_per_component;
        let bytes_per_pixel = pixel_layout.channels * self.config.bytes_per_component();
        let bytes_per_row = pack::row_stride(raster.width, bytes_per_pixel, self.config.row_alignment)?;

        let packed = PackedLayout {
            width: raster.width,
            height: raster.height,
            color_model: pixel_layout.color_model,
            alpha_info: pixel_layout.alpha_info,
            channels: pixel_layout.channels,
            bits_per_component,
            bits_per_pixel: bits_per_component * pixel_layout.channels as u32,
            bytes_per_row,
            byte_order: self.config.byte_order,
            color_space: raster.color_space,
        };

        Ok((pixel_layout, packed))
    }

    /// Convert a raster into an owned packed image.
    pub fn convert(&self, raster: &DecodedRaster) -> Result<PlatformImage> {
        let (pixel_layout, packed) = self.resolve(raster)?;

        if !raster.has_uniform_precision() {
            log::debug!(
                "Mixed component precisions {:?} normalised to {} bits",
                raster.components.iter().map(|c| c.precision).collect::<Vec<_>>(),
                packed.bits_per_component
            );
        }

        let data = pack::pack(raster, &pixel_layout, &self.config, packed.bytes_per_row)?;

        log::debug!(
            "Packed {}x{} {:?} raster into {} bytes ({} bytes/row, {} bpp)",
            packed.width,
            packed.height,
            packed.color_model,
            data.len(),
            packed.bytes_per_row,
            packed.bits_per_pixel
        );

        Ok(PlatformImage::new(packed, data))
    }
}

/// Convert a raster with the default configuration: 8-bit channels, tightly
/// packed rows, no synthesised alpha.
pub fn convert(raster: &DecodedRaster) -> Result<PlatformImage> {
    ImageAdapter::default().convert(raster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RasterError;
    use crate::handle::{AlphaInfo, ColorModel};
    use crate::raster::{ColorSpace, Component};

    #[test]
    fn test_gray_2x2() {
        let raster = DecodedRaster::gray(2, 2, 8, vec![0, 64, 128, 255]);
        let image = convert(&raster).unwrap();

        assert_eq!(image.data(), &[0, 64, 128, 255]);
        assert_eq!(image.bytes_per_row(), 2);
        assert_eq!(image.color_model(), ColorModel::Gray);
        assert_eq!(image.bits_per_pixel(), 8);
    }

    #[test]
    fn test_rgba_passthrough() {
        let raster = DecodedRaster::new(
            1,
            1,
            ColorSpace::Srgb,
            vec![
                Component::new(8, vec![1]),
                Component::new(8, vec![2]),
                Component::new(8, vec![3]),
                Component::new(8, vec![4]).with_alpha(true),
            ],
        );
        let image = convert(&raster).unwrap();

        assert_eq!(image.data(), &[1, 2, 3, 4]);
        assert_eq!(image.alpha_info(), AlphaInfo::Last);
    }

    #[test]
    fn test_plan_matches_convert() {
        let adapter = ImageAdapter::new(ConversionConfig::core_graphics()).unwrap();
        let raster = DecodedRaster::rgb(5, 3, 8, vec![0; 15], vec![0; 15], vec![0; 15]);

        let plan = adapter.plan(&raster).unwrap();
        let image = adapter.convert(&raster).unwrap();

        assert_eq!(&plan, image.layout());
        assert_eq!(plan.bytes_per_row, 32);
        assert_eq!(image.data().len(), 96);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ConversionConfig {
            bits_per_component: 10,
            ..Default::default()
        };
        assert!(matches!(
            ImageAdapter::new(config),
            Err(RasterError::Config(_))
        ));
    }

    #[test]
    fn test_mixed_precision() {
        let raster = DecodedRaster::new(
            1,
            1,
            ColorSpace::Srgb,
            vec![
                Component::new(8, vec![255]),
                Component::new(12, vec![4095]),
                Component::new(16, vec![0]),
            ],
        );
        let image = convert(&raster).unwrap();
        assert_eq!(image.data(), &[255, 255, 0]);
    }

    #[test]
    fn test_layout_checked_before_planes() {
        let raster = DecodedRaster::new(
            2,
            2,
            ColorSpace::Unknown,
            vec![Component::new(8, vec![0]), Component::new(8, vec![0])],
        );
        assert!(matches!(
            convert(&raster),
            Err(RasterError::UnsupportedComponentLayout { components: 2, .. })
        ));
    }
}
