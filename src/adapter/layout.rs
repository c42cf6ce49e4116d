//! Output layout selection.

use crate::config::ConversionConfig;
use crate::error::{RasterError, Result};
use crate::handle::{AlphaInfo, ColorModel};
use crate::raster::{ColorSpace, DecodedRaster};

/// How raster components map onto packed channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PixelLayout {
    pub color_model: ColorModel,
    pub alpha_info: AlphaInfo,
    /// Components read from the raster.
    pub source_channels: usize,
    /// Channels written per pixel, synthesised alpha included.
    pub channels: usize,
}

fn unsupported(components: usize, reason: impl Into<String>) -> RasterError {
    RasterError::UnsupportedComponentLayout {
        components,
        reason: reason.into(),
    }
}

/// Pick the packed layout for a raster's component count and colour space.
pub(crate) fn resolve(raster: &DecodedRaster, config: &ConversionConfig) -> Result<PixelLayout> {
    let count = raster.num_components();
    let color_space = raster.color_space;

    let layout = match count {
        1 => PixelLayout {
            color_model: ColorModel::Gray,
            alpha_info: AlphaInfo::None,
            source_channels: 1,
            channels: 1,
        },
        3 => {
            if color_space == ColorSpace::Cmyk {
                return Err(unsupported(count, "CMYK needs 4 components"));
            }
            if color_space.is_ycc() {
                log::warn!(
                    "{} raster packed as RGB without a colour transform",
                    color_space
                );
            }
            if config.synthesize_alpha {
                PixelLayout {
                    color_model: ColorModel::Rgb,
                    alpha_info: AlphaInfo::NoneSkipLast,
                    source_channels: 3,
                    channels: 4,
                }
            } else {
                PixelLayout {
                    color_model: ColorModel::Rgb,
                    alpha_info: AlphaInfo::None,
                    source_channels: 3,
                    channels: 3,
                }
            }
        }
        4 if color_space == ColorSpace::Cmyk => {
            if !config.cmyk_passthrough {
                return Err(unsupported(count, "CMYK passthrough disabled"));
            }
            PixelLayout {
                color_model: ColorModel::Cmyk,
                alpha_info: AlphaInfo::None,
                source_channels: 4,
                channels: 4,
            }
        }
        4 => PixelLayout {
            color_model: ColorModel::Rgb,
            alpha_info: AlphaInfo::Last,
            source_channels: 4,
            channels: 4,
        },
        _ => return Err(unsupported(count, "expected 1, 3 or 4")),
    };

    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Component;

    fn raster(count: usize, color_space: ColorSpace) -> DecodedRaster {
        let components = (0..count).map(|_| Component::new(8, vec![0])).collect();
        DecodedRaster::new(1, 1, color_space, components)
    }

    #[test]
    fn test_gray() {
        let layout = resolve(&raster(1, ColorSpace::Gray), &ConversionConfig::default()).unwrap();
        assert_eq!(layout.color_model, ColorModel::Gray);
        assert_eq!(layout.channels, 1);
    }

    #[test]
    fn test_rgb_with_and_without_alpha() {
        let plain = resolve(&raster(3, ColorSpace::Srgb), &ConversionConfig::default()).unwrap();
        assert_eq!(plain.channels, 3);
        assert_eq!(plain.alpha_info, AlphaInfo::None);

        let config = ConversionConfig {
            synthesize_alpha: true,
            ..Default::default()
        };
        let padded = resolve(&raster(3, ColorSpace::Srgb), &config).unwrap();
        assert_eq!(padded.source_channels, 3);
        assert_eq!(padded.channels, 4);
        assert_eq!(padded.alpha_info, AlphaInfo::NoneSkipLast);
    }

    #[test]
    fn test_four_components_by_color_space() {
        let config = ConversionConfig::default();

        let rgba = resolve(&raster(4, ColorSpace::Unknown), &config).unwrap();
        assert_eq!(rgba.color_model, ColorModel::Rgb);
        assert_eq!(rgba.alpha_info, AlphaInfo::Last);

        let cmyk = resolve(&raster(4, ColorSpace::Cmyk), &config).unwrap();
        assert_eq!(cmyk.color_model, ColorModel::Cmyk);
        assert_eq!(cmyk.alpha_info, AlphaInfo::None);
    }

    #[test]
    fn test_cmyk_passthrough_disabled() {
        let config = ConversionConfig {
            cmyk_passthrough: false,
            ..Default::default()
        };
        assert!(resolve(&raster(4, ColorSpace::Cmyk), &config).is_err());
    }

    #[test]
    fn test_unsupported_counts() {
        let config = ConversionConfig::default();
        for count in [0, 2, 5] {
            let err = resolve(&raster(count, ColorSpace::Unknown), &config).unwrap_err();
            assert!(
                matches!(err, RasterError::UnsupportedComponentLayout { components, .. } if components == count)
            );
        }
        assert!(resolve(&raster(3, ColorSpace::Cmyk), &config).is_err());
    }
}
