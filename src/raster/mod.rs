//! Decoded raster model.
//!
//! A [`DecodedRaster`] is the owned, planar result of a full decode: one
//! sample plane per component, each holding `width * height` samples in
//! row-major order. Samples are kept as `i32` so signed and unsigned codec
//! output share a representation.

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::{RasterError, Result};

/// Largest per-component precision the adapter accepts.
pub const MAX_PRECISION: u32 = 16;

/// Colour space tag reported by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ColorSpace {
    /// Not reported or not recognised.
    #[default]
    Unknown,
    /// Reported as unspecified by the codestream.
    Unspecified,
    /// sRGB.
    Srgb,
    /// Grayscale.
    Gray,
    /// sYCC.
    Sycc,
    /// e-YCC.
    Eycc,
    /// CMYK.
    Cmyk,
}

impl ColorSpace {
    /// Whether samples are in a luma/chroma representation.
    pub fn is_ycc(&self) -> bool {
        matches!(self, ColorSpace::Sycc | ColorSpace::Eycc)
    }

    /// Short human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            ColorSpace::Unknown => "unknown",
            ColorSpace::Unspecified => "unspecified",
            ColorSpace::Srgb => "sRGB",
            ColorSpace::Gray => "gray",
            ColorSpace::Sycc => "sYCC",
            ColorSpace::Eycc => "e-YCC",
            ColorSpace::Cmyk => "CMYK",
        }
    }
}

impl std::fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One component plane of a decoded raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Bit precision of every sample in the plane.
    pub precision: u32,
    /// Whether samples are two's-complement signed.
    pub is_signed: bool,
    /// Whether the codec flagged this component as opacity.
    pub is_alpha: bool,
    /// Row-major samples.
    pub samples: Vec<i32>,
}

impl Component {
    /// Create an unsigned component.
    pub fn new(precision: u32, samples: Vec<i32>) -> Self {
        Self {
            precision,
            is_signed: false,
            is_alpha: false,
            samples,
        }
    }

    /// Create a signed component.
    pub fn signed(precision: u32, samples: Vec<i32>) -> Self {
        Self {
            is_signed: true,
            ..Self::new(precision, samples)
        }
    }

    /// Mark the component as an alpha channel.
    pub fn with_alpha(mut self, is_alpha: bool) -> Self {
        self.is_alpha = is_alpha;
        self
    }
}

/// A fully decoded image, organised as component planes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRaster {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Colour space tag.
    pub color_space: ColorSpace,
    /// Component planes in codestream order.
    pub components: Vec<Component>,
}

impl DecodedRaster {
    /// Create a raster from its parts.
    pub fn new(width: u32, height: u32, color_space: ColorSpace, components: Vec<Component>) -> Self {
        Self {
            width,
            height,
            color_space,
            components,
        }
    }

    /// Single-component grayscale raster.
    pub fn gray(width: u32, height: u32, precision: u32, samples: Vec<i32>) -> Self {
        Self::new(
            width,
            height,
            ColorSpace::Gray,
            vec![Component::new(precision, samples)],
        )
    }

    /// Three-component sRGB raster.
    pub fn rgb(
        width: u32,
        height: u32,
        precision: u32,
        red: Vec<i32>,
        green: Vec<i32>,
        blue: Vec<i32>,
    ) -> Self {
        Self::new(
            width,
            height,
            ColorSpace::Srgb,
            vec![
                Component::new(precision, red),
                Component::new(precision, green),
                Component::new(precision, blue),
            ],
        )
    }

    /// Number of component planes.
    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    /// Number of samples every plane must hold.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether every component reports the same precision.
    pub fn has_uniform_precision(&self) -> bool {
        self.components
            .windows(2)
            .all(|pair| pair[0].precision == pair[1].precision)
    }

    /// Check dimensions, plane lengths and precisions.
    ///
    /// The component count is not checked here; which counts are acceptable
    /// depends on the packed layout being produced.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RasterError::DimensionMismatch(format!(
                "empty raster ({}x{})",
                self.width, self.height
            )));
        }

        let expected = self.pixel_count();
        for (index, component) in self.components.iter().enumerate() {
            if component.samples.len() != expected {
                return Err(RasterError::DimensionMismatch(format!(
                    "component {} has {} samples, expected {} ({}x{})",
                    index,
                    component.samples.len(),
                    expected,
                    self.width,
                    self.height
                )));
            }
        }

        for (index, component) in self.components.iter().enumerate() {
            if component.precision == 0 || component.precision > MAX_PRECISION {
                return Err(RasterError::PrecisionOverflow {
                    component: index,
                    precision: component.precision,
                });
            }
        }

        Ok(())
    }

    /// Split an `image` crate buffer into component planes.
    ///
    /// Luma, RGB and RGBA buffers map directly. Luma+alpha is widened to RGBA
    /// and float buffers are quantised to 16 bits.
    pub fn from_dynamic_image(image: &DynamicImage) -> Result<Self> {
        let (width, height) = (image.width(), image.height());

        let raster = match image {
            DynamicImage::ImageLuma8(buf) => {
                Self::from_interleaved(width, height, ColorSpace::Gray, 8, 1, buf.as_raw())
            }
            DynamicImage::ImageLuma16(buf) => {
                Self::from_interleaved(width, height, ColorSpace::Gray, 16, 1, buf.as_raw())
            }
            DynamicImage::ImageRgb8(buf) => {
                Self::from_interleaved(width, height, ColorSpace::Srgb, 8, 3, buf.as_raw())
            }
            DynamicImage::ImageRgb16(buf) => {
                Self::from_interleaved(width, height, ColorSpace::Srgb, 16, 3, buf.as_raw())
            }
            DynamicImage::ImageRgba8(buf) => {
                Self::from_interleaved(width, height, ColorSpace::Srgb, 8, 4, buf.as_raw())
            }
            DynamicImage::ImageRgba16(buf) => {
                Self::from_interleaved(width, height, ColorSpace::Srgb, 16, 4, buf.as_raw())
            }
            DynamicImage::ImageLumaA16(_) | DynamicImage::ImageRgba32F(_) => {
                let buf = image.to_rgba16();
                Self::from_interleaved(width, height, ColorSpace::Srgb, 16, 4, buf.as_raw())
            }
            DynamicImage::ImageRgb32F(_) => {
                let buf = image.to_rgb16();
                Self::from_interleaved(width, height, ColorSpace::Srgb, 16, 3, buf.as_raw())
            }
            _ => {
                let buf = image.to_rgba8();
                Self::from_interleaved(width, height, ColorSpace::Srgb, 8, 4, buf.as_raw())
            }
        };

        raster.validate()?;
        Ok(raster)
    }

    /// De-interleave `channels`-wide pixels into planes.
    fn from_interleaved<T>(
        width: u32,
        height: u32,
        color_space: ColorSpace,
        precision: u32,
        channels: usize,
        data: &[T],
    ) -> Self
    where
        T: Copy + Into<i32>,
    {
        let mut components: Vec<Component> = (0..channels)
            .map(|_| Component::new(precision, Vec::with_capacity(data.len() / channels)))
            .collect();

        for pixel in data.chunks_exact(channels) {
            for (component, &sample) in components.iter_mut().zip(pixel) {
                component.samples.push(sample.into());
            }
        }

        if channels == 4 {
            components[3].is_alpha = true;
        }

        Self::new(width, height, color_space, components)
    }
}
