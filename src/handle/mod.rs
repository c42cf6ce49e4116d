//! Packed platform image handle.
//!
//! [`PlatformImage`] owns its interleaved byte buffer together with the
//! metadata a host 2D graphics API needs to wrap it: the values map one to
//! one onto the `CGImageCreate` parameters (bits per component, bits per
//! pixel, bytes per row, colour space model and `CGBitmapInfo`).

use std::path::Path;

use byteorder::{BigEndian, ByteOrder as _, LittleEndian};
use image::{DynamicImage, ImageBuffer, Luma, Rgb, Rgba};
use serde::{Deserialize, Serialize};

use crate::config::ByteOrder;
use crate::error::{RasterError, Result};
use crate::raster::ColorSpace;

/// `kCGBitmapByteOrder16Little`.
pub const BYTE_ORDER_16_LITTLE: u32 = 1 << 12;
/// `kCGBitmapByteOrder16Big`.
pub const BYTE_ORDER_16_BIG: u32 = 3 << 12;

/// Colour model of the packed pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorModel {
    /// Single luminance channel.
    Gray,
    /// Red, green, blue (optionally followed by alpha).
    Rgb,
    /// Cyan, magenta, yellow, black.
    Cmyk,
}

impl ColorModel {
    /// Number of colour channels, excluding alpha.
    pub fn color_channels(&self) -> usize {
        match self {
            ColorModel::Gray => 1,
            ColorModel::Rgb => 3,
            ColorModel::Cmyk => 4,
        }
    }
}

/// Placement and meaning of the alpha channel, mirroring `CGImageAlphaInfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlphaInfo {
    /// No alpha channel.
    None,
    /// Straight alpha stored after the colour channels.
    Last,
    /// Trailing channel present but ignored (always fully opaque).
    NoneSkipLast,
}

impl AlphaInfo {
    /// Raw `CGImageAlphaInfo` value.
    pub fn raw(&self) -> u32 {
        match self {
            AlphaInfo::None => 0,
            AlphaInfo::Last => 3,
            AlphaInfo::NoneSkipLast => 5,
        }
    }

    /// Whether the layout carries a trailing fourth channel.
    pub fn has_channel(&self) -> bool {
        !matches!(self, AlphaInfo::None)
    }
}

/// Geometry and format of a packed buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedLayout {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Colour model.
    pub color_model: ColorModel,
    /// Alpha channel description.
    pub alpha_info: AlphaInfo,
    /// Channels per pixel, including alpha.
    pub channels: usize,
    /// Bits per channel (8 or 16).
    pub bits_per_component: u32,
    /// Bits per pixel.
    pub bits_per_pixel: u32,
    /// Row stride in bytes, including padding.
    pub bytes_per_row: usize,
    /// Byte order of 16-bit channels.
    pub byte_order: ByteOrder,
    /// Colour space tag carried over from the raster.
    pub color_space: ColorSpace,
}

impl PackedLayout {
    /// Bytes per pixel.
    pub fn bytes_per_pixel(&self) -> usize {
        self.bits_per_pixel as usize / 8
    }

    /// Bytes of pixel data in a row, without padding.
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.bytes_per_pixel()
    }

    /// Total buffer size in bytes.
    pub fn buffer_len(&self) -> usize {
        self.bytes_per_row * self.height as usize
    }

    /// `CGBitmapInfo` word: alpha info in the low bits plus the 16-bit byte
    /// order flag. 8-bit layouts use the default byte order (zero).
    pub fn bitmap_info(&self) -> u32 {
        let order = match (self.bits_per_component, self.byte_order) {
            (16, ByteOrder::Big) => BYTE_ORDER_16_BIG,
            (16, ByteOrder::Little) => BYTE_ORDER_16_LITTLE,
            _ => 0,
        };
        self.alpha_info.raw() | order
    }
}

/// An owned packed image ready to hand to a host graphics API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformImage {
    layout: PackedLayout,
    data: Vec<u8>,
}

impl PlatformImage {
    pub(crate) fn new(layout: PackedLayout, data: Vec<u8>) -> Self {
        debug_assert_eq!(layout.buffer_len(), data.len());
        Self { layout, data }
    }

    /// Buffer geometry and format.
    pub fn layout(&self) -> &PackedLayout {
        &self.layout
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.layout.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.layout.height
    }

    /// Row stride in bytes.
    pub fn bytes_per_row(&self) -> usize {
        self.layout.bytes_per_row
    }

    /// Bits per channel.
    pub fn bits_per_component(&self) -> u32 {
        self.layout.bits_per_component
    }

    /// Bits per pixel.
    pub fn bits_per_pixel(&self) -> u32 {
        self.layout.bits_per_pixel
    }

    /// Colour model.
    pub fn color_model(&self) -> ColorModel {
        self.layout.color_model
    }

    /// Alpha channel description.
    pub fn alpha_info(&self) -> AlphaInfo {
        self.layout.alpha_info
    }

    /// Colour space tag of the source raster.
    pub fn color_space(&self) -> ColorSpace {
        self.layout.color_space
    }

    /// `CGBitmapInfo` word for this buffer.
    pub fn bitmap_info(&self) -> u32 {
        self.layout.bitmap_info()
    }

    /// Whether rows carry alignment padding.
    pub fn is_padded(&self) -> bool {
        self.layout.bytes_per_row != self.layout.row_bytes()
    }

    /// The packed buffer, padding included.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Take ownership of the packed buffer.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Pixel bytes of row `y`, without padding.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.layout.height {
            return None;
        }
        let start = y as usize * self.layout.bytes_per_row;
        self.data.get(start..start + self.layout.row_bytes())
    }

    /// Bytes of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.layout.width {
            return None;
        }
        let bpp = self.layout.bytes_per_pixel();
        let start = x as usize * bpp;
        self.row(y)?.get(start..start + bpp)
    }

    /// Copy the pixel rows into a contiguous buffer without padding.
    fn tight_bytes(&self) -> Vec<u8> {
        if !self.is_padded() {
            return self.data.clone();
        }
        let mut out = Vec::with_capacity(self.layout.row_bytes() * self.layout.height as usize);
        for row in self.data.chunks_exact(self.layout.bytes_per_row) {
            out.extend_from_slice(&row[..self.layout.row_bytes()]);
        }
        out
    }

    /// Export to an `image` crate buffer.
    ///
    /// Row padding is stripped and 16-bit channels are decoded from the
    /// configured byte order. CMYK has no `image` equivalent and fails with
    /// [`RasterError::Export`].
    pub fn to_dynamic_image(&self) -> Result<DynamicImage> {
        let (width, height) = (self.layout.width, self.layout.height);
        let channels = self.layout.channels;

        if self.layout.color_model == ColorModel::Cmyk {
            return Err(RasterError::Export(
                "CMYK buffers cannot be represented as a DynamicImage".into(),
            ));
        }

        let bytes = self.tight_bytes();
        let size_error = || RasterError::Export("packed buffer does not match its layout".into());

        let image = if self.layout.bits_per_component == 8 {
            match channels {
                1 => DynamicImage::ImageLuma8(
                    ImageBuffer::<Luma<u8>, _>::from_raw(width, height, bytes).ok_or_else(size_error)?,
                ),
                3 => DynamicImage::ImageRgb8(
                    ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, bytes).ok_or_else(size_error)?,
                ),
                4 => DynamicImage::ImageRgba8(
                    ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, bytes).ok_or_else(size_error)?,
                ),
                n => return Err(RasterError::Export(format!("{} channels", n))),
            }
        } else {
            let mut words = vec![0u16; bytes.len() / 2];
            match self.layout.byte_order {
                ByteOrder::Big => BigEndian::read_u16_into(&bytes, &mut words),
                ByteOrder::Little => LittleEndian::read_u16_into(&bytes, &mut words),
            }
            match channels {
                1 => DynamicImage::ImageLuma16(
                    ImageBuffer::<Luma<u16>, _>::from_raw(width, height, words).ok_or_else(size_error)?,
                ),
                3 => DynamicImage::ImageRgb16(
                    ImageBuffer::<Rgb<u16>, _>::from_raw(width, height, words).ok_or_else(size_error)?,
                ),
                4 => DynamicImage::ImageRgba16(
                    ImageBuffer::<Rgba<u16>, _>::from_raw(width, height, words).ok_or_else(size_error)?,
                ),
                n => return Err(RasterError::Export(format!("{} channels", n))),
            }
        };

        Ok(image)
    }

    /// Save through the `image` crate; the format follows the extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.to_dynamic_image()?.save(path)?;
        log::debug!("Saved {}x{} image to {}", self.width(), self.height(), path.display());
        Ok(())
    }
}
