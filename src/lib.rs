//! JPEG 2000 Raster Adapter Library
//!
//! Converts decoded JPEG 2000 rasters (planar components with arbitrary
//! precision and signedness) into packed, interleaved pixel buffers laid
//! out the way a host graphics API expects to receive them.
//!
//! # Features
//!
//! - **Layout selection**: grayscale, RGB, RGBA and CMYK from the component
//!   count and colour space
//! - **Depth normalisation**: any precision from 1 to 16 bits scaled to 8 or
//!   16 bits per channel, with signed samples level-shifted first
//! - **Configurable packing**: row alignment, synthesised opaque alpha and
//!   16-bit byte order
//! - **Decoding**: OpenJPEG behind the `openjpeg` feature, the `image` crate
//!   for everything else
//! - **Batch conversion**: parallel directory conversion on a rayon pool
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use jp2raster::{ConversionConfig, ImageAdapter};
//!
//! let raster = jp2raster::decode_file("scan.jp2")?;
//!
//! let adapter = ImageAdapter::new(ConversionConfig::core_graphics())?;
//! let image = adapter.convert(&raster)?;
//!
//! println!(
//!     "{}x{}, {} bytes/row, bitmap info {:#x}",
//!     image.width(),
//!     image.height(),
//!     image.bytes_per_row(),
//!     image.bitmap_info()
//! );
//! ```
//!
//! # Sample Scaling
//!
//! A sample `v` of precision `s` maps to `round(v * (2^t - 1) / (2^s - 1))`
//! at target depth `t`, so full scale maps to full scale at every
//! precision. Signed samples are offset by `2^(s-1)` first and anything
//! outside the component's range is clamped.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapter;
pub mod batch;
pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod handle;
pub mod pipeline;
pub mod raster;

// Re-export commonly used types
pub use adapter::{convert, ImageAdapter};
pub use codec::{decode_bytes, decode_file, DecoderFactory, ImageFormat, RasterDecoder};
pub use config::{ByteOrder, ConversionConfig, Preset};
pub use error::{RasterError, Result};
pub use handle::{AlphaInfo, ColorModel, PackedLayout, PlatformImage};
pub use pipeline::{BatchStats, ConversionPipeline, ConversionResult};
pub use raster::{ColorSpace, Component, DecodedRaster};

/// Library version information.
pub mod version {
    /// Library version string.
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    /// Library name.
    pub const NAME: &str = env!("CARGO_PKG_NAME");

    /// Version string including the enabled decoders.
    pub fn full_version() -> String {
        let decoders = if cfg!(feature = "openjpeg") {
            "openjpeg, image"
        } else {
            "image"
        };
        format!("{} {} ({})", NAME, VERSION, decoders)
    }
}
