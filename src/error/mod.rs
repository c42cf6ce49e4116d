//! Error types for the raster conversion library.

use thiserror::Error;

/// Result type alias for the library.
pub type Result<T> = std::result::Result<T, RasterError>;

/// Main error type for raster decoding and conversion.
#[derive(Error, Debug)]
pub enum RasterError {
    /// The number of components (or their colour space) has no packed layout.
    #[error("Unsupported component layout: {components} component(s) ({reason})")]
    UnsupportedComponentLayout {
        /// Number of components in the raster.
        components: usize,
        /// Why the layout was rejected.
        reason: String,
    },

    /// A component plane disagrees with the raster dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Component precision outside the supported 1..=16 bit range.
    #[error("Precision overflow: component {component} has {precision} bits (supported: 1-16)")]
    PrecisionOverflow {
        /// Index of the offending component.
        component: usize,
        /// Reported precision in bits.
        precision: u32,
    },

    /// The packed buffer could not be allocated.
    #[error("Allocation failure: could not allocate {bytes} bytes for packed buffer")]
    AllocationFailure {
        /// Requested size in bytes (saturated on overflow).
        bytes: usize,
    },

    /// Error raised by the codec surface while decoding.
    #[error("Codec error: {0}")]
    Codec(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The packed image cannot be exported to the requested target.
    #[error("Export error: {0}")]
    Export(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<image::ImageError> for RasterError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => RasterError::Io(e),
            other => RasterError::Codec(other.to_string()),
        }
    }
}

impl From<toml::de::Error> for RasterError {
    fn from(err: toml::de::Error) -> Self {
        RasterError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RasterError::UnsupportedComponentLayout {
            components: 2,
            reason: "expected 1, 3 or 4".into(),
        };
        assert!(err.to_string().contains("2 component(s)"));

        let err = RasterError::PrecisionOverflow {
            component: 1,
            precision: 17,
        };
        assert!(err.to_string().contains("17 bits"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: RasterError = io.into();
        assert!(matches!(err, RasterError::Io(_)));
    }
}
