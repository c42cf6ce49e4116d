//! Input format detection.

use std::path::Path;

/// JP2 signature box: length 12, type `jP  `, content `0D 0A 87 0A`.
pub const JP2_SIGNATURE: [u8; 12] = [
    0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20, 0x0D, 0x0A, 0x87, 0x0A,
];

/// Raw codestream start: SOC marker followed by SIZ.
pub const J2K_CODESTREAM_START: [u8; 4] = [0xFF, 0x4F, 0xFF, 0x51];

/// Encoded input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// JPEG 2000 file with JP2 box structure.
    Jp2,
    /// Raw JPEG 2000 codestream.
    J2k,
    /// Any other format the `image` crate recognises.
    Other(image::ImageFormat),
    /// Unrecognised data.
    Unknown,
}

impl ImageFormat {
    /// Detect the format from leading bytes.
    pub fn detect(data: &[u8]) -> Self {
        if data.starts_with(&JP2_SIGNATURE) {
            return ImageFormat::Jp2;
        }
        if data.starts_with(&J2K_CODESTREAM_START) {
            return ImageFormat::J2k;
        }
        match image::guess_format(data) {
            Ok(format) => ImageFormat::Other(format),
            Err(_) => ImageFormat::Unknown,
        }
    }

    /// Guess the format from a file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "jp2" | "jpx" | "jpf" => ImageFormat::Jp2,
            "j2k" | "j2c" | "jpc" => ImageFormat::J2k,
            _ => match image::ImageFormat::from_extension(&ext) {
                Some(format) => ImageFormat::Other(format),
                None => ImageFormat::Unknown,
            },
        }
    }

    /// Whether this is a JPEG 2000 container or codestream.
    pub fn is_jpeg2000(&self) -> bool {
        matches!(self, ImageFormat::Jp2 | ImageFormat::J2k)
    }

    /// Short human-readable name.
    pub fn name(&self) -> String {
        match self {
            ImageFormat::Jp2 => "JP2".into(),
            ImageFormat::J2k => "J2K codestream".into(),
            ImageFormat::Other(format) => format!("{:?}", format),
            ImageFormat::Unknown => "unknown".into(),
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
