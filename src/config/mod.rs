//! Configuration types for packed-buffer layout.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RasterError, Result};

/// Largest accepted row alignment in bytes.
pub const MAX_ROW_ALIGNMENT: usize = 4096;

/// Byte order of 16-bit channels in the packed buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    /// Most significant byte first (CoreGraphics default).
    #[default]
    Big,
    /// Least significant byte first.
    Little,
}

/// Named configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Preset {
    /// 8-bit channels, tightly packed rows, no synthesised alpha.
    #[default]
    Standard,
    /// 8-bit RGBX/RGBA with 16-byte aligned rows.
    CoreGraphics,
    /// 16-bit channels, tightly packed rows.
    HighPrecision,
}

impl Preset {
    /// Build the configuration for this preset.
    pub fn config(&self) -> ConversionConfig {
        match self {
            Preset::Standard => ConversionConfig::default(),
            Preset::CoreGraphics => ConversionConfig::core_graphics(),
            Preset::HighPrecision => ConversionConfig::high_precision(),
        }
    }
}

/// Configuration for raster to packed-buffer conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Channel depth of the packed buffer (8 or 16).
    pub bits_per_component: u32,
    /// Append an opaque alpha channel to 3-component rasters.
    pub synthesize_alpha: bool,
    /// Row stride is rounded up to a multiple of this many bytes.
    pub row_alignment: usize,
    /// Byte order for 16-bit channels.
    pub byte_order: ByteOrder,
    /// Pack 4-component CMYK rasters as CMYK instead of rejecting them.
    pub cmyk_passthrough: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            bits_per_component: 8,
            synthesize_alpha: false,
            row_alignment: 1,
            byte_order: ByteOrder::Big,
            cmyk_passthrough: true,
        }
    }
}

impl ConversionConfig {
    /// Layout suited to `CGImageCreate` and bitmap contexts.
    pub fn core_graphics() -> Self {
        Self {
            synthesize_alpha: true,
            row_alignment: 16,
            ..Default::default()
        }
    }

    /// Keep up to 16 bits per channel.
    pub fn high_precision() -> Self {
        Self {
            bits_per_component: 16,
            ..Default::default()
        }
    }

    /// Bytes used by one channel in the packed buffer.
    pub fn bytes_per_component(&self) -> usize {
        if self.bits_per_component > 8 {
            2
        } else {
            1
        }
    }

    /// Reject settings the packer cannot honour.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.bits_per_component, 8 | 16) {
            return Err(RasterError::Config(format!(
                "bits_per_component must be 8 or 16, got {}",
                self.bits_per_component
            )));
        }

        if self.row_alignment == 0
            || !self.row_alignment.is_power_of_two()
            || self.row_alignment > MAX_ROW_ALIGNMENT
        {
            return Err(RasterError::Config(format!(
                "row_alignment must be a power of two between 1 and {}, got {}",
                MAX_ROW_ALIGNMENT, self.row_alignment
            )));
        }

        Ok(())
    }

    /// Parse a TOML document. Missing keys take their default values.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        log::debug!("Loaded conversion config from {}", path.display());
        Self::from_toml_str(&contents)
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| RasterError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ConversionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bytes_per_component(), 1);
        assert!(!config.synthesize_alpha);
    }

    #[test]
    fn test_presets() {
        assert_eq!(Preset::Standard.config(), ConversionConfig::default());

        let cg = Preset::CoreGraphics.config();
        assert!(cg.synthesize_alpha);
        assert_eq!(cg.row_alignment, 16);

        let hp = Preset::HighPrecision.config();
        assert_eq!(hp.bits_per_component, 16);
        assert_eq!(hp.bytes_per_component(), 2);
    }

    #[test]
    fn test_invalid_bits() {
        let config = ConversionConfig {
            bits_per_component: 12,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(RasterError::Config(_))));
    }

    #[test]
    fn test_invalid_alignment() {
        for alignment in [0, 3, 8192] {
            let config = ConversionConfig {
                row_alignment: alignment,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "alignment {}", alignment);
        }
    }

    #[test]
    fn test_toml_partial() {
        let config = ConversionConfig::from_toml_str(
            "bits_per_component = 16\nbyte_order = \"little\"\n",
        )
        .unwrap();
        assert_eq!(config.bits_per_component, 16);
        assert_eq!(config.byte_order, ByteOrder::Little);
        assert_eq!(config.row_alignment, 1);
    }

    #[test]
    fn test_toml_rejects_invalid_values() {
        assert!(ConversionConfig::from_toml_str("row_alignment = 6").is_err());
        assert!(ConversionConfig::from_toml_str("bits_per_component = \"eight\"").is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ConversionConfig::core_graphics();
        let text = config.to_toml_string().unwrap();
        assert_eq!(ConversionConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("convert.toml");
        std::fs::write(&path, "synthesize_alpha = true\n").unwrap();

        let config = ConversionConfig::from_file(&path).unwrap();
        assert!(config.synthesize_alpha);
    }
}
