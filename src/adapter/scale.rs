//! Sample precision normalisation.
//!
//! Samples are mapped linearly from `[0, 2^source - 1]` onto
//! `[0, 2^target - 1]` with
//! `scaled = round(sample * (2^target - 1) / (2^source - 1))`, rounding
//! halves up. The division is done in integers so results are exact and
//! reproducible.

use crate::raster::Component;

/// Rescale an unsigned value between bit depths.
pub(crate) fn scale(value: u32, source_bits: u32, target_bits: u32) -> u32 {
    if source_bits == target_bits {
        return value;
    }
    let source_max = (1u64 << source_bits) - 1;
    let target_max = (1u64 << target_bits) - 1;
    ((2 * value as u64 * target_max + source_max) / (2 * source_max)) as u32
}

/// Per-component sample normaliser.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ChannelScaler {
    precision: u32,
    target_bits: u32,
    offset: i64,
    max: i64,
}

impl ChannelScaler {
    /// Scaler for `component` samples into `target_bits` wide channels.
    ///
    /// The component precision must already be validated (1..=16).
    pub(crate) fn new(component: &Component, target_bits: u32) -> Self {
        let precision = component.precision;
        let offset = if component.is_signed {
            1i64 << (precision - 1)
        } else {
            0
        };
        Self {
            precision,
            target_bits,
            offset,
            max: (1i64 << precision) - 1,
        }
    }

    /// Signed samples are shifted to unsigned, out-of-range values clamped,
    /// then rescaled.
    pub(crate) fn apply(&self, sample: i32) -> u16 {
        let value = (sample as i64 + self.offset).clamp(0, self.max) as u32;
        scale(value, self.precision, self.target_bits) as u16
    }
}
