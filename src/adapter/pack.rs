//! Planar to interleaved packing.

use byteorder::{BigEndian, ByteOrder as _, LittleEndian};

use crate::config::{ByteOrder, ConversionConfig};
use crate::error::{RasterError, Result};
use crate::raster::DecodedRaster;

use super::layout::PixelLayout;
use super::scale::ChannelScaler;

/// Row stride for `width` pixels, rounded up to `alignment` bytes.
pub(crate) fn row_stride(width: u32, bytes_per_pixel: usize, alignment: usize) -> Result<usize> {
    let overflow = || RasterError::AllocationFailure { bytes: usize::MAX };
    let tight = (width as usize)
        .checked_mul(bytes_per_pixel)
        .ok_or_else(overflow)?;
    let padded = tight
        .checked_add(alignment - 1)
        .ok_or_else(overflow)?
        / alignment
        * alignment;
    Ok(padded)
}

/// Allocate a zeroed buffer, surfacing allocation failure as an error.
fn allocate(len: usize) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| RasterError::AllocationFailure { bytes: len })?;
    buffer.resize(len, 0);
    Ok(buffer)
}

/// Interleave the raster planes into a packed buffer of `stride`-byte rows.
///
/// The raster must already be validated against `layout`. Padding bytes at
/// the end of each row stay zero.
pub(crate) fn pack(
    raster: &DecodedRaster,
    layout: &PixelLayout,
    config: &ConversionConfig,
    stride: usize,
) -> Result<Vec<u8>> {
    let height = raster.height as usize;
    let width = raster.width as usize;
    let len = stride
        .checked_mul(height)
        .ok_or(RasterError::AllocationFailure { bytes: usize::MAX })?;
    let mut buffer = allocate(len)?;

    let target_bits = config.bits_per_component;
    let bytes_per_component = config.bytes_per_component();
    let bytes_per_pixel = layout.channels * bytes_per_component;

    let scalers: Vec<ChannelScaler> = raster.components[..layout.source_channels]
        .iter()
        .map(|component| ChannelScaler::new(component, target_bits))
        .collect();
    let opaque = ((1u32 << target_bits) - 1) as u16;

    for (y, row) in buffer.chunks_exact_mut(stride).enumerate() {
        let row_start = y * width;
        let pixels = row[..width * bytes_per_pixel].chunks_exact_mut(bytes_per_pixel);

        for (x, pixel) in pixels.enumerate() {
            let index = row_start + x;
            for (channel, out) in pixel.chunks_exact_mut(bytes_per_component).enumerate() {
                let value = match scalers.get(channel) {
                    Some(scaler) => scaler.apply(raster.components[channel].samples[index]),
                    None => opaque,
                };
                write_channel(out, value, config.byte_order);
            }
        }
    }

    Ok(buffer)
}

fn write_channel(out: &mut [u8], value: u16, order: ByteOrder) {
    match (out.len(), order) {
        (1, _) => out[0] = value as u8,
        (_, ByteOrder::Big) => BigEndian::write_u16(out, value),
        (_, ByteOrder::Little) => LittleEndian::write_u16(out, value),
    }
}
