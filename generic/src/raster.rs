//! Pixel data streamed between `CMD_RASTER_DATA_START` and `CMD_RASTER_DATA_END`.
//!
//! Each pixel travels as one data byte in 128..=255. Host brightness 255
//! (white) maps to 128, black to 255.

/// Wire byte for an 8-bit brightness value.
pub const fn pixel_byte(brightness: u8) -> u8 {
    (255 - brightness) / 2 + 128
}

/// Laser intensity for a pixel byte within a raster line driven at `max`.
pub const fn pixel_intensity(byte: u8, max: u8) -> u8 {
    if byte < 128 {
        return 0;
    }
    let darkness = (byte - 128) as u32 * 2;
    (darkness * max as u32 / 254) as u8
}
