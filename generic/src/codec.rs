//! Fixed-point number codec of the wire protocol.
//!
//! A number is four operand bytes in `[128, 255]`, little-endian in 7-bit
//! groups, carrying `round(value * 1000) + 2^27`. That gives three decimals in
//! `[-134217.728, 134217.727]`.

pub const NUMBER_LEN: usize = 4;

pub const MIN_VALUE: f64 = -134217.728;
pub const MAX_VALUE: f64 = 134217.727;

const BIAS: i64 = 1 << 27;
const RAW_MAX: i64 = (1 << 28) - 1;

pub fn decode(chars: &[u8; NUMBER_LEN]) -> f64 {
    let raw = chars
        .iter()
        .rev()
        .fold(0i64, |acc, &c| (acc << 7) | (i64::from(c) - 128));
    (raw - BIAS) as f64 / 1000.0
}

/// Values outside `[MIN_VALUE, MAX_VALUE]` saturate at the boundary.
pub fn encode(value: f64) -> [u8; NUMBER_LEN] {
    let raw = (round_half_away(value * 1000.0) + BIAS).clamp(0, RAW_MAX);
    let mut chars = [0u8; NUMBER_LEN];
    for (i, c) in chars.iter_mut().enumerate() {
        *c = (((raw >> (7 * i)) & 127) + 128) as u8;
    }
    chars
}

// f64::round needs std.
fn round_half_away(v: f64) -> i64 {
    if v >= 0.0 {
        (v + 0.5) as i64
    } else {
        (v - 0.5) as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_literals() {
        assert_eq!(decode(&[128, 128, 128, 128]), -134217.728);
        assert_eq!(decode(&[255, 255, 255, 255]), 134217.727);
        assert_eq!(decode(&[128, 128, 128, 192]), 0.0);
        assert_eq!(encode(0.0), [128, 128, 128, 192]);
        assert_eq!(encode(MIN_VALUE), [128, 128, 128, 128]);
        assert_eq!(encode(MAX_VALUE), [255, 255, 255, 255]);
    }

    #[test]
    fn test_encode_saturates() {
        assert_eq!(encode(1.0e9), [255, 255, 255, 255]);
        assert_eq!(encode(-1.0e9), [128, 128, 128, 128]);
    }

    #[test]
    fn test_roundtrip_three_decimals() {
        let mut milli = -134_217_728i64;
        while milli <= 134_217_727 {
            let v = milli as f64 / 1000.0;
            let chars = encode(v);
            assert!(chars.iter().all(|&c| c >= 128));
            assert_eq!(decode(&chars), v, "value {}", v);
            milli += 7_919;
        }
        for v in [13925.244, -0.001, 0.001, 2012.0, 255.0, -5.5] {
            assert_eq!(decode(&encode(v)), v);
        }
    }

    fn assert_roundtrip(milli: core::ops::RangeInclusive<i64>) {
        for m in milli {
            let v = m as f64 / 1000.0;
            assert_eq!(decode(&encode(v)), v, "value {}", v);
        }
    }

    #[test]
    fn test_roundtrip_dense_near_zero_and_boundaries() {
        assert_roundtrip(-200_000..=200_000);
        assert_roundtrip(-134_217_728..=-134_017_728);
        assert_roundtrip(134_017_727..=134_217_727);
    }

    // every representable value, about 2.7e8 of them
    #[test]
    #[ignore]
    fn test_roundtrip_full_range() {
        assert_roundtrip(-134_217_728..=134_217_727);
    }

    #[test]
    fn test_extra_decimals_are_rounded() {
        assert_eq!(decode(&encode(13925.2443)), 13925.244);
        assert_eq!(decode(&encode(-7.0126)), -7.013);
    }
}
