//! Stack watermark: free RAM is painted with a sentinel at boot and the
//! untouched run above the end of static data is counted later.

pub const STACK_CANARY: u8 = 0xc5;

pub fn paint(region: &mut [u8]) {
    region.fill(STACK_CANARY);
}

/// Bytes from the start of `region` never overwritten since `paint()`.
pub fn clearance(region: &[u8]) -> usize {
    region.iter().take_while(|&&b| b == STACK_CANARY).count()
}

/// Saturates at `u16::MAX`, the largest clearance a status report carries.
pub fn clearance_u16(region: &[u8]) -> u16 {
    u16::try_from(clearance(region)).unwrap_or(u16::MAX)
}
