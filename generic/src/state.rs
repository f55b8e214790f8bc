use crate::config::MachineConfig;

pub const X_AXIS: usize = 0;
pub const Y_AXIS: usize = 1;
pub const Z_AXIS: usize = 2;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RefMode {
    Relative,
    Absolute,
}

/// Session configuration of the protocol.
///
/// `target` and `offset` live in the absolute machine frame the stepper
/// reports positions in. Relative updates are resolved when they arrive.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProtocolState {
    pub ref_mode: RefMode,
    pub ref_mode_store: RefMode,
    pub feedrate: f64,     // mm/min
    pub intensity: u8,     // 0-255
    pub duration: f64,     // dwell, seconds
    pub pixel_width: f64,  // raster pixel width in mm
    pub target: [f64; 3],
    pub offset: [f64; 3],
    pub offset_store: [f64; 3],
}

impl ProtocolState {
    pub fn new(config: &MachineConfig) -> Self {
        ProtocolState {
            ref_mode: RefMode::Absolute,
            // single slot; restoring before any store yields these
            ref_mode_store: RefMode::Relative,
            feedrate: config.feedrate,
            intensity: 0,
            duration: 0.0,
            pixel_width: 0.0,
            target: config.origin_offset,
            offset: [0.0; 3],
            offset_store: [0.0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let config = MachineConfig::default();
        let st = ProtocolState::new(&config);
        assert_eq!(st.ref_mode, RefMode::Absolute);
        assert_eq!(st.feedrate, config.feedrate);
        assert_eq!(st.target, config.origin_offset);
        assert_eq!(st.offset, [0.0; 3]);
        assert_eq!(st.intensity, 0);
    }
}
