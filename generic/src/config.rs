#[macro_export]
macro_rules! config {
    (
        $(
            $key:ident : $value:expr
        ),+ $(,)?
    ) => {
        $(
            pub const $key: bool = $value;
        )+
    };
}

#[macro_export]
macro_rules! parameters {
    (
        $(
            $key:ident : $type:ty = $value:expr
        ),+ $(,)?
    ) => {
        $(
            pub const $key: $type = $value;
        )+
    };
}

config! {
    // door/chiller force the laser off, limits are always reported
    ENABLE_INTERLOCKS: cfg!(feature = "interlocks"),
    // report and home the Z axis
    ENABLE_3AXES: cfg!(feature = "three_axes"),
}

parameters! {
    CONFIG_FEEDRATE: f64 = 8000.0, // mm/min
    CONFIG_X_ORIGIN_OFFSET: f64 = 5.0, // mm
    CONFIG_Y_ORIGIN_OFFSET: f64 = 5.0, // mm
    CONFIG_Z_ORIGIN_OFFSET: f64 = 0.0, // mm
    // "20.12"
    FIRMWARE_VERSION: u16 = 2012,
}

/// Session defaults handed to the protocol at startup.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MachineConfig {
    pub feedrate: f64,
    pub origin_offset: [f64; 3],
    pub version: u16,
    pub interlocks: bool,
    pub three_axes: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        MachineConfig {
            feedrate: CONFIG_FEEDRATE,
            origin_offset: [CONFIG_X_ORIGIN_OFFSET, CONFIG_Y_ORIGIN_OFFSET, CONFIG_Z_ORIGIN_OFFSET],
            version: FIRMWARE_VERSION,
            interlocks: ENABLE_INTERLOCKS,
            three_axes: ENABLE_3AXES,
        }
    }
}
