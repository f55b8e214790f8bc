//! Wire markers of the driveboard protocol.
//!
//! A byte below 128 is a marker, a byte in `[128, 255]` is one of the four
//! operand bytes of an encoded number. Operands always precede the marker that
//! consumes them, in both directions.

// Realtime control, handled by the transport before the protocol sees a byte.
pub const CMD_STOP: u8 = 1;
pub const CMD_RESUME: u8 = 2;
pub const CMD_STATUS: u8 = 3;
pub const CMD_SUPERSTATUS: u8 = 4;
pub const CMD_CHUNK_PROCESSED: u8 = 5;
pub const STATUS_END: u8 = 6;
pub const CMD_RASTER_DATA_START: u8 = 16;
pub const CMD_RASTER_DATA_END: u8 = 17;

pub const INFO_HELLO: u8 = b'~';

/// How the main loop treats one incoming byte.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ByteClass {
    Command(u8),
    Parameter(u8),
    Operand(u8),
    InvalidMarker(u8),
}

pub fn classify(byte: u8) -> ByteClass {
    match byte {
        b'A'..=b'Z' => ByteClass::Command(byte),
        b'a'..=b'z' => ByteClass::Parameter(byte),
        128..=255 => ByteClass::Operand(byte),
        _ => ByteClass::InvalidMarker(byte),
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    None,
    Line,
    Dwell,
    Raster,
    RefRelative,
    RefAbsolute,
    RefStore,
    RefRestore,
    Homing,
    OffsetStore,
    OffsetRestore,
    AirEnable,
    AirDisable,
    AuxEnable,
    AuxDisable,
}

impl Command {
    pub fn from_marker(marker: u8) -> Option<Self> {
        let cmd = match marker {
            b'A' => Command::None,
            b'B' => Command::Line,
            b'C' => Command::Dwell,
            b'D' => Command::Raster,
            b'E' => Command::RefRelative,
            b'F' => Command::RefAbsolute,
            b'G' => Command::RefStore,
            b'H' => Command::RefRestore,
            b'I' => Command::Homing,
            b'J' => Command::OffsetStore,
            b'K' => Command::OffsetRestore,
            b'L' => Command::AirEnable,
            b'M' => Command::AirDisable,
            b'N' => Command::AuxEnable,
            b'O' => Command::AuxDisable,
            _ => return None,
        };
        Some(cmd)
    }

    pub const fn marker(self) -> u8 {
        match self {
            Command::None => b'A',
            Command::Line => b'B',
            Command::Dwell => b'C',
            Command::Raster => b'D',
            Command::RefRelative => b'E',
            Command::RefAbsolute => b'F',
            Command::RefStore => b'G',
            Command::RefRestore => b'H',
            Command::Homing => b'I',
            Command::OffsetStore => b'J',
            Command::OffsetRestore => b'K',
            Command::AirEnable => b'L',
            Command::AirDisable => b'M',
            Command::AuxEnable => b'N',
            Command::AuxDisable => b'O',
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parameter {
    TargetX,
    TargetY,
    TargetZ,
    Feedrate,
    Intensity,
    Duration,
    PixelWidth,
    OffsetX,
    OffsetY,
    OffsetZ,
}

impl Parameter {
    pub fn from_marker(marker: u8) -> Option<Self> {
        let param = match marker {
            b'x' => Parameter::TargetX,
            b'y' => Parameter::TargetY,
            b'z' => Parameter::TargetZ,
            b'f' => Parameter::Feedrate,
            b's' => Parameter::Intensity,
            b'd' => Parameter::Duration,
            b'p' => Parameter::PixelWidth,
            b'h' => Parameter::OffsetX,
            b'i' => Parameter::OffsetY,
            b'j' => Parameter::OffsetZ,
            _ => return None,
        };
        Some(param)
    }

    pub const fn marker(self) -> u8 {
        match self {
            Parameter::TargetX => b'x',
            Parameter::TargetY => b'y',
            Parameter::TargetZ => b'z',
            Parameter::Feedrate => b'f',
            Parameter::Intensity => b's',
            Parameter::Duration => b'd',
            Parameter::PixelWidth => b'p',
            Parameter::OffsetX => b'h',
            Parameter::OffsetY => b'i',
            Parameter::OffsetZ => b'j',
        }
    }
}

/// Single-byte info flags of a status report.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InfoFlag {
    IdleYes,
    DoorOpen,
    ChillerOff,
}

impl InfoFlag {
    pub const fn marker(self) -> u8 {
        match self {
            InfoFlag::IdleYes => b'A',
            InfoFlag::DoorOpen => b'B',
            InfoFlag::ChillerOff => b'C',
        }
    }

    pub fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            b'A' => Some(InfoFlag::IdleYes),
            b'B' => Some(InfoFlag::DoorOpen),
            b'C' => Some(InfoFlag::ChillerOff),
            _ => None,
        }
    }
}

/// Parameter records of a status report: an encoded number followed by one
/// of these markers.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InfoParam {
    PosX,
    PosY,
    PosZ,
    Version,
    BufferUnderrun,
    StackClearance,
    OffsetX,
    OffsetY,
    OffsetZ,
    Feedrate,
    Intensity,
    Duration,
    PixelWidth,
}

impl InfoParam {
    pub const fn marker(self) -> u8 {
        match self {
            InfoParam::PosX => b'x',
            InfoParam::PosY => b'y',
            InfoParam::PosZ => b'z',
            InfoParam::Version => b'v',
            InfoParam::BufferUnderrun => b'w',
            InfoParam::StackClearance => b'u',
            InfoParam::OffsetX => b'a',
            InfoParam::OffsetY => b'b',
            InfoParam::OffsetZ => b'c',
            InfoParam::Feedrate => b'g',
            InfoParam::Intensity => b'h',
            InfoParam::Duration => b'i',
            InfoParam::PixelWidth => b'j',
        }
    }

    pub fn from_marker(marker: u8) -> Option<Self> {
        let param = match marker {
            b'x' => InfoParam::PosX,
            b'y' => InfoParam::PosY,
            b'z' => InfoParam::PosZ,
            b'v' => InfoParam::Version,
            b'w' => InfoParam::BufferUnderrun,
            b'u' => InfoParam::StackClearance,
            b'a' => InfoParam::OffsetX,
            b'b' => InfoParam::OffsetY,
            b'c' => InfoParam::OffsetZ,
            b'g' => InfoParam::Feedrate,
            b'h' => InfoParam::Intensity,
            b'i' => InfoParam::Duration,
            b'j' => InfoParam::PixelWidth,
            _ => return None,
        };
        Some(param)
    }

    pub const fn position(axis: usize) -> Self {
        match axis {
            0 => InfoParam::PosX,
            1 => InfoParam::PosY,
            _ => InfoParam::PosZ,
        }
    }

    pub const fn offset(axis: usize) -> Self {
        match axis {
            0 => InfoParam::OffsetX,
            1 => InfoParam::OffsetY,
            _ => InfoParam::OffsetZ,
        }
    }
}
