//! Host side decoder for the board's status stream.

use heapless::Vec;

use crate::accumulator::ParamData;
use crate::driveboard_error::StopError;
use crate::markers::{InfoFlag, InfoParam, CMD_CHUNK_PROCESSED, INFO_HELLO, STATUS_END};

/// One status frame, complete once `STATUS_END` arrives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusReport {
    pub ready: bool,
    pub door_open: bool,
    pub chiller_off: bool,
    pub stops: Vec<StopError, 16>,
    pub position: [f64; 3],
    pub underruns: Option<f64>,
    pub stack_clearance: Option<f64>,
    pub version: Option<f64>,
    pub offset: [Option<f64>; 3],
    pub feedrate: Option<f64>,
    pub intensity: Option<f64>,
    pub duration: Option<f64>,
    pub pixel_width: Option<f64>,
}

impl StatusReport {
    pub fn stopped(&self) -> bool {
        !self.stops.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    Report(StatusReport),
    /// The board consumed another transmit chunk.
    ChunkProcessed,
    Hello,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusParseError {
    UnknownControl(u8),
    UnknownStop(u8),
    UnknownFlag(u8),
    UnknownParam(u8),
    /// A parameter record without exactly four data bytes.
    BadRecord(u8),
}

#[derive(Debug, Default)]
pub struct StatusParser {
    pdata: ParamData,
    current: StatusReport,
}

impl StatusParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, byte: u8) -> Result<Option<StatusEvent>, StatusParseError> {
        match byte {
            CMD_CHUNK_PROCESSED => Ok(Some(StatusEvent::ChunkProcessed)),
            STATUS_END => {
                self.pdata.reset();
                let report = core::mem::take(&mut self.current);
                Ok(Some(StatusEvent::Report(report)))
            }
            INFO_HELLO => Ok(Some(StatusEvent::Hello)),
            0..=31 => Err(StatusParseError::UnknownControl(byte)),
            32..=64 => {
                let code = StopError::from_code(byte).ok_or(StatusParseError::UnknownStop(byte))?;
                // the frame holds each cause at most once
                if !self.current.stops.contains(&code) {
                    let _ = self.current.stops.push(code);
                }
                Ok(None)
            }
            b'A'..=b'Z' => {
                match InfoFlag::from_marker(byte).ok_or(StatusParseError::UnknownFlag(byte))? {
                    InfoFlag::IdleYes => self.current.ready = true,
                    InfoFlag::DoorOpen => self.current.door_open = true,
                    InfoFlag::ChillerOff => self.current.chiller_off = true,
                }
                Ok(None)
            }
            b'a'..=b'z' => {
                let res = self.on_param(byte);
                self.pdata.reset();
                res.map(|_| None)
            }
            128..=255 => {
                // a fifth byte shows up as a bad record at the next marker
                let _ = self.pdata.push(byte);
                Ok(None)
            }
            _ => Err(StatusParseError::UnknownControl(byte)),
        }
    }

    fn on_param(&mut self, marker: u8) -> Result<(), StatusParseError> {
        let val = self.pdata.value().map_err(|_| StatusParseError::BadRecord(marker))?;
        let param = InfoParam::from_marker(marker).ok_or(StatusParseError::UnknownParam(marker))?;
        let r = &mut self.current;
        match param {
            InfoParam::PosX => r.position[0] = val,
            InfoParam::PosY => r.position[1] = val,
            InfoParam::PosZ => r.position[2] = val,
            InfoParam::Version => r.version = Some(val),
            InfoParam::BufferUnderrun => r.underruns = Some(val),
            InfoParam::StackClearance => r.stack_clearance = Some(val),
            InfoParam::OffsetX => r.offset[0] = Some(val),
            InfoParam::OffsetY => r.offset[1] = Some(val),
            InfoParam::OffsetZ => r.offset[2] = Some(val),
            InfoParam::Feedrate => r.feedrate = Some(val),
            InfoParam::Intensity => r.intensity = Some(val),
            InfoParam::Duration => r.duration = Some(val),
            InfoParam::PixelWidth => r.pixel_width = Some(val),
        }
        Ok(())
    }
}
