//! Receive side filter run in the UART interrupt.
//!
//! The host sends every byte twice. A pair that disagrees is a transmission
//! error. Control bytes act immediately and never reach the protocol buffer;
//! raster pixels are routed to their own queue.

use crate::markers::{
    CMD_RASTER_DATA_END, CMD_RASTER_DATA_START, CMD_RESUME, CMD_STATUS, CMD_STOP, CMD_SUPERSTATUS,
};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Control {
    Stop,
    Resume,
    Status,
    Superstatus,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxEvent {
    /// Byte for the protocol parser.
    Byte(u8),
    RasterPixel(u8),
    Control(Control),
    TransmissionError,
}

#[derive(Debug, Default)]
pub struct RxFilter {
    first: Option<u8>,
    raster: bool,
}

impl RxFilter {
    pub const fn new() -> Self {
        RxFilter { first: None, raster: false }
    }

    pub fn in_raster(&self) -> bool {
        self.raster
    }

    /// Drops a half received pair and leaves raster mode.
    pub fn reset(&mut self) {
        self.first = None;
        self.raster = false;
    }

    pub fn push(&mut self, byte: u8) -> Option<RxEvent> {
        let Some(first) = self.first.take() else {
            self.first = Some(byte);
            return None;
        };
        if first != byte {
            return Some(RxEvent::TransmissionError);
        }

        let event = match byte {
            CMD_STOP => RxEvent::Control(Control::Stop),
            CMD_RESUME => {
                self.raster = false;
                RxEvent::Control(Control::Resume)
            }
            CMD_STATUS => RxEvent::Control(Control::Status),
            CMD_SUPERSTATUS => RxEvent::Control(Control::Superstatus),
            CMD_RASTER_DATA_START => {
                self.raster = true;
                return None;
            }
            CMD_RASTER_DATA_END => {
                self.raster = false;
                return None;
            }
            b if self.raster && b >= 128 => RxEvent::RasterPixel(b),
            b => RxEvent::Byte(b),
        };
        Some(event)
    }
}
