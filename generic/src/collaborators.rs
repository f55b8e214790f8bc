//! Interfaces of the subsystems the protocol drives: the motion planner, the
//! stepper, the serial transport, the sense/control I/O and the stack monitor.

use embedded_hal_nb::serial::{Read, Write};

use crate::driveboard_error::StopError;

/// One entry of the planner's bounded block buffer.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Block {
    /// Straight move to an absolute machine target. A non-zero `pixel_width`
    /// makes it a raster line modulated by streamed pixel data.
    Line { target: [f64; 3], feedrate: f64, intensity: u8, pixel_width: f64 },
    Dwell { duration: f64, intensity: u8 },
    AirAssist(bool),
    AuxAssist(bool),
}

pub trait Planner {
    /// Hands the block back when the buffer is full.
    fn try_push(&mut self, block: Block) -> Result<(), Block>;

    /// Whether any block is still queued.
    fn blocks_available(&self) -> bool;

    fn reset_block_buffer(&mut self);

    /// Resynchronizes the planner's notion of position, in machine mm.
    fn set_position(&mut self, position: [f64; 3]);
}

pub trait Stepper {
    /// Absolute machine position in mm.
    fn position(&self) -> [f64; 3];

    /// Whether any motion is still queued or executing.
    fn processing(&self) -> bool;

    /// Runs to completion; the machine is at zero afterwards.
    fn homing_cycle(&mut self);

    fn request_stop(&self, code: StopError);

    fn stop_requested(&self) -> bool;

    /// The latched stop cause, if any.
    fn stop_status(&self) -> Option<StopError>;
}

/// Byte transport to the host. Reads return `WouldBlock` when no byte is
/// buffered; writes return `WouldBlock` while the send buffer is full.
pub trait Transport: Read<u8> + Write<u8> {
    fn data_available(&mut self) -> bool;
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Limit {
    X1,
    X2,
    Y1,
    Y2,
    Z1,
    Z2,
}

impl Limit {
    pub const ALL: [Limit; 6] = [Limit::X1, Limit::X2, Limit::Y1, Limit::Y2, Limit::Z1, Limit::Z2];

    pub const fn stop_error(self) -> StopError {
        match self {
            Limit::X1 => StopError::LimitHitX1,
            Limit::X2 => StopError::LimitHitX2,
            Limit::Y1 => StopError::LimitHitY1,
            Limit::Y2 => StopError::LimitHitY2,
            Limit::Z1 => StopError::LimitHitZ1,
            Limit::Z2 => StopError::LimitHitZ2,
        }
    }

    pub const fn is_z(self) -> bool {
        matches!(self, Limit::Z1 | Limit::Z2)
    }
}

/// Sensor inputs and the direct laser/power controls.
pub trait SenseControl {
    fn door_open(&mut self) -> bool;
    fn chiller_off(&mut self) -> bool;
    fn limit_hit(&mut self, limit: Limit) -> bool;

    /// Overrides the laser output immediately, bypassing the planner.
    fn set_laser_intensity(&mut self, intensity: u8);

    /// Low-power wait until the next interrupt.
    fn sleep(&mut self);
}

pub trait StackProbe {
    /// Bytes of RAM the stack has never reached.
    fn clearance(&self) -> u16;
}
