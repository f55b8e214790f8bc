use heapless::Vec;

use crate::codec::{decode, NUMBER_LEN};
use crate::driveboard_error::StopError;

/// Operand bytes received since the last marker.
#[derive(Debug, Default)]
pub struct ParamData {
    chars: Vec<u8, NUMBER_LEN>,
    overflowed: bool,
}

impl ParamData {
    pub const fn new() -> Self {
        ParamData { chars: Vec::new(), overflowed: false }
    }

    /// A fifth byte is refused and marks the buffer overflowed until `reset()`.
    pub fn push(&mut self, byte: u8) -> Result<(), StopError> {
        if self.overflowed {
            return Err(StopError::InvalidData);
        }
        self.chars.push(byte).map_err(|_| {
            self.overflowed = true;
            StopError::InvalidData
        })
    }

    pub fn reset(&mut self) {
        self.chars.clear();
        self.overflowed = false;
    }

    pub fn count(&self) -> usize {
        self.chars.len()
    }

    pub fn is_overflowed(&self) -> bool {
        self.overflowed
    }

    /// The decoded number, valid only with exactly four clean operand bytes.
    pub fn value(&self) -> Result<f64, StopError> {
        if self.overflowed {
            return Err(StopError::InvalidData);
        }
        let chars: &[u8; NUMBER_LEN] =
            self.chars.as_slice().try_into().map_err(|_| StopError::InvalidData)?;
        Ok(decode(chars))
    }
}
