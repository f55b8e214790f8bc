/// Latched stop causes. Each one halts command acceptance until the host sends
/// a resume, and is reported once per status report with its wire code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopError {
    SerialStopRequest,
    RxBufferOverflow,

    LimitHitX1,
    LimitHitX2,
    LimitHitY1,
    LimitHitY2,
    LimitHitZ1,
    LimitHitZ2,

    // Protocol stream errors
    InvalidMarker,
    InvalidData,
    InvalidCommand,
    InvalidParameter,
    TransmissionError,
}

impl StopError {
    pub const ALL: [StopError; 13] = [
        StopError::SerialStopRequest,
        StopError::RxBufferOverflow,
        StopError::LimitHitX1,
        StopError::LimitHitX2,
        StopError::LimitHitY1,
        StopError::LimitHitY2,
        StopError::LimitHitZ1,
        StopError::LimitHitZ2,
        StopError::InvalidMarker,
        StopError::InvalidData,
        StopError::InvalidCommand,
        StopError::InvalidParameter,
        StopError::TransmissionError,
    ];

    pub const fn code(self) -> u8 {
        match self {
            StopError::SerialStopRequest => b'!',
            StopError::RxBufferOverflow => b'"',
            StopError::LimitHitX1 => b'$',
            StopError::LimitHitX2 => b'%',
            StopError::LimitHitY1 => b'&',
            StopError::LimitHitY2 => b'*',
            StopError::LimitHitZ1 => b'+',
            StopError::LimitHitZ2 => b'-',
            StopError::InvalidMarker => b'#',
            StopError::InvalidData => b':',
            StopError::InvalidCommand => b'<',
            StopError::InvalidParameter => b'>',
            StopError::TransmissionError => b'=',
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.code() == code)
    }

    /// Limit switches and operator stops are physical causes; everything else
    /// means the byte stream itself went wrong.
    pub fn is_stream_error(self) -> bool {
        matches!(
            self,
            StopError::RxBufferOverflow
                | StopError::InvalidMarker
                | StopError::InvalidData
                | StopError::InvalidCommand
                | StopError::InvalidParameter
                | StopError::TransmissionError
        )
    }
}
