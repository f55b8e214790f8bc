use std::fmt::Write as _;
use std::io::{ErrorKind, Read, Write};

use generic::command_to_wire::CommandError;
use generic::markers::{
    CMD_RASTER_DATA_END, CMD_RASTER_DATA_START, CMD_RESUME, CMD_STATUS, CMD_STOP, CMD_SUPERSTATUS,
};
use generic::status_parser::{StatusEvent, StatusParseError, StatusParser, StatusReport};
use log::{debug, warn};
use serialport::{available_ports, SerialPortType};

pub const BAUD_RATE: u32 = 57600;
/// Bytes the board consumes per chunk-processed ack.
pub const CHUNK_SIZE: usize = 16;
/// Unacknowledged bytes allowed in flight, two chunks short of the board's
/// receive buffer.
pub const TX_WINDOW: usize = 256 - 2 * CHUNK_SIZE;
/// Empty reads tolerated while waiting for the window to open.
const MAX_IDLE_POLLS: usize = 50;

#[derive(Debug)]
pub enum ConsoleError {
    UnacceptableCommand(CommandError),
    SendingData,
    RecvResponse,
    FlushPort,
    AckTimeout,
}

pub fn find_serial_device(probe: &str) -> Option<String> {
    let probe_parts: Vec<&str> = probe.split(':').collect();
    if probe_parts.len() != 2 {
        return None;
    }
    let vid = u16::from_str_radix(probe_parts[0], 16).ok()?;
    let pid = u16::from_str_radix(probe_parts[1], 16).ok()?;

    if let Ok(ports) = available_ports() {
        for p in ports {
            if let SerialPortType::UsbPort(info) = p.port_type {
                if info.vid == vid && info.pid == pid {
                    return Some(p.port_name);
                }
            }
        }
    }

    None
}

/// Bytes handled by the board's receive interrupt. They never enter its
/// receive buffer and are not counted against the window.
pub fn is_realtime(byte: u8) -> bool {
    matches!(
        byte,
        CMD_STOP
            | CMD_RESUME
            | CMD_STATUS
            | CMD_SUPERSTATUS
            | CMD_RASTER_DATA_START
            | CMD_RASTER_DATA_END
    )
}

/// The board checks every byte against its twin.
pub fn duplicate(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().flat_map(|b| [*b, *b]).collect()
}

pub fn describe(report: &StatusReport) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "{} pos=({:.3}, {:.3}, {:.3})",
        if report.ready { "ready" } else { "busy" },
        report.position[0],
        report.position[1],
        report.position[2]
    );
    for stop in &report.stops {
        let _ = write!(out, " stop={:?}", stop);
    }
    if report.door_open {
        out.push_str(" door_open");
    }
    if report.chiller_off {
        out.push_str(" chiller_off");
    }
    if let Some(n) = report.underruns {
        let _ = write!(out, " underruns={}", n);
    }
    if let Some(v) = report.version {
        let _ = write!(out, " version={}", v);
    }
    if let Some(f) = report.feedrate {
        let _ = write!(out, " feedrate={}", f);
    }
    if let Some(s) = report.intensity {
        let _ = write!(out, " intensity={}", s);
    }
    if let Some(u) = report.stack_clearance {
        let _ = write!(out, " stack={}", u);
    }
    out
}

/// Host end of the serial link: doubles outgoing bytes, keeps the receive
/// window of the board and decodes whatever comes back.
pub struct Link<P: Read + Write> {
    port: P,
    parser: StatusParser,
    in_flight: usize,
}

impl<P: Read + Write> Link<P> {
    pub fn new(port: P) -> Self {
        Link { port, parser: StatusParser::new(), in_flight: 0 }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn send(&mut self, bytes: &[u8]) -> Result<Vec<StatusEvent>, ConsoleError> {
        let mut events = Vec::new();
        for &byte in bytes {
            if byte == CMD_RESUME {
                // the board drops its buffers on resume
                self.in_flight = 0;
            } else if !is_realtime(byte) {
                let mut idle = 0;
                while self.in_flight >= TX_WINDOW {
                    let got = self.poll()?;
                    if got.is_empty() {
                        idle += 1;
                        if idle > MAX_IDLE_POLLS {
                            return Err(ConsoleError::AckTimeout);
                        }
                    }
                    events.extend(got);
                }
                self.in_flight += 1;
            }
            self.port.write_all(&[byte, byte]).map_err(|_| ConsoleError::SendingData)?;
        }
        self.port.flush().map_err(|_| ConsoleError::FlushPort)?;
        Ok(events)
    }

    /// Reads what is available and decodes it.
    pub fn poll(&mut self) -> Result<Vec<StatusEvent>, ConsoleError> {
        let mut buf = [0u8; 64];
        let len = match self.port.read(&mut buf) {
            Ok(len) => len,
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => 0,
            Err(_) => return Err(ConsoleError::RecvResponse),
        };

        let mut events = Vec::new();
        for &byte in &buf[..len] {
            match self.parser.push(byte) {
                Ok(Some(StatusEvent::ChunkProcessed)) => {
                    self.in_flight = self.in_flight.saturating_sub(CHUNK_SIZE);
                    debug!("chunk processed, {} in flight", self.in_flight);
                }
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(StatusParseError::BadRecord(marker)) => {
                    warn!("bad record for '{}'", marker as char)
                }
                Err(err) => warn!("unexpected byte {}: {:?}", byte, err),
            }
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use generic::codec::encode;
    use generic::markers::{CMD_CHUNK_PROCESSED, STATUS_END};
    use std::collections::VecDeque;
    use std::io;

    #[derive(Default)]
    struct FakePort {
        tx: Vec<u8>,
        rx: VecDeque<u8>,
        // answers every empty read with an ack
        auto_ack: bool,
    }

    impl Read for FakePort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.rx.is_empty() {
                if self.auto_ack {
                    buf[0] = CMD_CHUNK_PROCESSED;
                    return Ok(1);
                }
                return Err(io::Error::new(ErrorKind::TimedOut, "timeout"));
            }
            let mut n = 0;
            while n < buf.len() {
                match self.rx.pop_front() {
                    Some(b) => buf[n] = b,
                    None => break,
                }
                n += 1;
            }
            Ok(n)
        }
    }

    impl Write for FakePort {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.tx.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_duplicate() {
        assert_eq!(duplicate(&[1, 200]), vec![1, 1, 200, 200]);
    }

    #[test]
    fn test_realtime_bytes_are_not_counted() {
        let mut link = Link::new(FakePort::default());
        link.send(&[CMD_STATUS, b'B', CMD_SUPERSTATUS, 200]).unwrap();
        assert_eq!(link.in_flight(), 2);
        assert_eq!(link.port().tx, vec![3, 3, b'B', b'B', 4, 4, 200, 200]);

        link.send(&[CMD_RESUME]).unwrap();
        assert_eq!(link.in_flight(), 0);
    }

    #[test]
    fn test_window_waits_for_acks() {
        let port = FakePort { auto_ack: true, ..FakePort::default() };
        let mut link = Link::new(port);
        let bytes = vec![b'A'; 1000];
        link.send(&bytes).unwrap();
        assert!(link.in_flight() <= TX_WINDOW);
        assert_eq!(link.port().tx.len(), 2000);
    }

    #[test]
    fn test_window_times_out_without_acks() {
        let mut link = Link::new(FakePort::default());
        let bytes = vec![b'A'; TX_WINDOW + 1];
        assert!(matches!(link.send(&bytes), Err(ConsoleError::AckTimeout)));
    }

    #[test]
    fn test_poll_decodes_reports() {
        let mut port = FakePort::default();
        port.rx.extend([b'A', CMD_CHUNK_PROCESSED]);
        port.rx.extend(encode(-2.5));
        port.rx.extend([b'y', STATUS_END]);
        let mut link = Link::new(port);
        link.in_flight = 20;

        let events = link.poll().unwrap();
        assert_eq!(link.in_flight(), 4);
        assert_eq!(events.len(), 1);
        let StatusEvent::Report(report) = &events[0] else { panic!("no report") };
        assert!(report.ready);
        assert_eq!(report.position, [0.0, -2.5, 0.0]);
        assert_eq!(describe(report), "ready pos=(0.000, -2.500, 0.000)");
    }
}
