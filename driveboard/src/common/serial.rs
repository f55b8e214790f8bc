//! Interrupt driven host link on UART0.

use core::cell::RefCell;
use core::convert::Infallible;

use critical_section::{CriticalSection, Mutex};
use defmt::{debug, info};
use embedded_hal_nb::serial::{ErrorType, Read, Write};
use heapless::Deque;

use generic::collaborators::Transport;
use generic::driveboard_error::StopError;
use generic::markers::{CMD_CHUNK_PROCESSED, INFO_HELLO};
use generic::serial_filter::{Control, RxEvent, RxFilter};

use crate::bsp::config::{RASTER_BUFFER_SIZE, RX_BUFFER_SIZE, TX_CHUNK_SIZE};
use crate::bsp::DriveboardUart;
use crate::common::global_status::{FLOW, STOP};

static UART: Mutex<RefCell<Option<DriveboardUart>>> = Mutex::new(RefCell::new(None));
static RX: Mutex<RefCell<RxState>> = Mutex::new(RefCell::new(RxState::new()));

struct RxState {
    filter: RxFilter,
    bytes: Deque<u8, RX_BUFFER_SIZE>,
    raster: Deque<u8, RASTER_BUFFER_SIZE>,
    consumed: u16,
    acks_pending: u16,
}

impl RxState {
    const fn new() -> Self {
        RxState {
            filter: RxFilter::new(),
            bytes: Deque::new(),
            raster: Deque::new(),
            consumed: 0,
            acks_pending: 0,
        }
    }

    fn receive(&mut self, byte: u8) {
        let Some(event) = self.filter.push(byte) else {
            return;
        };
        match event {
            RxEvent::Byte(b) => {
                // nothing is buffered while stopped, the host resends after resume
                if !STOP.is_requested() && self.bytes.push_back(b).is_err() {
                    STOP.request(StopError::RxBufferOverflow);
                }
            }
            RxEvent::RasterPixel(b) => {
                if !STOP.is_requested() && self.raster.push_back(b).is_err() {
                    STOP.request(StopError::RxBufferOverflow);
                }
            }
            RxEvent::Control(Control::Stop) => {
                STOP.request(StopError::SerialStopRequest);
            }
            RxEvent::Control(Control::Resume) => {
                self.bytes.clear();
                self.raster.clear();
                self.consumed = 0;
                STOP.clear();
            }
            RxEvent::Control(Control::Status) => FLOW.request_status(),
            RxEvent::Control(Control::Superstatus) => FLOW.request_superstatus(),
            RxEvent::TransmissionError => {
                STOP.request(StopError::TransmissionError);
            }
        }
    }

    fn note_consumed(&mut self) {
        self.consumed += 1;
        if self.consumed >= TX_CHUNK_SIZE {
            self.consumed = 0;
            self.acks_pending += 1;
        }
    }
}

/// Hands the enabled UART to the interrupt handler.
pub fn install(mut uart: DriveboardUart) {
    uart.enable_rx_interrupt();
    critical_section::with(|cs| {
        UART.borrow_ref_mut(cs).replace(uart);
    });
}

pub fn on_uart_irq() {
    critical_section::with(|cs| {
        let mut uart = UART.borrow_ref_mut(cs);
        let Some(uart) = uart.as_mut() else {
            return;
        };
        let mut rx = RX.borrow_ref_mut(cs);
        loop {
            match uart.read() {
                Ok(byte) => rx.receive(byte),
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(_)) => {
                    // framing/overrun, the byte pairing is lost as well
                    rx.filter.reset();
                    STOP.request(StopError::TransmissionError);
                }
            }
        }
    });
}

// Chunk acks go out whenever the TX FIFO has room; they may land between the
// bytes of a status record, which the host tolerates.
fn flush_acks(cs: CriticalSection, rx: &mut RxState) {
    if rx.acks_pending == 0 {
        return;
    }
    if let Some(uart) = UART.borrow_ref_mut(cs).as_mut() {
        while rx.acks_pending > 0 && uart.write(CMD_CHUNK_PROCESSED).is_ok() {
            rx.acks_pending -= 1;
        }
    }
}

/// Next raster pixel for the stepper interrupt.
pub fn pop_raster() -> Option<u8> {
    critical_section::with(|cs| {
        let mut rx = RX.borrow_ref_mut(cs);
        let pixel = rx.raster.pop_front()?;
        rx.note_consumed();
        flush_acks(cs, &mut rx);
        Some(pixel)
    })
}

pub fn send_hello() {
    let mut serial = UartTransport;
    if nb::block!(serial.write(INFO_HELLO)).is_ok() {
        info!("[SERIAL] hello sent");
    }
}

/// Protocol side of the link.
pub struct UartTransport;

impl ErrorType for UartTransport {
    type Error = Infallible;
}

impl Read<u8> for UartTransport {
    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        critical_section::with(|cs| {
            let mut rx = RX.borrow_ref_mut(cs);
            let res = match rx.bytes.pop_front() {
                Some(byte) => {
                    rx.note_consumed();
                    Ok(byte)
                }
                None => Err(nb::Error::WouldBlock),
            };
            flush_acks(cs, &mut rx);
            res
        })
    }
}

impl Write<u8> for UartTransport {
    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        critical_section::with(|cs| match UART.borrow_ref_mut(cs).as_mut() {
            Some(uart) => match uart.write(word) {
                Ok(()) => Ok(()),
                Err(nb::Error::WouldBlock) => Err(nb::Error::WouldBlock),
                // the HAL shares its read error type; writes never produce one
                Err(nb::Error::Other(_)) => Ok(()),
            },
            None => {
                debug!("uart not installed, dropped {}", word);
                Ok(())
            }
        })
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        critical_section::with(|cs| match UART.borrow_ref_mut(cs).as_mut() {
            Some(uart) => match uart.flush() {
                Ok(()) => Ok(()),
                Err(nb::Error::WouldBlock) => Err(nb::Error::WouldBlock),
                Err(nb::Error::Other(_)) => Ok(()),
            },
            None => Ok(()),
        })
    }
}

impl Transport for UartTransport {
    fn data_available(&mut self) -> bool {
        critical_section::with(|cs| !RX.borrow_ref(cs).bytes.is_empty())
    }
}
