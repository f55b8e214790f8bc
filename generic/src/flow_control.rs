use core::cell::Cell;

use critical_section::Mutex;

/// Which report the host asked for.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportKind {
    Status,
    Superstatus,
}

#[derive(Copy, Clone)]
struct FlowFlags {
    status_requested: bool,
    superstatus_requested: bool,
    rx_underruns: u16,
    rx_underrun_pending: bool,
}

/// Flags shared between the protocol loop and interrupt context.
///
/// Interrupts and request callers only set; the status reporter is the only
/// one clearing. Every access runs inside a critical section because the M0+
/// core has no atomic read-modify-write.
pub struct FlowControl {
    flags: Mutex<Cell<FlowFlags>>,
}

impl Default for FlowControl {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowControl {
    /// Starts with a superstatus pending so the host gets a full report at boot.
    pub const fn new() -> Self {
        FlowControl {
            flags: Mutex::new(Cell::new(FlowFlags {
                status_requested: true,
                superstatus_requested: true,
                rx_underruns: 0,
                rx_underrun_pending: false,
            })),
        }
    }

    fn update<R>(&self, f: impl FnOnce(&mut FlowFlags) -> R) -> R {
        critical_section::with(|cs| {
            let cell = self.flags.borrow(cs);
            let mut flags = cell.get();
            let res = f(&mut flags);
            cell.set(flags);
            res
        })
    }

    pub fn request_status(&self) {
        self.update(|f| f.status_requested = true);
    }

    pub fn request_superstatus(&self) {
        self.update(|f| f.superstatus_requested = true);
    }

    pub fn mark_underrun(&self) {
        self.update(|f| {
            f.rx_underruns = f.rx_underruns.wrapping_add(1);
            f.rx_underrun_pending = true;
        });
    }

    pub fn underruns(&self) -> u16 {
        self.update(|f| f.rx_underruns)
    }

    /// Consumes pending report requests. A superstatus covers a plain status.
    pub fn take_request(&self) -> Option<ReportKind> {
        self.update(|f| {
            let kind = if f.superstatus_requested {
                Some(ReportKind::Superstatus)
            } else if f.status_requested {
                Some(ReportKind::Status)
            } else {
                None
            };
            f.status_requested = false;
            f.superstatus_requested = false;
            kind
        })
    }

    /// The underrun count, once per new underrun.
    pub fn take_underrun(&self) -> Option<u16> {
        self.update(|f| {
            if f.rx_underrun_pending {
                f.rx_underrun_pending = false;
                Some(f.rx_underruns)
            } else {
                None
            }
        })
    }
}
