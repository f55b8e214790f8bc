use core::cell::Cell;

use critical_section::Mutex;

use crate::driveboard_error::StopError;

/// Latched stop condition. The first cause raised wins until `clear()`.
pub struct StopLatch {
    code: Mutex<Cell<Option<StopError>>>,
}

impl Default for StopLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl StopLatch {
    pub const fn new() -> Self {
        StopLatch { code: Mutex::new(Cell::new(None)) }
    }

    /// Returns false when another cause is already latched.
    pub fn request(&self, code: StopError) -> bool {
        critical_section::with(|cs| {
            let cell = self.code.borrow(cs);
            if cell.get().is_some() {
                return false;
            }
            cell.set(Some(code));
            true
        })
    }

    pub fn is_requested(&self) -> bool {
        self.status().is_some()
    }

    pub fn status(&self) -> Option<StopError> {
        critical_section::with(|cs| self.code.borrow(cs).get())
    }

    pub fn clear(&self) {
        critical_section::with(|cs| self.code.borrow(cs).set(None));
    }
}
