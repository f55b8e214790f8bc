use core::ptr::addr_of_mut;

use defmt::info;

use generic::collaborators::StackProbe;
use generic::stack;

use crate::bsp::config::STACK_PAINT_MARGIN;

extern "C" {
    // end of .bss/.uninit, provided by cortex-m-rt's link.x
    static mut __sheap: u8;
}

/// Free RAM between the end of static data and the stack.
pub struct StackMonitor {
    start: *const u8,
    len: usize,
}

impl StackMonitor {
    /// Paints the free RAM below the current stack pointer. Call first thing
    /// in `main`, before the stack gets deep.
    pub fn paint() -> Self {
        let start = unsafe { addr_of_mut!(__sheap) };
        let sp = cortex_m::register::msp::read() as usize;
        let len = sp.saturating_sub(STACK_PAINT_MARGIN).saturating_sub(start as usize);
        // SAFETY: the region lies between static data and the live stack, nothing
        // else owns it.
        let region = unsafe { core::slice::from_raw_parts_mut(start, len) };
        stack::paint(region);
        info!("[STACK] painted {} bytes", len);
        StackMonitor { start, len }
    }
}

impl StackProbe for StackMonitor {
    fn clearance(&self) -> u16 {
        // SAFETY: only read; bytes the stack grew into simply stop the scan.
        let region = unsafe { core::slice::from_raw_parts(self.start, self.len) };
        stack::clearance_u16(region)
    }
}
