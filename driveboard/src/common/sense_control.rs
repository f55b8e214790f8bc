use generic::collaborators::{Limit, SenseControl};

use crate::motion::engine::with_engine;

/// Door, chiller and limit inputs plus the laser override. The pins live in
/// the motion engine because the stepper interrupt reads them too.
pub struct BoardSense;

impl SenseControl for BoardSense {
    fn door_open(&mut self) -> bool {
        with_engine(|e| e.io().door_open()).unwrap_or(false)
    }

    fn chiller_off(&mut self) -> bool {
        with_engine(|e| e.io().chiller_off()).unwrap_or(false)
    }

    fn limit_hit(&mut self, limit: Limit) -> bool {
        with_engine(|e| e.io().limit_hit(limit)).unwrap_or(false)
    }

    fn set_laser_intensity(&mut self, intensity: u8) {
        with_engine(|e| e.io().set_laser(intensity));
    }

    fn sleep(&mut self) {
        // any UART or stepper interrupt wakes us
        cortex_m::asm::wfi();
    }
}
