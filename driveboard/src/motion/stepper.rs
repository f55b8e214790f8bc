use rp2040_hal::Timer;

use generic::collaborators::Stepper;
use generic::driveboard_error::StopError;

use crate::common::global_status::STOP;
use crate::motion::engine::with_engine;
use crate::motion::homing;

pub struct EngineStepper {
    timer: Timer,
}

impl EngineStepper {
    pub fn new(timer: Timer) -> Self {
        EngineStepper { timer }
    }
}

impl Stepper for EngineStepper {
    fn position(&self) -> [f64; 3] {
        with_engine(|e| e.position_mm()).unwrap_or([0.0; 3])
    }

    fn processing(&self) -> bool {
        with_engine(|e| e.is_busy()).unwrap_or(false)
    }

    fn homing_cycle(&mut self) {
        // the protocol drains the queue first; this only guards other callers
        while self.processing() {
            if STOP.is_requested() {
                return;
            }
            cortex_m::asm::wfi();
        }
        homing::homing_cycle(&mut self.timer);
    }

    fn request_stop(&self, code: StopError) {
        STOP.request(code);
    }

    fn stop_requested(&self) -> bool {
        STOP.is_requested()
    }

    fn stop_status(&self) -> Option<StopError> {
        STOP.status()
    }
}
