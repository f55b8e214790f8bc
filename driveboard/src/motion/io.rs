use embedded_hal::digital::{InputPin, OutputPin, PinState};
use embedded_hal::pwm::SetDutyCycle;

use generic::collaborators::Limit;
use generic::config::ENABLE_INTERLOCKS;

use crate::bsp::config::{
    CHILLER_OFF_HIGH, DOOR_OPEN_HIGH, LIMITS_ACTIVE_LOW, STEP_PULSE_CYCLES,
};
use crate::bsp::{DriverPin, LaserPwm, SensePin};

fn is_active(pin: &mut SensePin, active_high: bool) -> bool {
    pin.is_high().map(|high| high == active_high).unwrap_or(false)
}

pub struct AxisPins {
    step: DriverPin,
    dir: DriverPin,
    revert: bool,
}

impl AxisPins {
    pub fn new(step: DriverPin, dir: DriverPin, revert: bool) -> Self {
        AxisPins { step, dir, revert }
    }

    /// One step pulse; `forward` moves away from the min limit.
    pub fn step(&mut self, forward: bool) {
        let _ = self.dir.set_state(PinState::from(forward != self.revert));
        cortex_m::asm::delay(STEP_PULSE_CYCLES);
        let _ = self.step.set_high();
        cortex_m::asm::delay(STEP_PULSE_CYCLES);
        let _ = self.step.set_low();
    }
}

pub struct MachineIo {
    // Limit::ALL order
    limits: [SensePin; 6],
    door: SensePin,
    chiller: SensePin,
    laser: LaserPwm,
    air: DriverPin,
    aux: DriverPin,
}

impl MachineIo {
    pub fn new(
        limits: [SensePin; 6],
        door: SensePin,
        chiller: SensePin,
        laser: LaserPwm,
        air: DriverPin,
        aux: DriverPin,
    ) -> Self {
        let mut io = MachineIo { limits, door, chiller, laser, air, aux };
        io.set_laser(0);
        io
    }

    pub fn limit_hit(&mut self, limit: Limit) -> bool {
        is_active(&mut self.limits[limit as usize], !LIMITS_ACTIVE_LOW)
    }

    pub fn door_open(&mut self) -> bool {
        is_active(&mut self.door, DOOR_OPEN_HIGH)
    }

    pub fn chiller_off(&mut self) -> bool {
        is_active(&mut self.chiller, CHILLER_OFF_HIGH)
    }

    /// Duty is `intensity` out of 255. Forced to 0 while an interlock is open.
    pub fn set_laser(&mut self, intensity: u8) {
        let intensity = if ENABLE_INTERLOCKS && (self.door_open() || self.chiller_off()) {
            0
        } else {
            intensity
        };
        let _ = self.laser.channel_a.set_duty_cycle(u16::from(intensity));
    }

    pub fn set_air(&mut self, on: bool) {
        let _ = self.air.set_state(PinState::from(on));
    }

    pub fn set_aux(&mut self, on: bool) {
        let _ = self.aux.set_state(PinState::from(on));
    }
}
