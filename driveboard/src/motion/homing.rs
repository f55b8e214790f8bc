use defmt::{info, warn};
use embedded_hal::delay::DelayNs;
use rp2040_hal::Timer;

use generic::config::ENABLE_3AXES;
use generic::state::{X_AXIS, Y_AXIS, Z_AXIS};

use crate::bsp::config::{
    HOMING_BACKOFF_STEPS, HOMING_FAST_STEP_US, HOMING_MAX_STEPS, HOMING_SLOW_STEP_US,
};
use crate::common::global_status::STOP;
use crate::motion::engine::with_engine;

#[derive(Debug, Copy, Clone, PartialEq, defmt::Format)]
enum SeekResult {
    Hit,
    NotFound,
    Stopped,
}

/// Seeks every axis to its min switch, first fast then slow, and zeroes it
/// after the final back-off. Blocks the caller; the block queue must be empty.
pub fn homing_cycle(timer: &mut Timer) {
    info!("[HOMING] start");
    let axes: &[usize] = if ENABLE_3AXES { &[X_AXIS, Y_AXIS, Z_AXIS] } else { &[X_AXIS, Y_AXIS] };

    for &axis in axes {
        if home_axis(timer, axis).is_err() {
            warn!("[HOMING] aborted on axis {}", axis);
            return;
        }
        info!("[HOMING] axis {} done", axis);
    }
    info!("[HOMING] done");
}

fn home_axis(timer: &mut Timer, axis: usize) -> Result<(), SeekResult> {
    for step_us in [HOMING_FAST_STEP_US, HOMING_SLOW_STEP_US] {
        match seek(timer, axis, step_us) {
            SeekResult::Hit => {}
            SeekResult::NotFound => warn!("[HOMING] no limit on axis {}", axis),
            SeekResult::Stopped => return Err(SeekResult::Stopped),
        }
        back_off(timer, axis);
    }
    with_engine(|e| e.zero_axis(axis));
    Ok(())
}

fn seek(timer: &mut Timer, axis: usize, step_us: u32) -> SeekResult {
    for _ in 0..HOMING_MAX_STEPS {
        if STOP.is_requested() {
            return SeekResult::Stopped;
        }
        match with_engine(|e| e.manual_step(axis, false)) {
            Some(true) => timer.delay_us(step_us),
            Some(false) => return SeekResult::Hit,
            None => return SeekResult::Stopped,
        }
    }
    SeekResult::NotFound
}

fn back_off(timer: &mut Timer, axis: usize) {
    for _ in 0..HOMING_BACKOFF_STEPS {
        with_engine(|e| e.manual_step(axis, true));
        timer.delay_us(HOMING_SLOW_STEP_US);
    }
}
