//! Block buffer and its executor. Blocks are queued from the protocol loop and
//! run from the TIMER_IRQ_0 alarm, one step per alarm.

use core::cell::RefCell;

use critical_section::Mutex;
use defmt::{debug, info, warn};
use embedded_hal::digital::{OutputPin, PinState};
use fugit::ExtU32;
use heapless::Deque;
use rp2040_hal::timer::{Alarm, Alarm0};

use generic::collaborators::{Block, Limit};
use generic::config::ENABLE_3AXES;
use generic::raster::pixel_intensity;
use generic::step_plan::{
    mm_to_steps, seconds_to_us, steps_to_mm, LinePlan, LineWalk, MIN_STEP_INTERVAL_US,
};

use crate::bsp::config::{BLOCK_BUFFER_SIZE, STEPPER_N_EN, STEPS_PER_MM};
use crate::bsp::DriverPin;
use crate::common::global_status::{FLOW, STOP};
use crate::common::serial::pop_raster;
use crate::motion::io::{AxisPins, MachineIo};

static ENGINE: Mutex<RefCell<Option<MotionEngine>>> = Mutex::new(RefCell::new(None));

pub fn install(engine: MotionEngine) {
    critical_section::with(|cs| {
        ENGINE.borrow_ref_mut(cs).replace(engine);
    });
}

/// None until `install()`.
pub fn with_engine<R>(f: impl FnOnce(&mut MotionEngine) -> R) -> Option<R> {
    critical_section::with(|cs| ENGINE.borrow_ref_mut(cs).as_mut().map(f))
}

pub fn on_timer_irq() {
    with_engine(|e| e.on_tick());
}

/// Limit switch ahead of an axis moving in the given direction.
pub fn limit_ahead(axis: usize, forward: bool) -> Option<Limit> {
    let limit = match (axis, forward) {
        (0, false) => Limit::X1,
        (0, true) => Limit::X2,
        (1, false) => Limit::Y1,
        (1, true) => Limit::Y2,
        (_, false) => Limit::Z1,
        (_, true) => Limit::Z2,
    };
    if limit.is_z() && !ENABLE_3AXES {
        return None;
    }
    Some(limit)
}

enum Execution {
    Line { walk: LineWalk, intensity: u8 },
    Dwell { duration_us: u32, started: bool },
}

enum Tick {
    Next(u32),
    Done,
    Halted,
}

pub struct MotionEngine {
    queue: Deque<Block, BLOCK_BUFFER_SIZE>,
    axes: [AxisPins; 3],
    n_enable: DriverPin,
    io: MachineIo,
    alarm: Alarm0,
    position: [i32; 3],
    current: Option<Execution>,
    running: bool,
}

impl MotionEngine {
    pub fn new(axes: [AxisPins; 3], n_enable: DriverPin, io: MachineIo, mut alarm: Alarm0) -> Self {
        alarm.enable_interrupt();
        let mut engine = MotionEngine {
            queue: Deque::new(),
            axes,
            n_enable,
            io,
            alarm,
            position: [0; 3],
            current: None,
            running: false,
        };
        engine.enable_drivers(true);
        engine
    }

    pub fn io(&mut self) -> &mut MachineIo {
        &mut self.io
    }

    pub fn enable_drivers(&mut self, on: bool) {
        let _ = self.n_enable.set_state(PinState::from(on != STEPPER_N_EN));
    }

    pub fn push(&mut self, block: Block) -> Result<(), Block> {
        self.queue.push_back(block)?;
        if !self.running {
            self.schedule(MIN_STEP_INTERVAL_US);
        }
        Ok(())
    }

    /// Queued or still executing.
    pub fn is_busy(&self) -> bool {
        self.current.is_some() || !self.queue.is_empty()
    }

    pub fn clear_queue(&mut self) {
        self.queue.clear();
        self.current = None;
        self.io.set_laser(0);
    }

    pub fn position_mm(&self) -> [f64; 3] {
        [
            steps_to_mm(self.position[0], STEPS_PER_MM[0]),
            steps_to_mm(self.position[1], STEPS_PER_MM[1]),
            steps_to_mm(self.position[2], STEPS_PER_MM[2]),
        ]
    }

    pub fn zero_axis(&mut self, axis: usize) {
        self.position[axis] = 0;
    }

    /// Single step outside of block execution. Refuses to step into a
    /// closed limit switch and returns false then.
    pub fn manual_step(&mut self, axis: usize, forward: bool) -> bool {
        if let Some(limit) = limit_ahead(axis, forward) {
            if self.io.limit_hit(limit) {
                return false;
            }
        }
        self.axes[axis].step(forward);
        self.position[axis] += if forward { 1 } else { -1 };
        true
    }

    fn schedule(&mut self, us: u32) {
        match self.alarm.schedule(us.micros()) {
            Ok(()) => self.running = true,
            Err(_) => {
                warn!("[STEPPER] alarm schedule failed");
                self.running = false;
            }
        }
    }

    fn halt(&mut self) {
        if self.current.take().is_some() {
            info!("[STEPPER] halted at {}", self.position);
        }
        self.io.set_laser(0);
        self.running = false;
    }

    fn on_tick(&mut self) {
        self.alarm.clear_interrupt();
        if STOP.is_requested() {
            self.halt();
            return;
        }

        if self.current.is_none() {
            self.current = self.start_next();
        }

        let tick = match self.current {
            None => {
                self.io.set_laser(0);
                self.running = false;
                return;
            }
            Some(Execution::Line { .. }) => self.step_line(),
            Some(Execution::Dwell { duration_us, ref mut started }) => {
                if *started {
                    Tick::Done
                } else {
                    *started = true;
                    Tick::Next(duration_us.max(MIN_STEP_INTERVAL_US))
                }
            }
        };

        match tick {
            Tick::Next(us) => self.schedule(us),
            Tick::Done => {
                self.current = None;
                self.io.set_laser(0);
                self.schedule(MIN_STEP_INTERVAL_US);
            }
            Tick::Halted => self.halt(),
        }
    }

    /// Pops blocks until one needs time to execute. Assist switches apply
    /// immediately.
    fn start_next(&mut self) -> Option<Execution> {
        while let Some(block) = self.queue.pop_front() {
            debug!("[STEPPER] start {}", block);
            match block {
                Block::Line { target, feedrate, intensity, pixel_width } => {
                    let to = [
                        mm_to_steps(target[0], STEPS_PER_MM[0]),
                        mm_to_steps(target[1], STEPS_PER_MM[1]),
                        mm_to_steps(target[2], STEPS_PER_MM[2]),
                    ];
                    let Some(plan) =
                        LinePlan::new(self.position, to, STEPS_PER_MM, feedrate, pixel_width)
                    else {
                        continue;
                    };
                    // raster lines set the laser per pixel
                    self.io.set_laser(if plan.steps_per_pixel > 0 { 0 } else { intensity });
                    return Some(Execution::Line { walk: LineWalk::new(plan), intensity });
                }
                Block::Dwell { duration, intensity } => {
                    self.io.set_laser(intensity);
                    return Some(Execution::Dwell {
                        duration_us: seconds_to_us(duration),
                        started: false,
                    });
                }
                Block::AirAssist(on) => self.io.set_air(on),
                Block::AuxAssist(on) => self.io.set_aux(on),
            }
        }
        None
    }

    fn step_line(&mut self) -> Tick {
        let Some(Execution::Line { walk, intensity }) = self.current.as_mut() else {
            return Tick::Done;
        };

        if walk.at_pixel_boundary() {
            let level = match pop_raster() {
                Some(pixel) => pixel_intensity(pixel, *intensity),
                None => {
                    FLOW.mark_underrun();
                    0
                }
            };
            self.io.set_laser(level);
        }

        let interval = walk.plan().interval_us;
        let Some(steps) = walk.tick() else {
            return Tick::Done;
        };

        for (axis, step) in steps.iter().enumerate() {
            if *step == 0 {
                continue;
            }
            let forward = *step > 0;
            if let Some(limit) = limit_ahead(axis, forward) {
                if self.io.limit_hit(limit) {
                    warn!("[STEPPER] limit {} hit", limit);
                    STOP.request(limit.stop_error());
                    return Tick::Halted;
                }
            }
            self.axes[axis].step(forward);
            self.position[axis] += i32::from(*step);
        }
        Tick::Next(interval)
    }
}
