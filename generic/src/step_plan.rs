//! Constant-rate step timing for one block: no acceleration, every step of the
//! dominant axis takes the same time.

use crate::collaborators::Block;

/// Fastest step rate the executor schedules, 50 kHz.
pub const MIN_STEP_INTERVAL_US: u32 = 20;
pub const MAX_STEP_INTERVAL_US: u32 = 1_000_000;

pub fn isqrt(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    let mut x = n;
    let mut y = (x + 1) / 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

pub fn mm_to_steps(mm: f64, steps_per_mm: f64) -> i32 {
    let steps = mm * steps_per_mm;
    if steps >= 0.0 {
        (steps + 0.5) as i32
    } else {
        (steps - 0.5) as i32
    }
}

pub fn steps_to_mm(steps: i32, steps_per_mm: f64) -> f64 {
    f64::from(steps) / steps_per_mm
}

pub fn seconds_to_us(seconds: f64) -> u32 {
    if seconds <= 0.0 {
        return 0;
    }
    (seconds * 1_000_000.0) as u32
}

/// Whether a block is worth queueing after a line that ended at `last`.
/// Plain lines onto the current end point are dropped; raster lines always
/// go through since their pixels are already streaming.
pub fn should_queue(last: [f64; 3], block: &Block) -> bool {
    match *block {
        Block::Line { target, pixel_width, .. } => target != last || pixel_width > 0.0,
        _ => true,
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinePlan {
    pub deltas: [i32; 3],
    /// Ticks of the dominant axis.
    pub total: u32,
    pub interval_us: u32,
    /// Dominant axis steps per raster pixel, 0 for plain lines.
    pub steps_per_pixel: u32,
}

impl LinePlan {
    /// None when the move is shorter than one step on every axis.
    pub fn new(
        from: [i32; 3],
        to: [i32; 3],
        steps_per_mm: [f64; 3],
        feedrate: f64,
        pixel_width: f64,
    ) -> Option<Self> {
        let deltas = [to[0] - from[0], to[1] - from[1], to[2] - from[2]];
        let total = deltas.iter().map(|d| d.unsigned_abs()).max().unwrap_or(0);
        if total == 0 {
            return None;
        }

        let mut sq_um: u64 = 0;
        for (d, spm) in deltas.iter().zip(steps_per_mm) {
            let um = (f64::from(d.unsigned_abs()) * 1000.0 / spm) as u64;
            sq_um += um * um;
        }
        let dist_um = isqrt(sq_um).max(1);

        let interval_us = if feedrate > 0.0 {
            // mm/min against µm and µs
            let duration_us = dist_um as f64 * 60_000.0 / feedrate;
            (duration_us / f64::from(total)) as u32
        } else {
            MAX_STEP_INTERVAL_US
        };

        let steps_per_pixel = if pixel_width > 0.0 {
            let spp = pixel_width * 1000.0 * f64::from(total) / dist_um as f64 + 0.5;
            (spp as u32).max(1)
        } else {
            0
        };

        Some(LinePlan {
            deltas,
            total,
            interval_us: interval_us.clamp(MIN_STEP_INTERVAL_US, MAX_STEP_INTERVAL_US),
            steps_per_pixel,
        })
    }
}

/// Bresenham walk over a `LinePlan`.
#[derive(Debug, Clone)]
pub struct LineWalk {
    plan: LinePlan,
    errors: [u32; 3],
    done: u32,
}

impl LineWalk {
    pub fn new(plan: LinePlan) -> Self {
        LineWalk { errors: [plan.total / 2; 3], plan, done: 0 }
    }

    pub fn plan(&self) -> &LinePlan {
        &self.plan
    }

    pub fn done(&self) -> u32 {
        self.done
    }

    pub fn finished(&self) -> bool {
        self.done >= self.plan.total
    }

    /// Whether the next tick starts a new raster pixel.
    pub fn at_pixel_boundary(&self) -> bool {
        self.plan.steps_per_pixel > 0 && self.done % self.plan.steps_per_pixel == 0
    }

    /// Per axis step of the next tick: -1, 0 or 1. None once finished.
    pub fn tick(&mut self) -> Option<[i8; 3]> {
        if self.finished() {
            return None;
        }
        let mut steps = [0i8; 3];
        for (axis, step) in steps.iter_mut().enumerate() {
            let d = self.plan.deltas[axis];
            self.errors[axis] += d.unsigned_abs();
            if self.errors[axis] >= self.plan.total {
                self.errors[axis] -= self.plan.total;
                *step = if d > 0 { 1 } else { -1 };
            }
        }
        self.done += 1;
        Some(steps)
    }
}
