//! Byte classifier, main loop and command/parameter dispatch.
//!
//! Markers consume the operands sent right before them:
//! `<number>x<number>y<number>zB` queues a line to (x, y, z).

use crate::accumulator::ParamData;
use crate::collaborators::{Block, Planner, SenseControl, StackProbe, Stepper, Transport};
use crate::config::MachineConfig;
use crate::driveboard_error::StopError;
use crate::flow_control::FlowControl;
use crate::markers::{classify, ByteClass, Command, Parameter};
use crate::state::{ProtocolState, RefMode, X_AXIS, Y_AXIS, Z_AXIS};

pub struct Protocol<'a, P, S, T, C, K> {
    pub(crate) config: MachineConfig,
    pub(crate) st: ProtocolState,
    pub(crate) pdata: ParamData,
    pub(crate) flow: &'a FlowControl,
    pub(crate) planner: P,
    pub(crate) stepper: S,
    pub(crate) serial: T,
    pub(crate) sense: C,
    pub(crate) stack: K,
    // logs the start of a stop once instead of on every recovery pass
    pub(crate) stop_seen: bool,
}

impl<'a, P, S, T, C, K> Protocol<'a, P, S, T, C, K>
where
    P: Planner,
    S: Stepper,
    T: Transport,
    C: SenseControl,
    K: StackProbe,
{
    pub fn new(
        config: MachineConfig,
        flow: &'a FlowControl,
        planner: P,
        stepper: S,
        serial: T,
        sense: C,
        stack: K,
    ) -> Self {
        Protocol {
            st: ProtocolState::new(&config),
            config,
            pdata: ParamData::new(),
            flow,
            planner,
            stepper,
            serial,
            sense,
            stack,
            stop_seen: false,
        }
    }

    pub fn state(&self) -> &ProtocolState {
        &self.st
    }

    pub fn param_count(&self) -> usize {
        self.pdata.count()
    }

    pub fn run(&mut self) -> ! {
        loop {
            self.poll();
        }
    }

    /// Waits for one byte and processes it.
    pub fn poll(&mut self) {
        let chr = self.read_byte();
        self.process_byte(chr);
    }

    fn read_byte(&mut self) -> u8 {
        loop {
            match self.serial.read() {
                Ok(chr) => return chr,
                Err(nb::Error::WouldBlock) => {}
                Err(nb::Error::Other(_)) => {
                    warn!("serial read failed");
                    self.stop(StopError::TransmissionError);
                }
            }
            self.idle();
        }
    }

    pub fn process_byte(&mut self, chr: u8) {
        // A stop can be raised any time by the stepper or serial interrupts.
        // Until the host resumes, bytes are drained without being looked at.
        if self.stepper.stop_requested() {
            self.idle();
            return;
        }

        let class = classify(chr);
        let res = match class {
            ByteClass::Command(marker) => self.on_cmd(marker),
            ByteClass::Parameter(marker) => self.on_param(marker),
            ByteClass::InvalidMarker(_) => Err(StopError::InvalidMarker),
            ByteClass::Operand(chr) => self.pdata.push(chr),
        };
        if !matches!(class, ByteClass::Operand(_)) {
            self.pdata.reset();
        }
        if let Err(err) = res {
            self.stop(err);
        }

        self.idle();
    }

    fn stop(&mut self, err: StopError) {
        warn!("protocol stop: {}", err);
        self.stepper.request_stop(err);
    }

    fn on_cmd(&mut self, marker: u8) -> Result<(), StopError> {
        let cmd = Command::from_marker(marker).ok_or(StopError::InvalidCommand)?;
        debug!("on_cmd: {}", cmd);
        match cmd {
            Command::None => {}
            Command::Line => self.submit(self.line(self.st.intensity, 0.0)),
            Command::Raster => self.submit(self.line(self.st.intensity, self.st.pixel_width)),
            Command::Dwell => self.submit(Block::Dwell {
                duration: self.st.duration,
                intensity: self.st.intensity,
            }),
            Command::RefRelative => self.st.ref_mode = RefMode::Relative,
            Command::RefAbsolute => self.st.ref_mode = RefMode::Absolute,
            Command::RefStore => self.st.ref_mode_store = self.st.ref_mode,
            Command::RefRestore => self.st.ref_mode = self.st.ref_mode_store,
            Command::Homing => {
                // the axes belong to the executor until queued motion is done
                self.synchronize();
                if self.stepper.stop_requested() {
                    return Ok(());
                }
                self.stepper.homing_cycle();
                self.planner.set_position(self.stepper.position());
                self.st.offset = [0.0; 3];
                // move the head to the table origin
                self.st.target = self.config.origin_offset;
                self.submit(self.line(0, 0.0));
            }
            Command::OffsetStore => self.st.offset_store = self.st.offset,
            Command::OffsetRestore => self.st.offset = self.st.offset_store,
            Command::AirEnable => self.submit(Block::AirAssist(true)),
            Command::AirDisable => self.submit(Block::AirAssist(false)),
            Command::AuxEnable => self.submit(Block::AuxAssist(true)),
            Command::AuxDisable => self.submit(Block::AuxAssist(false)),
        }
        Ok(())
    }

    fn on_param(&mut self, marker: u8) -> Result<(), StopError> {
        // operand count is checked before the marker itself
        let val = self.pdata.value()?;
        let param = Parameter::from_marker(marker).ok_or(StopError::InvalidParameter)?;
        debug!("on_param: {} = {}", param, val);
        match param {
            Parameter::TargetX => self.set_target(X_AXIS, val),
            Parameter::TargetY => self.set_target(Y_AXIS, val),
            Parameter::TargetZ => self.set_target(Z_AXIS, val),
            Parameter::Feedrate => self.st.feedrate = val,
            Parameter::Intensity => self.st.intensity = val.clamp(0.0, 255.0) as u8,
            Parameter::Duration => self.st.duration = val,
            Parameter::PixelWidth => self.st.pixel_width = val,
            Parameter::OffsetX => self.set_offset(X_AXIS, val),
            Parameter::OffsetY => self.set_offset(Y_AXIS, val),
            Parameter::OffsetZ => self.set_offset(Z_AXIS, val),
        }
        Ok(())
    }

    fn set_target(&mut self, axis: usize, val: f64) {
        match self.st.ref_mode {
            RefMode::Absolute => {
                self.st.target[axis] = val + self.config.origin_offset[axis] + self.st.offset[axis];
            }
            // deltas on the already resolved target
            RefMode::Relative => self.st.target[axis] += val,
        }
    }

    fn set_offset(&mut self, axis: usize, val: f64) {
        match self.st.ref_mode {
            RefMode::Absolute => self.st.offset[axis] = val,
            RefMode::Relative => {
                // relative to where the head actually rests, not the queued target
                self.synchronize();
                self.st.offset[axis] =
                    self.stepper.position()[axis] - self.config.origin_offset[axis] + val;
            }
        }
    }

    fn line(&self, intensity: u8, pixel_width: f64) -> Block {
        Block::Line {
            target: self.st.target,
            feedrate: self.st.feedrate,
            intensity,
            pixel_width,
        }
    }

    /// Waits until all queued motion has been executed.
    fn synchronize(&mut self) {
        while self.stepper.processing() {
            self.idle();
        }
    }

    /// Waits for room in the block buffer. A block still waiting when a stop
    /// is raised is dropped with the rest of the queue.
    fn submit(&mut self, mut block: Block) {
        loop {
            if self.stepper.stop_requested() {
                debug!("submit: dropped {} on stop", block);
                return;
            }
            match self.planner.try_push(block) {
                Ok(()) => return,
                Err(b) => block = b,
            }
            self.idle();
        }
    }
}
