//! In-memory machine used by the protocol tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use core::convert::Infallible;

use crate::codec::encode;
use crate::collaborators::{Block, Limit, Planner, SenseControl, StackProbe, Stepper, Transport};
use crate::config::MachineConfig;
use crate::driveboard_error::StopError;
use crate::flow_control::FlowControl;
use crate::protocol::Protocol;
use crate::step_plan::should_queue;
use crate::stop_latch::StopLatch;

pub struct MockMachine {
    pub queue: VecDeque<Block>,
    pub capacity: usize,
    pub executed: Vec<Block>,
    pub rejected: usize,
    pub skipped: usize,
    pub stop_on_reject: Option<StopError>,
    pub planner_position: [f64; 3],
    pub position: [f64; 3],
    pub homed: usize,
    pub stop: StopLatch,
    pub rx: VecDeque<u8>,
    pub tx: Vec<u8>,
    pub door_open: bool,
    pub chiller_off: bool,
    pub limits: Vec<Limit>,
    pub laser_overrides: Vec<u8>,
    pub sleeps: usize,
    pub clearance: u16,
}

impl MockMachine {
    fn new(config: &MachineConfig) -> Self {
        MockMachine {
            queue: VecDeque::new(),
            capacity: 16,
            executed: Vec::new(),
            rejected: 0,
            skipped: 0,
            stop_on_reject: None,
            planner_position: config.origin_offset,
            position: config.origin_offset,
            homed: 0,
            stop: StopLatch::new(),
            rx: VecDeque::new(),
            tx: Vec::new(),
            door_open: false,
            chiller_off: false,
            limits: Vec::new(),
            laser_overrides: Vec::new(),
            sleeps: 0,
            clearance: 512,
        }
    }

    /// Executes the oldest queued block. Lines end exactly on their target.
    pub fn step(&mut self) -> bool {
        match self.queue.pop_front() {
            Some(block) => {
                if let Block::Line { target, .. } = block {
                    self.position = target;
                }
                self.executed.push(block);
                true
            }
            None => false,
        }
    }

    pub fn run_all(&mut self) {
        while self.step() {}
    }
}

pub type Shared = Rc<RefCell<MockMachine>>;

pub struct MockPlanner(Shared);
pub struct MockStepper(Shared);
pub struct MockSerial(Shared);
pub struct MockSense(Shared);
pub struct MockStack(Shared);

impl Planner for MockPlanner {
    fn try_push(&mut self, block: Block) -> Result<(), Block> {
        let mut m = self.0.borrow_mut();
        if !should_queue(m.planner_position, &block) {
            m.skipped += 1;
            return Ok(());
        }
        if m.queue.len() < m.capacity {
            m.queue.push_back(block);
            if let Block::Line { target, .. } = block {
                m.planner_position = target;
            }
            return Ok(());
        }
        m.rejected += 1;
        match m.stop_on_reject {
            Some(err) => {
                m.stop.request(err);
            }
            // the executor frees a slot while the protocol idles
            None => {
                m.step();
            }
        }
        Err(block)
    }

    fn blocks_available(&self) -> bool {
        !self.0.borrow().queue.is_empty()
    }

    fn reset_block_buffer(&mut self) {
        self.0.borrow_mut().queue.clear();
    }

    fn set_position(&mut self, position: [f64; 3]) {
        self.0.borrow_mut().planner_position = position;
    }
}

impl Stepper for MockStepper {
    fn position(&self) -> [f64; 3] {
        self.0.borrow().position
    }

    fn processing(&self) -> bool {
        self.0.borrow_mut().step()
    }

    fn homing_cycle(&mut self) {
        let mut m = self.0.borrow_mut();
        m.homed += 1;
        m.position = [0.0; 3];
    }

    fn request_stop(&self, err: StopError) {
        self.0.borrow().stop.request(err);
    }

    fn stop_requested(&self) -> bool {
        self.0.borrow().stop.is_requested()
    }

    fn stop_status(&self) -> Option<StopError> {
        self.0.borrow().stop.status()
    }
}

impl embedded_hal_nb::serial::ErrorType for MockSerial {
    type Error = Infallible;
}

impl embedded_hal_nb::serial::Read<u8> for MockSerial {
    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        self.0
            .borrow_mut()
            .rx
            .pop_front()
            .ok_or(nb::Error::WouldBlock)
    }
}

impl embedded_hal_nb::serial::Write<u8> for MockSerial {
    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        self.0.borrow_mut().tx.push(word);
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        Ok(())
    }
}

impl Transport for MockSerial {
    fn data_available(&mut self) -> bool {
        !self.0.borrow().rx.is_empty()
    }
}

impl SenseControl for MockSense {
    fn door_open(&mut self) -> bool {
        self.0.borrow().door_open
    }

    fn chiller_off(&mut self) -> bool {
        self.0.borrow().chiller_off
    }

    fn limit_hit(&mut self, limit: Limit) -> bool {
        self.0.borrow().limits.contains(&limit)
    }

    fn set_laser_intensity(&mut self, intensity: u8) {
        self.0.borrow_mut().laser_overrides.push(intensity);
    }

    fn sleep(&mut self) {
        self.0.borrow_mut().sleeps += 1;
    }
}

impl StackProbe for MockStack {
    fn clearance(&self) -> u16 {
        self.0.borrow().clearance
    }
}

pub type MockProtocol =
    Protocol<'static, MockPlanner, MockStepper, MockSerial, MockSense, MockStack>;

pub fn mock_protocol(config: MachineConfig) -> (MockProtocol, Shared) {
    let m = Rc::new(RefCell::new(MockMachine::new(&config)));
    let flow: &'static FlowControl = Box::leak(Box::new(FlowControl::new()));
    let p = Protocol::new(
        config,
        flow,
        MockPlanner(m.clone()),
        MockStepper(m.clone()),
        MockSerial(m.clone()),
        MockSense(m.clone()),
        MockStack(m.clone()),
    );
    (p, m)
}

pub fn send(p: &mut MockProtocol, bytes: &[u8]) {
    for b in bytes {
        p.process_byte(*b);
    }
}

pub fn send_param(p: &mut MockProtocol, marker: u8, val: f64) {
    send(p, &encode(val));
    send(p, &[marker]);
}
