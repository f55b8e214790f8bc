use generic::flow_control::FlowControl;
use generic::stop_latch::StopLatch;

/// Raised by the serial and stepper interrupts and by the protocol, cleared by
/// a host resume.
pub static STOP: StopLatch = StopLatch::new();

/// Status requests from the serial interrupt, underruns from the stepper.
pub static FLOW: FlowControl = FlowControl::new();
