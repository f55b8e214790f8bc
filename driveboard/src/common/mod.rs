pub mod global_status;
pub mod sense_control;
pub mod serial;
pub mod stack_monitor;
