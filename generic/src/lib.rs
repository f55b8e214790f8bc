#![cfg_attr(not(test), no_std)]

// Logging shims must come first so every module below can use them.
#[macro_use]
mod log;

pub mod accumulator;
pub mod codec;
pub mod collaborators;
pub mod command_to_wire;
pub mod config;
pub mod driveboard_error;
pub mod flow_control;
pub mod markers;
pub mod protocol;
pub mod raster;
pub mod serial_filter;
pub mod stack;
pub mod state;
pub mod status;
pub mod status_parser;
pub mod step_plan;
pub mod stop_latch;

#[cfg(test)]
mod mock;
