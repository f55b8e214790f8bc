#[macro_use]
mod board_helper;

pub mod board;
pub use board::*;

pub mod config;
