#![no_std]

use defmt_rtt as _;
use panic_probe as _;

pub mod bsp;
pub mod common;
pub mod motion;
