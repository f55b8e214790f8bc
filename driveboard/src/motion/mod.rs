pub mod engine;
pub mod homing;
pub mod io;
pub mod planner;
pub mod stepper;
