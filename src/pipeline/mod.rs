//! Time grid, per-timestep frame generation, and the streaming run driver.

pub mod generator;
pub mod grid;
/// Sequential and rayon-parallel runs into a [`crate::encode::sink::FrameSink`].
pub mod run;
