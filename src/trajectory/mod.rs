//! Recorded trajectories and time-based sampling.

/// Trajectory points and the validated [`point::Trajectory`] container.
pub mod point;
/// Interpolation at arbitrary instants.
pub mod sampler;
