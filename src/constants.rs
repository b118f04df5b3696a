//! Simulation constants shared by the movement systems.
//!
//! Distances are centimetres and times are seconds, matching the units of
//! the tunable settings in [`crate::config`].

/// Shortest span of time worth simulating.
pub const MIN_TICK_TIME: f32 = 1e-6;
/// Upper bound on substeps performed within one simulated tick.
pub const MAX_SIMULATION_ITERATIONS: u32 = 8;
/// Longest substep the base simulator hands to a physics routine.
pub const MAX_SIMULATION_TIME_STEP: f32 = 0.05;
/// Gravity along Z in cm/s².
pub const DEFAULT_GRAVITY_Z: f32 = -980.0;
/// Maximum downward speed reached while falling.
pub const TERMINAL_VELOCITY: f32 = 4000.0;
/// Tolerance used when asking whether a vector is nearly zero.
pub const KINDA_SMALL_NUMBER: f32 = 1e-4;
/// Tolerance used when asking whether a scalar is nearly zero.
pub const SMALL_NUMBER: f32 = 1e-8;
/// Wall gravity scale applied when no curve is configured and the body
/// accelerates against its direction of travel.
pub const DEFAULT_WALL_GRAVITY_SCALE: f32 = 0.4;
/// Distance kept between a moved capsule and the surface it hit.
pub const SAFE_MOVE_SKIN: f32 = 0.01;
/// Smallest Z component of a surface normal the body can stand on.
pub const WALKABLE_FLOOR_Z: f32 = 0.71;
/// Distance below the capsule searched for ground while walking.
pub const FLOOR_PROBE_DISTANCE: f32 = 2.4;
/// Capsule radius of a new body.
pub const DEFAULT_CAPSULE_RADIUS: f32 = 40.0;
/// Capsule half height of a new body, hemispheres included.
pub const DEFAULT_CAPSULE_HALF_HEIGHT: f32 = 90.0;
/// Fixed move length used by the CLI and the ECS plugin.
pub const DEFAULT_SIMULATION_STEP: f32 = 1.0 / 60.0;
