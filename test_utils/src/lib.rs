//! Shared builders for the integration tests.

pub mod app;
pub mod scenario;

pub use app::{capture_events, runner_app, CapturedEvents};
pub use scenario::{
    airborne_body, controller, controller_with, run_moves, scenario_world, wall_side_body,
    RUNNER_ID, STEP,
};

/// Asserts that two vectors agree component-wise within `epsilon`.
///
/// # Panics
/// Panics naming both vectors when any component differs by more than
/// `epsilon`.
pub fn assert_vec3_near(actual: glam::Vec3, expected: glam::Vec3, epsilon: f32) {
    assert!(
        actual.abs_diff_eq(expected, epsilon),
        "{actual:?} differs from {expected:?} by more than {epsilon}"
    );
}
