//! Physics while running along a wall.
//!
//! Each substep re-finds the wall with a capsule sweep, moves the body along
//! the wall plane under reduced gravity, then pulls it back against the
//! wall so the next sweep finds it again.

use glam::Vec3;
use log::trace;

use crate::collision::{CollisionWork, CollisionWorld, HitResult};
use crate::mode::{MovementMode, WallRunSide};
use crate::vector_math::{
    is_nearly_zero, safe_normal, safe_normal_2d, size_2d, vector_plane_project,
};
use crate::MIN_TICK_TIME;

use super::{BaseMovement, CharacterBody, PhysOutcome, WallRunMovement};

/// Displacement along a wall that blocked part of a move.
///
/// `achieved` is the displacement actually travelled. The lost horizontal
/// distance is redirected along the blocking wall's tangent, toward the
/// body's forward side for `side`, and the lost vertical distance is kept
/// as is.
///
/// # Examples
/// ```
/// use glam::Vec3;
/// use wallrun::mode::WallRunSide;
/// use wallrun::movement::calc_delta_after_blocked;
///
/// let slide = calc_delta_after_blocked(
///     WallRunSide::Right,
///     Vec3::new(0.0, -10.0, 2.0),
///     Vec3::new(0.0, -4.0, 1.0),
///     Vec3::NEG_X,
/// );
/// assert_eq!(slide, Vec3::new(0.0, -6.0, 1.0));
/// ```
#[must_use]
pub fn calc_delta_after_blocked(
    side: WallRunSide,
    delta: Vec3,
    achieved: Vec3,
    wall_normal: Vec3,
) -> Vec3 {
    let lost = size_2d(delta) - size_2d(achieved);
    let tangent = safe_normal_2d(Vec3::Z.cross(wall_normal));
    let mut slide = tangent * lost * side.sign();
    slide.z = delta.z - achieved.z;
    slide
}

impl<B: BaseMovement> WallRunMovement<B> {
    /// Multiplier applied to gravity while wall running.
    ///
    /// Zero while rising. Otherwise looked up from the cosine between the
    /// acceleration direction and the horizontal travel direction, so
    /// braking against the direction of travel slides the body down faster.
    #[must_use]
    pub fn wall_gravity_scale(&self, acceleration: Vec3, velocity: Vec3) -> f32 {
        if velocity.z > 0.0 {
            return 0.0;
        }
        let cosine = safe_normal(acceleration).dot(safe_normal_2d(velocity));
        self.settings.gravity_scale_for_cosine(cosine)
    }

    /// The acceleration points away from the wall by more than the
    /// configured pull-away angle.
    ///
    /// The cosine against the wall normal equals the sine of the angle
    /// against the wall surface, hence the comparison with a sine.
    #[must_use]
    pub fn is_pull_away(&self, acceleration: Vec3, wall_normal: Vec3) -> bool {
        if is_nearly_zero(acceleration) {
            return false;
        }
        let threshold = self.settings.wall_run_pull_away_angle.to_radians().sin();
        safe_normal(acceleration).dot(wall_normal) > threshold
    }

    fn find_wall_to_run_on(
        &self,
        work: &mut CollisionWork,
        world: &dyn CollisionWorld,
        side: WallRunSide,
        acceleration: Vec3,
    ) -> Option<Vec3> {
        let scale = self.settings.wall_run_radius_scale_for_wall_scan_distance;
        work.sweep_wall(world, side, scale);
        let Some(hit) = work.hit.filter(HitResult::is_valid_blocking_hit) else {
            trace!("wall lost on {side:?}");
            return None;
        };
        if self.is_pull_away(acceleration, hit.normal) {
            trace!("pulling away from wall {:?}", hit.normal);
            return None;
        }
        Some(hit.normal)
    }

    /// Wall running should end: too slow, ground close below, or no wall
    /// left on `side`.
    fn is_finished(
        &self,
        work: &mut CollisionWork,
        world: &dyn CollisionWorld,
        velocity: Vec3,
        side: WallRunSide,
    ) -> bool {
        if !self.is_enough_velocity_2d(velocity) {
            return true;
        }
        if work.line_trace_floor(world, self.settings.min_wall_run_height) {
            return true;
        }
        let scale = self.settings.wall_run_radius_scale_for_wall_scan_distance;
        !work.line_trace_wall(world, side, scale)
    }

    pub(super) fn phys_wall_run(
        &mut self,
        body: &mut CharacterBody,
        world: &dyn CollisionWorld,
        delta_time: f32,
        mut iterations: u32,
    ) -> PhysOutcome {
        if delta_time < MIN_TICK_TIME {
            return PhysOutcome::Done;
        }
        let Some(side) = self.mode.wall_run_side() else {
            return PhysOutcome::handoff(MovementMode::Falling, delta_time, iterations);
        };
        if !self.is_wall_run_enabled() {
            return PhysOutcome::handoff(MovementMode::Falling, delta_time, iterations);
        }

        let mut remaining = delta_time;
        let mut work = body.collision_work(true);
        while remaining >= MIN_TICK_TIME && iterations < self.base.max_iterations() {
            iterations += 1;
            let dt = self.base.simulation_time_step(remaining, iterations);
            remaining -= dt;
            work.refresh(body.location, body.right_vector());
            let old_location = body.location;

            let Some(mut wall_normal) =
                self.find_wall_to_run_on(&mut work, world, side, body.acceleration)
            else {
                return PhysOutcome::handoff(MovementMode::Falling, remaining + dt, iterations - 1);
            };

            let previous_acceleration = body.acceleration;
            let previous_velocity = body.velocity;

            let mut acceleration = vector_plane_project(body.acceleration, wall_normal);
            acceleration.z = 0.0;
            body.acceleration = acceleration;
            let unprojected = self.base.calc_velocity(
                body.velocity,
                acceleration,
                dt,
                0.0,
                self.max_braking_deceleration(),
                self.max_speed(),
            );
            let mut velocity = vector_plane_project(unprojected, wall_normal);
            velocity.z += self.base.gravity_z() * self.wall_gravity_scale(acceleration, velocity) * dt;
            body.velocity = velocity;

            if !self.is_enough_velocity(velocity) {
                body.acceleration = previous_acceleration;
                body.velocity = previous_velocity;
                return PhysOutcome::handoff(MovementMode::Falling, remaining + dt, iterations - 1);
            }

            let delta = velocity * dt;
            if is_nearly_zero(delta) {
                remaining = 0.0;
            } else {
                let away = wall_normal
                    * (dt * self.settings.wall_run_away_from_wall_before_moving_velocity_scale);
                self.base.safe_move(world, body, away);

                if let Some(hit) = self.base.safe_move(world, body, delta) {
                    wall_normal = hit.normal;
                    let slide =
                        calc_delta_after_blocked(side, delta, hit.location - old_location, hit.normal);
                    if !is_nearly_zero(slide) {
                        self.base.safe_move(world, body, slide);
                    }
                }

                let attraction = -wall_normal
                    * (dt * self.settings.wall_run_attraction_velocity_scale * work.radius());
                self.base.safe_move(world, body, attraction);
                self.wall_normal = wall_normal;
                work.refresh(body.location, body.right_vector());
            }

            if body.location == old_location {
                trace!("wall run made no progress; ending substeps");
                remaining = 0.0;
                break;
            }
            body.velocity = (body.location - old_location) / dt;

            if self.is_finished(&mut work, world, body.velocity, side) {
                return PhysOutcome::handoff(MovementMode::Falling, remaining, iterations);
            }
        }

        if self.is_finished(&mut work, world, body.velocity, side) {
            return PhysOutcome::handoff(MovementMode::Falling, remaining, iterations);
        }
        PhysOutcome::Done
    }
}
