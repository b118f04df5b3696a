//! Wall-run entry from a falling state.

use glam::Vec3;
use log::trace;

use crate::collision::{CollisionWork, CollisionWorld, HitResult};
use crate::mode::{MovementMode, WallRunSide};
use crate::vector_math::{is_nearly_zero, is_nearly_zero_scalar, size_squared_2d, vector_plane_project};

use super::{BaseMovement, CharacterBody, WallRunMovement};

impl<B: BaseMovement> WallRunMovement<B> {
    /// Horizontal speed is at least the minimum wall-run speed.
    ///
    /// A nearly-zero horizontal speed is always insufficient, even with a
    /// zero minimum.
    #[must_use]
    pub fn is_enough_velocity_2d(&self, velocity: Vec3) -> bool {
        let speed_squared = size_squared_2d(velocity);
        if is_nearly_zero_scalar(speed_squared) {
            return false;
        }
        speed_squared >= self.settings.min_wall_run_speed.powi(2)
    }

    /// Horizontal speed suffices and the body is not dropping too fast.
    #[must_use]
    pub fn is_enough_velocity(&self, velocity: Vec3) -> bool {
        self.is_enough_velocity_2d(velocity)
            && velocity.z >= -self.settings.max_vertical_down_wall_run_speed
    }

    /// Probes `side` and accepts it if the body moves into the wall found.
    fn probe_side(
        &self,
        work: &mut CollisionWork,
        world: &dyn CollisionWorld,
        side: WallRunSide,
        velocity: Vec3,
    ) -> Option<HitResult> {
        let scale = self.settings.wall_run_radius_scale_for_wall_scan_distance;
        if !work.line_trace_wall(world, side, scale) {
            return None;
        }
        work.hit.filter(|hit| velocity.dot(hit.normal) < 0.0)
    }

    /// Looks for a wall the body is moving into, left side first.
    fn find_wall(
        &self,
        work: &mut CollisionWork,
        world: &dyn CollisionWorld,
        velocity: Vec3,
    ) -> Option<(WallRunSide, HitResult)> {
        if is_nearly_zero(velocity) {
            return None;
        }
        [WallRunSide::Left, WallRunSide::Right]
            .into_iter()
            .find_map(|side| {
                self.probe_side(work, world, side, velocity)
                    .map(|hit| (side, hit))
            })
    }

    /// Tries to start wall running. On success the velocity is projected
    /// onto the wall with its vertical part clamped to
    /// `[0, max_vertical_up_wall_run_speed]`, the wall normal is stored and
    /// the mode becomes [`MovementMode::WallRun`].
    pub fn try_wall_run(&mut self, body: &mut CharacterBody, world: &dyn CollisionWorld) -> bool {
        if !self.mode.is_falling() || !self.is_wall_run_enabled() {
            return false;
        }
        if !self.is_enough_velocity(body.velocity) {
            return false;
        }

        let mut work = body.collision_work(false);
        if work.line_trace_floor(world, self.settings.min_wall_run_height) {
            trace!("wall-run entry refused: floor too close");
            return false;
        }
        let Some((side, hit)) = self.find_wall(&mut work, world, body.velocity) else {
            return false;
        };

        let mut projected = vector_plane_project(body.velocity, hit.normal);
        if !self.is_enough_velocity_2d(projected) {
            trace!("wall-run entry refused: too slow along the wall");
            return false;
        }
        projected.z = projected
            .z
            .clamp(0.0, self.settings.max_vertical_up_wall_run_speed);

        body.velocity = projected;
        self.wall_normal = hit.normal;
        self.set_movement_mode(body, world, MovementMode::WallRun(side));
        true
    }
}
