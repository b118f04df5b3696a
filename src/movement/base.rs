//! Base stepped-motion simulator the wall-run controller builds on.
//!
//! [`BaseMovement`] is the contract the controller consumes: substep
//! sizing, velocity update, collision-aware moves and the physics of the
//! ordinary walking and falling modes. [`StandardMovement`] is a compact
//! reference implementation with ground friction, air control, terminal
//! velocity and landing on walkable floors.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::collision::{CollisionWorld, HitResult};
use crate::mode::MovementMode;
use crate::vector_math::{is_nearly_zero, safe_normal, vector_plane_project};
use crate::{
    DEFAULT_GRAVITY_Z, FLOOR_PROBE_DISTANCE, MAX_SIMULATION_ITERATIONS, MAX_SIMULATION_TIME_STEP,
    MIN_TICK_TIME, SAFE_MOVE_SKIN, TERMINAL_VELOCITY, WALKABLE_FLOOR_Z,
};

use super::CharacterBody;

/// Result of running one mode's physics for part of a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhysOutcome {
    /// The routine consumed the time it was given (or gave up on it).
    Done,
    /// The routine switched to `mode` and hands the unconsumed time back.
    Handoff {
        /// Mode to continue in.
        mode: MovementMode,
        /// Seconds left over.
        remaining: f32,
        /// Substeps used so far this tick.
        iterations: u32,
    },
}

impl PhysOutcome {
    /// Shorthand for [`PhysOutcome::Handoff`].
    #[must_use]
    pub const fn handoff(mode: MovementMode, remaining: f32, iterations: u32) -> Self {
        Self::Handoff {
            mode,
            remaining,
            iterations,
        }
    }
}

/// Whether a surface with `normal` can be stood on.
#[must_use]
pub const fn is_walkable(normal: Vec3) -> bool {
    normal.z >= WALKABLE_FLOOR_Z
}

/// Decelerates `velocity` when no acceleration is applied, stopping rather
/// than reversing direction.
fn apply_braking(velocity: Vec3, dt: f32, friction: f32, braking_deceleration: f32) -> Vec3 {
    if is_nearly_zero(velocity) || dt < MIN_TICK_TIME {
        return velocity;
    }
    if friction <= 0.0 && braking_deceleration <= 0.0 {
        return velocity;
    }
    let reverse = safe_normal(velocity) * -braking_deceleration;
    let braked = velocity + (velocity * -friction + reverse) * dt;
    if braked.dot(velocity) <= 0.0 {
        Vec3::ZERO
    } else {
        braked
    }
}

/// Contract of the base simulator.
pub trait BaseMovement {
    /// Upper bound on substeps within one tick.
    fn max_iterations(&self) -> u32 {
        MAX_SIMULATION_ITERATIONS
    }

    /// Size of the next substep out of `remaining` seconds.
    ///
    /// Long remainders are split in half (bounded by
    /// [`MAX_SIMULATION_TIME_STEP`]) until the iteration budget runs out,
    /// after which the whole remainder is used.
    fn simulation_time_step(&self, remaining: f32, iterations: u32) -> f32 {
        let step = if remaining > MAX_SIMULATION_TIME_STEP && iterations < self.max_iterations() {
            MAX_SIMULATION_TIME_STEP.min(remaining * 0.5)
        } else {
            remaining
        };
        step.max(MIN_TICK_TIME)
    }

    /// Gravity along Z in cm/s², negative downwards.
    fn gravity_z(&self) -> f32;

    /// Largest input acceleration accepted.
    fn max_acceleration(&self) -> f32;

    /// Top speed in the base modes.
    fn max_speed(&self) -> f32;

    /// Braking applied without input in the base `mode`.
    fn max_braking_deceleration(&self, mode: MovementMode) -> f32;

    /// Base jump rules: only grounded bodies may jump.
    fn can_attempt_jump(&self, mode: MovementMode) -> bool {
        matches!(mode, MovementMode::Walking)
    }

    /// Upward speed given by a jump.
    fn jump_z_velocity(&self) -> f32;

    /// Applies `acceleration` for `dt` seconds.
    ///
    /// `friction` steers the velocity toward the acceleration direction;
    /// braking applies only when there is no acceleration. The result never
    /// exceeds `max_speed` unless the body was already faster.
    fn calc_velocity(
        &self,
        velocity: Vec3,
        acceleration: Vec3,
        dt: f32,
        friction: f32,
        braking_deceleration: f32,
        max_speed: f32,
    ) -> Vec3 {
        if is_nearly_zero(acceleration) {
            return apply_braking(velocity, dt, friction, braking_deceleration);
        }
        let speed = velocity.length();
        let direction = safe_normal(acceleration);
        let steered = velocity - (velocity - direction * speed) * (dt * friction).min(1.0);
        let limit = if speed > max_speed { speed } else { max_speed };
        (steered + acceleration * dt).clamp_length_max(limit)
    }

    /// Moves the body by `delta`, stopping short of the first blocking
    /// surface. Returns the blocking hit with `location` set to where the
    /// body ended up.
    fn safe_move(
        &self,
        world: &dyn CollisionWorld,
        body: &mut CharacterBody,
        delta: Vec3,
    ) -> Option<HitResult> {
        if is_nearly_zero(delta) {
            return None;
        }
        let start = body.location;
        let filter = body.query_filter();
        let Some(hit) = world.sweep_capsule(start, start + delta, body.capsule, &filter) else {
            body.location = start + delta;
            return None;
        };
        if hit.start_penetrating {
            if delta.dot(hit.normal) >= 0.0 {
                body.location = start + delta;
                return None;
            }
            return Some(HitResult {
                location: start,
                ..hit
            });
        }
        let length = delta.length();
        let travel = (hit.time * length - SAFE_MOVE_SKIN).max(0.0);
        body.location = start + delta * (travel / length);
        Some(HitResult {
            location: body.location,
            ..hit
        })
    }

    /// Walking physics for up to `delta_time` seconds.
    fn phys_walking(
        &self,
        world: &dyn CollisionWorld,
        body: &mut CharacterBody,
        delta_time: f32,
        iterations: u32,
    ) -> PhysOutcome;

    /// Falling physics for up to `delta_time` seconds.
    fn phys_falling(
        &self,
        world: &dyn CollisionWorld,
        body: &mut CharacterBody,
        delta_time: f32,
        iterations: u32,
    ) -> PhysOutcome;
}

/// Reference base simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardMovement {
    /// Gravity along Z in cm/s².
    pub gravity_z: f32,
    /// Speed cap on the ground in cm/s.
    pub max_walk_speed: f32,
    /// Input acceleration cap in cm/s².
    pub max_acceleration: f32,
    /// Steering and braking friction on the ground.
    pub ground_friction: f32,
    /// Braking without input while walking.
    pub braking_deceleration_walking: f32,
    /// Braking without input while falling.
    pub braking_deceleration_falling: f32,
    /// Fraction of the input acceleration applied while airborne.
    pub air_control: f32,
    /// Upward speed given by a jump.
    pub jump_z_velocity: f32,
    /// Fastest fall in cm/s.
    pub terminal_velocity: f32,
}

impl Default for StandardMovement {
    fn default() -> Self {
        Self {
            gravity_z: DEFAULT_GRAVITY_Z,
            max_walk_speed: 600.0,
            max_acceleration: 2048.0,
            ground_friction: 8.0,
            braking_deceleration_walking: 2048.0,
            braking_deceleration_falling: 0.0,
            air_control: 0.35,
            jump_z_velocity: 420.0,
            terminal_velocity: TERMINAL_VELOCITY,
        }
    }
}

impl StandardMovement {
    /// Sweeps down a short distance looking for walkable ground.
    fn find_floor(&self, world: &dyn CollisionWorld, body: &CharacterBody) -> Option<HitResult> {
        let start = body.location;
        let end = start + Vec3::NEG_Z * FLOOR_PROBE_DISTANCE;
        world
            .sweep_capsule(start, end, body.capsule, &body.query_filter())
            .filter(|hit| hit.is_valid_blocking_hit() && is_walkable(hit.normal))
    }

    /// Slides the rest of a blocked move along the surface it hit.
    fn slide_along_surface(
        &self,
        world: &dyn CollisionWorld,
        body: &mut CharacterBody,
        delta: Vec3,
        hit: &HitResult,
    ) -> Option<HitResult> {
        let rest = vector_plane_project(delta * (1.0 - hit.time), hit.normal);
        body.velocity = vector_plane_project(body.velocity, hit.normal);
        self.safe_move(world, body, rest)
    }
}

impl BaseMovement for StandardMovement {
    fn gravity_z(&self) -> f32 {
        self.gravity_z
    }

    fn max_acceleration(&self) -> f32 {
        self.max_acceleration
    }

    fn max_speed(&self) -> f32 {
        self.max_walk_speed
    }

    fn max_braking_deceleration(&self, mode: MovementMode) -> f32 {
        match mode {
            MovementMode::Walking => self.braking_deceleration_walking,
            MovementMode::Falling | MovementMode::WallRun(_) => self.braking_deceleration_falling,
        }
    }

    fn jump_z_velocity(&self) -> f32 {
        self.jump_z_velocity
    }

    fn phys_walking(
        &self,
        world: &dyn CollisionWorld,
        body: &mut CharacterBody,
        delta_time: f32,
        mut iterations: u32,
    ) -> PhysOutcome {
        let mut remaining = delta_time;
        while remaining >= MIN_TICK_TIME && iterations < self.max_iterations() {
            iterations += 1;
            let dt = self.simulation_time_step(remaining, iterations);
            remaining -= dt;

            let acceleration = Vec3::new(body.acceleration.x, body.acceleration.y, 0.0);
            let planar = Vec3::new(body.velocity.x, body.velocity.y, 0.0);
            body.velocity = self.calc_velocity(
                planar,
                acceleration,
                dt,
                self.ground_friction,
                self.braking_deceleration_walking,
                self.max_walk_speed,
            );

            let delta = body.velocity * dt;
            if let Some(hit) = self.safe_move(world, body, delta) {
                if !is_walkable(hit.normal) {
                    self.slide_along_surface(world, body, delta, &hit);
                    body.velocity.z = 0.0;
                }
            }

            match self.find_floor(world, body) {
                Some(floor) => body.location.z = floor.location.z + SAFE_MOVE_SKIN,
                None => return PhysOutcome::handoff(MovementMode::Falling, remaining, iterations),
            }
        }
        PhysOutcome::Done
    }

    fn phys_falling(
        &self,
        world: &dyn CollisionWorld,
        body: &mut CharacterBody,
        delta_time: f32,
        mut iterations: u32,
    ) -> PhysOutcome {
        let mut remaining = delta_time;
        while remaining >= MIN_TICK_TIME && iterations < self.max_iterations() {
            iterations += 1;
            let dt = self.simulation_time_step(remaining, iterations);
            remaining -= dt;

            let acceleration =
                Vec3::new(body.acceleration.x, body.acceleration.y, 0.0) * self.air_control;
            let planar = self.calc_velocity(
                Vec3::new(body.velocity.x, body.velocity.y, 0.0),
                acceleration,
                dt,
                0.0,
                self.braking_deceleration_falling,
                self.max_walk_speed,
            );
            let vertical = (body.velocity.z + self.gravity_z * dt).max(-self.terminal_velocity);
            body.velocity = Vec3::new(planar.x, planar.y, vertical);

            let delta = body.velocity * dt;
            let Some(hit) = self.safe_move(world, body, delta) else {
                continue;
            };
            let landed = if is_walkable(hit.normal) {
                true
            } else {
                self.slide_along_surface(world, body, delta, &hit)
                    .is_some_and(|second| is_walkable(second.normal))
            };
            if landed {
                body.velocity.z = 0.0;
                return PhysOutcome::handoff(MovementMode::Walking, remaining, iterations);
            }
        }
        PhysOutcome::Done
    }
}
