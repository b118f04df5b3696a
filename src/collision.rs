//! Collision queries issued by the wall-run code.
//!
//! [`CollisionWorld`] is the boundary to whatever owns the world geometry.
//! [`CollisionWork`] bundles the per-tick inputs of a probing session and
//! records the most recent hit so callers can inspect it after a query.

use glam::Vec3;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::mode::WallRunSide;
use crate::vector_math::{is_nearly_zero, is_nearly_zero_scalar};

/// Identifier of a simulated body or one of its attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct BodyId(pub u64);

impl From<u64> for BodyId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Collision capsule, aligned with the world Z axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Capsule {
    /// Radius of the cylinder and its caps.
    pub radius: f32,
    /// Half the total height, including the hemispherical caps.
    pub half_height: f32,
}

impl Default for Capsule {
    fn default() -> Self {
        Self {
            radius: crate::DEFAULT_CAPSULE_RADIUS,
            half_height: crate::DEFAULT_CAPSULE_HALF_HEIGHT,
        }
    }
}

/// Bodies a query must pass through, typically the mover and its attachments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilter {
    ignored: Vec<BodyId>,
}

impl QueryFilter {
    /// Builds a filter ignoring `owner` and every id in `attachments`.
    #[must_use]
    pub fn ignoring(owner: BodyId, attachments: &[BodyId]) -> Self {
        let mut ignored = Vec::with_capacity(attachments.len() + 1);
        ignored.push(owner);
        ignored.extend_from_slice(attachments);
        Self { ignored }
    }

    /// Whether geometry owned by `id` is skipped.
    #[must_use]
    pub fn is_ignored(&self, id: BodyId) -> bool {
        self.ignored.contains(&id)
    }
}

/// First blocking contact reported by a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitResult {
    /// Fraction of the query path travelled before contact, in `[0, 1]`.
    pub time: f32,
    /// Location of the query origin (ray point or capsule centre) at contact.
    pub location: Vec3,
    /// Point on the blocking surface that was touched.
    pub impact_point: Vec3,
    /// Outward surface normal at the contact.
    pub normal: Vec3,
    /// The query began inside the blocking geometry.
    pub start_penetrating: bool,
}

impl HitResult {
    /// A hit that did not start inside the geometry.
    #[must_use]
    pub const fn is_valid_blocking_hit(&self) -> bool {
        !self.start_penetrating
    }
}

/// World geometry queried by the movement code.
///
/// Both queries return `None` when nothing blocks the path; that is an
/// ordinary negative answer, not a failure.
#[cfg_attr(test, mockall::automock)]
pub trait CollisionWorld {
    /// Casts a ray from `start` to `end`.
    fn line_trace(&self, start: Vec3, end: Vec3, filter: &QueryFilter) -> Option<HitResult>;

    /// Sweeps `capsule` with its centre moving from `start` to `end`.
    fn sweep_capsule(
        &self,
        start: Vec3,
        end: Vec3,
        capsule: Capsule,
        filter: &QueryFilter,
    ) -> Option<HitResult>;
}

/// Working set for one probing session.
///
/// The filter and shape are fixed for the session; location and right
/// vector are refreshed after each move; `hit` holds the outcome of the
/// most recent query.
#[derive(Debug, Clone)]
pub struct CollisionWork {
    filter: QueryFilter,
    shape: Option<Capsule>,
    radius: f32,
    half_height: f32,
    /// Query origin, the body's capsule centre.
    pub location: Vec3,
    /// Body's right vector, the direction of right-side wall probes.
    pub right_vector: Vec3,
    /// Outcome of the most recent query.
    pub hit: Option<HitResult>,
}

impl CollisionWork {
    /// Starts a session. Sweeps need `with_shape`; ray-only sessions skip it.
    #[must_use]
    pub fn new(
        filter: QueryFilter,
        capsule: Capsule,
        with_shape: bool,
        location: Vec3,
        right_vector: Vec3,
    ) -> Self {
        Self {
            filter,
            shape: with_shape.then_some(capsule),
            radius: capsule.radius,
            half_height: capsule.half_height,
            location,
            right_vector,
            hit: None,
        }
    }

    /// Capsule radius of the session.
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Capsule half height of the session.
    #[must_use]
    pub const fn half_height(&self) -> f32 {
        self.half_height
    }

    /// Updates the per-substep fields after the body moved.
    pub const fn refresh(&mut self, location: Vec3, right_vector: Vec3) {
        self.location = location;
        self.right_vector = right_vector;
    }

    /// Casts a ray from the current location along `to_end`.
    pub fn line_trace(&mut self, world: &dyn CollisionWorld, to_end: Vec3) -> bool {
        if is_nearly_zero(to_end) {
            self.hit = None;
            return false;
        }
        self.hit = world.line_trace(self.location, self.location + to_end, &self.filter);
        self.hit.is_some()
    }

    /// Sweeps the session capsule from the current location along `to_end`.
    pub fn sweep(&mut self, world: &dyn CollisionWorld, to_end: Vec3) -> bool {
        let Some(shape) = self.shape else {
            self.hit = None;
            return false;
        };
        if is_nearly_zero(to_end) {
            self.hit = None;
            return false;
        }
        self.hit = world.sweep_capsule(self.location, self.location + to_end, shape, &self.filter);
        self.hit.is_some()
    }

    /// Looks for ground within half-height plus half the minimum wall-run
    /// height below the body.
    pub fn line_trace_floor(&mut self, world: &dyn CollisionWorld, min_wall_run_height: f32) -> bool {
        let distance = self.half_height + min_wall_run_height * 0.5;
        if is_nearly_zero_scalar(distance) {
            self.hit = None;
            return false;
        }
        let found = self.line_trace(world, Vec3::NEG_Z * distance);
        trace!("floor probe over {distance:.2}: {found}");
        found
    }

    /// Signed scan distance along the right vector for `side`.
    #[must_use]
    pub const fn wall_scan_distance(&self, side: WallRunSide, radius_scale: f32) -> f32 {
        if is_nearly_zero_scalar(self.radius) {
            return 0.0;
        }
        self.radius * radius_scale * side.sign()
    }

    /// Casts a ray toward the wall on `side`.
    pub fn line_trace_wall(
        &mut self,
        world: &dyn CollisionWorld,
        side: WallRunSide,
        radius_scale: f32,
    ) -> bool {
        let distance = self.wall_scan_distance(side, radius_scale);
        if is_nearly_zero_scalar(distance) {
            self.hit = None;
            return false;
        }
        let found = self.line_trace(world, self.right_vector * distance);
        trace!("wall ray {side:?} over {distance:.2}: {found}");
        found
    }

    /// Sweeps the capsule toward the wall on `side`.
    pub fn sweep_wall(
        &mut self,
        world: &dyn CollisionWorld,
        side: WallRunSide,
        radius_scale: f32,
    ) -> bool {
        let distance = self.wall_scan_distance(side, radius_scale);
        if is_nearly_zero_scalar(distance) {
            self.hit = None;
            return false;
        }
        let found = self.sweep(world, self.right_vector * distance);
        trace!("wall sweep {side:?} over {distance:.2}: {found}");
        found
    }
}
