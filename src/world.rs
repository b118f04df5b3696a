//! In-memory block world used by the demo binary, the ECS plugin and tests.
//!
//! Geometry is a list of axis-aligned blocks. Ray casts use the slab
//! method; capsule sweeps cast the capsule centre against each block grown
//! by the capsule's radius (horizontally) and half-height (vertically).

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::collision::{BodyId, Capsule, CollisionWorld, HitResult, QueryFilter};

/// Solid axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Lowest corner.
    pub min: Vec3,
    /// Highest corner.
    pub max: Vec3,
    /// Body the block belongs to, if any. Queries ignoring that body pass
    /// through the block.
    pub owner: Option<BodyId>,
}

impl Block {
    /// Creates a static block spanning `min` to `max`.
    ///
    /// # Examples
    /// ```
    /// use glam::Vec3;
    /// use wallrun::world::Block;
    /// let block = Block::new(Vec3::ZERO, Vec3::splat(2.0));
    /// assert!(block.contains(Vec3::ONE));
    /// ```
    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
            owner: None,
        }
    }

    /// Marks the block as part of `owner`.
    #[must_use]
    pub const fn owned_by(mut self, owner: BodyId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Whether `point` lies inside or on the surface.
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    fn expanded(&self, extents: Vec3) -> Self {
        Self {
            min: self.min - extents,
            max: self.max + extents,
            owner: self.owner,
        }
    }
}

/// Entry of a segment into a box.
struct SlabHit {
    time: f32,
    normal: Vec3,
    inside: bool,
}

const AXES: [Vec3; 3] = [Vec3::X, Vec3::Y, Vec3::Z];

/// Intersects the segment `start + t * delta`, `t ∈ [0, 1]`, with `block`.
fn intersect_segment(block: &Block, start: Vec3, delta: Vec3) -> Option<SlabHit> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut normal = Vec3::ZERO;

    for unit in AXES {
        let origin = start.dot(unit);
        let direction = delta.dot(unit);
        let (lo, hi) = (block.min.dot(unit), block.max.dot(unit));
        if direction.abs() <= f32::EPSILON {
            if origin < lo || origin > hi {
                return None;
            }
            continue;
        }
        let inv = direction.recip();
        let t_lo = (lo - origin) * inv;
        let t_hi = (hi - origin) * inv;
        let (near, far, face) = if t_lo < t_hi {
            (t_lo, t_hi, -unit)
        } else {
            (t_hi, t_lo, unit)
        };
        if near > t_enter {
            t_enter = near;
            normal = face;
        }
        t_exit = t_exit.min(far);
        if t_enter > t_exit {
            return None;
        }
    }

    if t_exit < 0.0 || t_enter > 1.0 {
        return None;
    }
    if t_enter < 0.0 {
        return Some(SlabHit {
            time: 0.0,
            normal: penetration_normal(block, start),
            inside: true,
        });
    }
    Some(SlabHit {
        time: t_enter,
        normal,
        inside: false,
    })
}

/// Outward normal of the face closest to a point inside `block`.
fn penetration_normal(block: &Block, point: Vec3) -> Vec3 {
    let mut best = f32::INFINITY;
    let mut normal = Vec3::Z;
    for unit in AXES {
        let to_min = (point - block.min).dot(unit);
        let to_max = (block.max - point).dot(unit);
        if to_min < best {
            best = to_min;
            normal = -unit;
        }
        if to_max < best {
            best = to_max;
            normal = unit;
        }
    }
    normal
}

/// Static collection of blocks answering [`CollisionWorld`] queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockWorld {
    blocks: Vec<Block>,
}

impl BlockWorld {
    /// Empty world.
    #[must_use]
    pub const fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    /// Adds `block`.
    #[must_use]
    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    /// Every block, in insertion order.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    fn earliest_hit<F>(&self, filter: &QueryFilter, mut probe: F) -> Option<HitResult>
    where
        F: FnMut(&Block) -> Option<HitResult>,
    {
        self.blocks
            .iter()
            .filter(|block| block.owner.is_none_or(|owner| !filter.is_ignored(owner)))
            .filter_map(|block| probe(block))
            .min_by(|a, b| a.time.total_cmp(&b.time))
    }
}

impl CollisionWorld for BlockWorld {
    fn line_trace(&self, start: Vec3, end: Vec3, filter: &QueryFilter) -> Option<HitResult> {
        let delta = end - start;
        self.earliest_hit(filter, |block| {
            let hit = intersect_segment(block, start, delta)?;
            // Rays starting inside geometry report nothing, as solid
            // interiors are not traced from within.
            if hit.inside {
                return None;
            }
            let location = start + delta * hit.time;
            Some(HitResult {
                time: hit.time,
                location,
                impact_point: location,
                normal: hit.normal,
                start_penetrating: false,
            })
        })
    }

    fn sweep_capsule(
        &self,
        start: Vec3,
        end: Vec3,
        capsule: Capsule,
        filter: &QueryFilter,
    ) -> Option<HitResult> {
        let delta = end - start;
        let extents = Vec3::new(capsule.radius, capsule.radius, capsule.half_height);
        self.earliest_hit(filter, |block| {
            let hit = intersect_segment(&block.expanded(extents), start, delta)?;
            let location = start + delta * hit.time;
            Some(HitResult {
                time: hit.time,
                location,
                impact_point: location - hit.normal * (extents * hit.normal.abs()).max_element(),
                normal: hit.normal,
                start_penetrating: hit.inside,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::{fixture, rstest};

    /// A wall occupying x ∈ [100, 120] and a floor below z = 0.
    #[fixture]
    fn world() -> BlockWorld {
        BlockWorld::new()
            .with_block(Block::new(
                Vec3::new(100.0, -1000.0, -1000.0),
                Vec3::new(120.0, 1000.0, 1000.0),
            ))
            .with_block(Block::new(
                Vec3::new(-1000.0, -1000.0, -100.0),
                Vec3::new(1000.0, 1000.0, 0.0),
            ))
    }

    #[rstest]
    fn ray_reports_entry_face_normal(world: BlockWorld) {
        let hit = world
            .line_trace(
                Vec3::new(0.0, 0.0, 500.0),
                Vec3::new(200.0, 0.0, 500.0),
                &QueryFilter::default(),
            )
            .expect("wall should be hit");
        assert_relative_eq!(hit.time, 0.5);
        assert_eq!(hit.normal, Vec3::NEG_X);
        assert_relative_eq!(hit.location.x, 100.0);
    }

    #[rstest]
    fn ray_short_of_geometry_misses(world: BlockWorld) {
        let hit = world.line_trace(
            Vec3::new(0.0, 0.0, 500.0),
            Vec3::new(80.0, 0.0, 500.0),
            &QueryFilter::default(),
        );
        assert!(hit.is_none());
    }

    #[rstest]
    fn nearest_block_wins(world: BlockWorld) {
        let hit = world
            .line_trace(
                Vec3::new(50.0, 0.0, 50.0),
                Vec3::new(120.0, 0.0, -50.0),
                &QueryFilter::default(),
            )
            .expect("floor or wall should be hit");
        assert_eq!(hit.normal, Vec3::Z);
    }

    #[rstest]
    fn capsule_sweep_stops_a_radius_short(world: BlockWorld) {
        let capsule = Capsule {
            radius: 40.0,
            half_height: 90.0,
        };
        let hit = world
            .sweep_capsule(
                Vec3::new(0.0, 0.0, 500.0),
                Vec3::new(100.0, 0.0, 500.0),
                capsule,
                &QueryFilter::default(),
            )
            .expect("wall should block the capsule");
        assert_relative_eq!(hit.location.x, 60.0);
        assert_relative_eq!(hit.impact_point.x, 100.0);
        assert!(hit.is_valid_blocking_hit());
    }

    #[rstest]
    fn sweep_starting_inside_reports_penetration(world: BlockWorld) {
        let hit = world
            .sweep_capsule(
                Vec3::new(0.0, 0.0, 50.0),
                Vec3::new(10.0, 0.0, 50.0),
                Capsule::default(),
                &QueryFilter::default(),
            )
            .expect("capsule overlaps the floor");
        assert!(hit.start_penetrating);
        assert_eq!(hit.normal, Vec3::Z);
    }

    #[rstest]
    fn owned_blocks_are_skipped_by_their_owner() {
        let world = BlockWorld::new().with_block(
            Block::new(Vec3::splat(-10.0), Vec3::splat(10.0)).owned_by(BodyId(7)),
        );
        let start = Vec3::new(-50.0, 0.0, 0.0);
        let end = Vec3::new(50.0, 0.0, 0.0);
        assert!(world
            .line_trace(start, end, &QueryFilter::ignoring(BodyId(7), &[]))
            .is_none());
        assert!(world.line_trace(start, end, &QueryFilter::default()).is_some());
    }
}
