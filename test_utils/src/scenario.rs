//! World, body and controller builders for the wall-run scenarios.

use std::f32::consts::FRAC_PI_2;

use glam::Vec3;
use wallrun::{
    Block, BlockWorld, BodyId, CharacterBody, MoveInput, MovementConfig, StandardMovement,
    WallRunMovement,
};

pub const RUNNER_ID: BodyId = BodyId(1);
/// Simulation step used by the scenarios.
pub const STEP: f32 = 1.0 / 60.0;

/// Floor with its top at z = 0 and a wall whose face is the plane x = 100,
/// reaching up to z = 5000.
#[must_use]
pub fn scenario_world() -> BlockWorld {
    BlockWorld::new()
        .with_block(Block::new(
            Vec3::new(-10_000.0, -10_000.0, -100.0),
            Vec3::new(10_000.0, 10_000.0, 0.0),
        ))
        .with_block(Block::new(
            Vec3::new(100.0, -10_000.0, 0.0),
            Vec3::new(120.0, 10_000.0, 5000.0),
        ))
}

/// Body falling beside the wall at height `z`, facing -Y so the wall is on
/// its right, moving into the wall and along it.
#[must_use]
pub fn wall_side_body(z: f32) -> CharacterBody {
    let mut body = CharacterBody::new(RUNNER_ID, Vec3::new(30.0, 0.0, z)).facing_yaw(-FRAC_PI_2);
    body.velocity = Vec3::new(300.0, -300.0, -100.0);
    body
}

/// Body falling in open air, out of reach of the wall.
#[must_use]
pub fn airborne_body(z: f32) -> CharacterBody {
    CharacterBody::new(RUNNER_ID, Vec3::new(-2000.0, 0.0, z))
}

#[must_use]
pub fn controller() -> WallRunMovement {
    controller_with(MovementConfig::default())
}

#[must_use]
pub fn controller_with(config: MovementConfig) -> WallRunMovement {
    WallRunMovement::new(RUNNER_ID, StandardMovement::default(), config)
}

/// Performs `count` moves with the same input.
pub fn run_moves(
    movement: &mut WallRunMovement,
    body: &mut CharacterBody,
    world: &BlockWorld,
    input: MoveInput,
    dt: f32,
    count: usize,
) {
    for _ in 0..count {
        movement.perform_move(body, world, &input, dt);
    }
}
