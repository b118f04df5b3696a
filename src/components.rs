//! ECS components and resources driving wall runners inside a Bevy app.

use bevy::prelude::*;

use crate::collision::BodyId;
use crate::enable_gate::{EnableGate, NetRole};
use crate::movement::{CharacterBody, MoveInput, WallRunMovement};
use crate::world::BlockWorld;
use crate::DEFAULT_SIMULATION_STEP;

/// A simulated character: its mode controller plus kinematic body.
#[derive(Component, Debug)]
pub struct WallRunner {
    /// Mode controller, stamina included.
    pub movement: WallRunMovement,
    /// Kinematic state mirrored onto the entity's `Transform`.
    pub body: CharacterBody,
}

impl WallRunner {
    /// Pairs a controller with the body it moves.
    #[must_use]
    pub const fn new(movement: WallRunMovement, body: CharacterBody) -> Self {
        Self { movement, body }
    }

    /// Identity of the simulated body.
    #[must_use]
    pub const fn id(&self) -> BodyId {
        self.body.id
    }
}

/// Input applied on the next simulation step. `jump` is consumed by the
/// first step that sees it.
#[derive(Component, Debug, Clone, Copy, Default, Deref, DerefMut)]
pub struct RunnerInput(pub MoveInput);

/// Network arbitration for a runner's enabled flag. Runners without one
/// behave as a locally controlled authority.
#[derive(Component, Debug, Clone, Copy, Deref)]
pub struct RunnerGate(pub EnableGate);

impl Default for RunnerGate {
    fn default() -> Self {
        Self(EnableGate::new(NetRole::Authority, true))
    }
}

/// Static geometry every runner collides with.
#[derive(Resource, Debug, Clone, Default, Deref, DerefMut)]
pub struct CollisionScene(pub BlockWorld);

/// Fixed simulation step and the frame time not yet simulated.
#[derive(Resource, Debug, Clone, Copy)]
pub struct SimulationStep {
    /// Seconds per step; must be positive.
    pub seconds: f32,
    /// Most steps taken in a single frame; leftover time is dropped.
    pub max_steps_per_frame: u32,
    /// Frame time carried over to the next frame.
    pub accumulated: f32,
}

impl Default for SimulationStep {
    fn default() -> Self {
        Self {
            seconds: DEFAULT_SIMULATION_STEP,
            max_steps_per_frame: 4,
            accumulated: 0.0,
        }
    }
}
