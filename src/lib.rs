//! Wall-run locomotion with predicted stamina.
//!
//! A character that falls beside a wall while moving fast enough sticks to
//! it and runs along it under reduced gravity until it slows down, pulls
//! away, reaches the ground, jumps off, or runs out of stamina. The
//! controller is deterministic so a predicting client can replay its moves
//! after a server correction.
pub mod collision;
pub mod components;
pub mod config;
pub mod constants;
pub mod enable_gate;
pub mod events;
pub mod logging;
pub mod mode;
pub mod movement;
pub mod prediction;
pub mod runner_sync;
pub mod stamina;
pub mod vector_math;
pub mod world;
pub use constants::*;

// Re-export commonly used items
pub use collision::{BodyId, Capsule, CollisionWorld, HitResult, QueryFilter};
pub use components::{CollisionScene, RunnerGate, RunnerInput, SimulationStep, WallRunner};
pub use config::{ConfigError, GravityScaleCurve, MovementConfig, StaminaSettings, WallRunSettings};
pub use enable_gate::{EnableGate, GateRpc, NetRole, WallRunEnableTarget};
pub use events::{EnableChanged, ModeChanged, MovementEvent, ObserverId, StaminaChanged};
pub use logging::init as init_logging;
pub use mode::{MovementMode, WallRunSide, WallRunStatus};
pub use movement::{
    BaseMovement, CharacterBody, MoveInput, PhysOutcome, StandardMovement, WallRunMovement,
};
pub use prediction::{
    merge, AuxSnapshot, BodySnapshot, MergeRejection, MoveId, PredictedMove, PredictionClient,
    ServerCorrection, ServerMove,
};
pub use runner_sync::{WallRunPlugin, WallRunSyncError, WallRunSyncErrorContext};
pub use stamina::{StaminaResource, StaminaState};
pub use world::{Block, BlockWorld};

pub mod prelude {
    //! Prelude exports used in documentation examples.
    //!
    //! ```rust,no_run
    //! use wallrun::prelude::*;
    //! ```

    pub use crate::BlockWorld;
    pub use crate::CharacterBody;
    pub use crate::MoveInput;
    pub use crate::MovementConfig;
    pub use crate::MovementMode;
    pub use crate::StandardMovement;
    pub use crate::WallRunMovement;
    pub use crate::WallRunPlugin;
    pub use glam::Vec3;
}
