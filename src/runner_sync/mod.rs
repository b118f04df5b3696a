//! Bevy integration for wall runners.
//!
//! [`WallRunPlugin`] steps every
//! [`WallRunner`](crate::components::WallRunner) at a fixed rate, mirrors
//! its body onto `Transform`, and re-triggers the movement events it queued
//! as Bevy events. Enable requests and delivered gate RPCs arrive as
//! triggered events; RPCs to send are collected in [`GateOutbox`].

mod gate_outbox;
mod plugin;
mod systems;

pub use gate_outbox::GateOutbox;
pub use plugin::{WallRunPlugin, WallRunSyncError, WallRunSyncErrorContext};
pub use systems::{step_runners_system, GateRpcReceived, RequestWallRunEnabled};
