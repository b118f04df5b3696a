//! Bevy plugin wiring wall runners into the schedule.

use bevy::ecs::prelude::On;
use bevy::prelude::*;
use log::error;
use thiserror::Error;

use crate::components::{CollisionScene, SimulationStep};

use super::systems::{apply_enable_request, deliver_gate_rpc};
use super::{step_runners_system, GateOutbox};

/// Context carried by [`WallRunSyncError`] events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallRunSyncErrorContext {
    /// The simulation step resource is unusable.
    Config,
    /// A runner's move produced an invalid state and was rolled back.
    Step,
    /// An enable request or RPC named an entity without a runner.
    Gate,
}

/// Event raised when the ECS integration hits an error path.
#[derive(Event, Debug, Clone, Error)]
#[error("{context:?}: {detail}")]
pub struct WallRunSyncError {
    /// Where the error arose.
    pub context: WallRunSyncErrorContext,
    /// Human-readable description.
    pub detail: String,
}

impl WallRunSyncError {
    /// Builds an error for `context`.
    #[must_use]
    pub fn new(context: WallRunSyncErrorContext, detail: impl Into<String>) -> Self {
        Self {
            context,
            detail: detail.into(),
        }
    }
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value for Events V2."
)]
fn log_sync_error(event: On<WallRunSyncError>) {
    let WallRunSyncError { context, detail } = event.event();
    error!("wall-run sync error during {context:?}: {detail}");
}

/// Steps every [`WallRunner`](crate::components::WallRunner) at a fixed
/// rate during `Update` and re-triggers its movement events.
#[derive(Default)]
pub struct WallRunPlugin;

impl Plugin for WallRunPlugin {
    fn build(&self, app: &mut App) {
        app.add_observer(log_sync_error);
        app.add_observer(apply_enable_request);
        app.add_observer(deliver_gate_rpc);

        app.init_resource::<CollisionScene>();
        app.init_resource::<SimulationStep>();
        app.init_resource::<GateOutbox>();

        app.add_systems(Update, step_runners_system);
    }
}
