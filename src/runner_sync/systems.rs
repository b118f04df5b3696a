//! Systems and observers stepping wall runners inside the ECS.

use bevy::ecs::prelude::On;
use bevy::prelude::*;
use log::{debug, trace};

use crate::components::{CollisionScene, RunnerGate, RunnerInput, SimulationStep, WallRunner};
use crate::enable_gate::GateRpc;
use crate::events::MovementEvent;
use crate::movement::WallRunMovement;
use crate::prediction::{AuxSnapshot, BodySnapshot};

use super::{GateOutbox, WallRunSyncError, WallRunSyncErrorContext};

type RunnerRow<'w> = (
    Entity,
    &'w mut WallRunner,
    Option<&'w mut RunnerInput>,
    Option<&'w mut Transform>,
);

/// Ability layer asks to switch a runner's wall running on or off.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestWallRunEnabled {
    /// Entity carrying the [`WallRunner`].
    pub runner: Entity,
    /// Requested flag value.
    pub enabled: bool,
}

/// The transport delivered a gate RPC addressed to `runner`.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateRpcReceived {
    /// Entity carrying the [`WallRunner`].
    pub runner: Entity,
    /// RPC as sent by the other side.
    pub rpc: GateRpc,
}

/// Re-triggers every queued movement event as a Bevy event.
pub(crate) fn forward_events(commands: &mut Commands, movement: &mut WallRunMovement) {
    for event in movement.drain_events() {
        match event {
            MovementEvent::ModeChanged(changed) => commands.trigger(changed),
            MovementEvent::Stamina(changed) => commands.trigger(changed),
            MovementEvent::EnableChanged(changed) => commands.trigger(changed),
        }
    }
}

/// Number of fixed steps owed this frame. Time beyond the per-frame cap is
/// discarded.
fn take_steps(step: &mut SimulationStep, frame_delta: f32) -> u32 {
    step.accumulated += frame_delta;
    let mut steps = 0;
    while step.accumulated >= step.seconds && steps < step.max_steps_per_frame {
        step.accumulated -= step.seconds;
        steps += 1;
    }
    if step.accumulated >= step.seconds {
        debug!("simulation fell behind; dropping {}s", step.accumulated);
        step.accumulated = 0.0;
    }
    steps
}

/// Advances every runner by the fixed steps owed and mirrors the result
/// onto its `Transform`.
pub fn step_runners_system(
    mut commands: Commands,
    time: Res<Time>,
    mut step: ResMut<SimulationStep>,
    scene: Res<CollisionScene>,
    mut runners: Query<RunnerRow<'_>>,
) {
    if !(step.seconds.is_finite() && step.seconds > 0.0) {
        commands.trigger(WallRunSyncError::new(
            WallRunSyncErrorContext::Config,
            format!("simulation step must be positive, got {}", step.seconds),
        ));
        step.accumulated = 0.0;
        return;
    }
    let steps = take_steps(&mut step, time.delta_secs());
    if steps == 0 {
        return;
    }
    let seconds = step.seconds;

    for (entity, mut runner, mut input, transform) in &mut runners {
        let WallRunner { movement, body } = &mut *runner;
        for _ in 0..steps {
            let move_input = input.as_deref().map(|held| held.0).unwrap_or_default();
            let start = BodySnapshot::capture(body, movement);
            let aux = AuxSnapshot::capture(movement);
            movement.perform_move(body, &scene.0, &move_input, seconds);
            if let Some(held) = input.as_mut() {
                held.jump = false;
            }

            if !(body.location.is_finite() && body.velocity.is_finite()) {
                drop(movement.drain_events());
                start.restore(body, movement);
                aux.restore(movement);
                commands.trigger(WallRunSyncError::new(
                    WallRunSyncErrorContext::Step,
                    format!("runner {entity:?} produced a non-finite state"),
                ));
                break;
            }
            forward_events(&mut commands, movement);
        }
        trace!("runner {entity:?} at {:?} in {:?}", body.location, movement.mode());

        if let Some(mut transform) = transform {
            transform.translation = body.location;
            transform.rotation = body.rotation;
        }
    }
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value for Events V2."
)]
pub(crate) fn apply_enable_request(
    event: On<RequestWallRunEnabled>,
    mut commands: Commands,
    mut runners: Query<(&mut WallRunner, Option<&RunnerGate>)>,
    mut outbox: ResMut<GateOutbox>,
) {
    let RequestWallRunEnabled { runner, enabled } = *event.event();
    let Ok((mut state, runner_gate)) = runners.get_mut(runner) else {
        commands.trigger(WallRunSyncError::new(
            WallRunSyncErrorContext::Gate,
            format!("enable request for {runner:?}, which is not a wall runner"),
        ));
        return;
    };
    let gate = runner_gate.copied().unwrap_or_default();
    if let Some(rpc) = gate.request_set_enabled(&mut state.movement, enabled) {
        outbox.push(runner, rpc);
    }
    forward_events(&mut commands, &mut state.movement);
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value for Events V2."
)]
pub(crate) fn deliver_gate_rpc(
    event: On<GateRpcReceived>,
    mut commands: Commands,
    mut runners: Query<(&mut WallRunner, Option<&RunnerGate>)>,
) {
    let GateRpcReceived { runner, rpc } = *event.event();
    let Ok((mut state, runner_gate)) = runners.get_mut(runner) else {
        commands.trigger(WallRunSyncError::new(
            WallRunSyncErrorContext::Gate,
            format!("{rpc:?} for {runner:?}, which is not a wall runner"),
        ));
        return;
    };
    let gate = runner_gate.copied().unwrap_or_default();
    match rpc {
        GateRpc::ClientSetEnabled(enabled) => gate.client_set_enabled(&mut state.movement, enabled),
        GateRpc::ServerSetEnabled(enabled) => {
            gate.server_set_enabled(&mut state.movement, enabled);
        }
    }
    forward_events(&mut commands, &mut state.movement);
}
