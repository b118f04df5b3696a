//! Bevy app harness for the wall-run plugin.

use bevy::ecs::prelude::On;
use bevy::prelude::*;
use wallrun::{
    CollisionScene, EnableChanged, StaminaChanged, WallRunPlugin, WallRunSyncError,
};

use crate::scenario::scenario_world;

/// Events observed while the app ran.
#[derive(Resource, Default, Debug)]
pub struct CapturedEvents {
    pub stamina: Vec<StaminaChanged>,
    pub enabled: Vec<EnableChanged>,
    pub errors: Vec<String>,
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must take On<T> by value."
)]
fn record_stamina(event: On<StaminaChanged>, mut captured: ResMut<CapturedEvents>) {
    captured.stamina.push(*event.event());
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must take On<T> by value."
)]
fn record_enabled(event: On<EnableChanged>, mut captured: ResMut<CapturedEvents>) {
    captured.enabled.push(*event.event());
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must take On<T> by value."
)]
fn record_error(event: On<WallRunSyncError>, mut captured: ResMut<CapturedEvents>) {
    captured.errors.push(event.event().to_string());
}

/// Installs the capturing observers and resource on `app`.
pub fn capture_events(app: &mut App) {
    app.init_resource::<CapturedEvents>();
    app.add_observer(record_stamina);
    app.add_observer(record_enabled);
    app.add_observer(record_error);
}

/// Minimal app with the plugin, the scenario world and event capture.
#[must_use]
pub fn runner_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    capture_events(&mut app);
    app.insert_resource(CollisionScene(scenario_world()));
    app.add_plugins(WallRunPlugin);
    app
}
