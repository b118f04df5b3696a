//! Movement-mode controller extended with wall running.
//!
//! [`WallRunMovement`] owns the discrete mode of one body, the tracked wall
//! normal and the embedded stamina. Each simulated move runs
//! [`WallRunMovement::perform_move`]: jump input first, then the pre-move
//! state update (stamina, wall-run entry or forced exit), then the physics
//! dispatch over the closed set of modes.

mod base;
mod detector;
mod wall_run;

#[cfg(test)]
mod tests;

use glam::{Quat, Vec3};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::collision::{BodyId, Capsule, CollisionWork, CollisionWorld, QueryFilter};
use crate::config::{MovementConfig, StaminaSettings, WallRunSettings};
use crate::enable_gate::WallRunEnableTarget;
use crate::events::{
    EnableChanged, ModeChangeObservers, ModePredicate, MovementEvent, ObserverId, StaminaChanged,
};
use crate::mode::{MovementMode, WallRunStatus};
use crate::stamina::{StaminaResource, StaminaState};
use crate::vector_math::{is_nearly_zero, safe_normal_2d};
use crate::MIN_TICK_TIME;

pub use base::{is_walkable, BaseMovement, PhysOutcome, StandardMovement};
pub use wall_run::calc_delta_after_blocked;

/// Kinematic state of a simulated character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterBody {
    /// Identity used for self-ignoring collision queries.
    pub id: BodyId,
    /// Capsule centre.
    pub location: Vec3,
    /// Local axes are X forward, Y right and Z up.
    pub rotation: Quat,
    /// Velocity in cm/s.
    pub velocity: Vec3,
    /// Clamped input acceleration of the current move.
    pub acceleration: Vec3,
    /// Collision shape.
    pub capsule: Capsule,
    /// Bodies carried by this one; collision queries pass through them.
    pub attachments: Vec<BodyId>,
}

impl CharacterBody {
    /// Body at rest at `location` with the default capsule.
    #[must_use]
    pub fn new(id: BodyId, location: Vec3) -> Self {
        Self {
            id,
            location,
            rotation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            capsule: Capsule::default(),
            attachments: Vec::new(),
        }
    }

    /// Turns the body to face `yaw` radians about the Z axis.
    #[must_use]
    pub fn facing_yaw(mut self, yaw: f32) -> Self {
        self.rotation = Quat::from_rotation_z(yaw);
        self
    }

    /// Local Y axis in world space; wall probes to the right follow it.
    #[must_use]
    pub fn right_vector(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Filter ignoring this body and its attachments.
    #[must_use]
    pub fn query_filter(&self) -> QueryFilter {
        QueryFilter::ignoring(self.id, &self.attachments)
    }

    pub(crate) fn collision_work(&self, with_shape: bool) -> CollisionWork {
        CollisionWork::new(
            self.query_filter(),
            self.capsule,
            with_shape,
            self.location,
            self.right_vector(),
        )
    }
}

/// Player input for one move.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MoveInput {
    /// Requested acceleration in world space, clamped to the base
    /// simulator's maximum.
    pub acceleration: Vec3,
    /// Jump pressed this move.
    pub jump: bool,
}

/// Mode controller for one body.
#[derive(Debug)]
pub struct WallRunMovement<B = StandardMovement> {
    owner: BodyId,
    base: B,
    settings: WallRunSettings,
    mode: MovementMode,
    wall_normal: Vec3,
    stamina: StaminaResource,
    wall_run_enabled: bool,
    observers: ModeChangeObservers,
    events: Vec<MovementEvent>,
}

impl<B: BaseMovement> WallRunMovement<B> {
    /// Creates a falling controller with full stamina.
    #[must_use]
    pub fn new(owner: BodyId, base: B, config: MovementConfig) -> Self {
        Self {
            owner,
            base,
            settings: config.wall_run,
            mode: MovementMode::Falling,
            wall_normal: Vec3::ZERO,
            stamina: StaminaResource::new(config.stamina),
            wall_run_enabled: true,
            observers: ModeChangeObservers::default(),
            events: Vec::new(),
        }
    }

    /// Body this controller moves; instigator of its events.
    #[must_use]
    pub const fn owner(&self) -> BodyId {
        self.owner
    }

    /// Underlying walking and falling simulator.
    #[must_use]
    pub const fn base(&self) -> &B {
        &self.base
    }

    /// Wall-run tuning.
    #[must_use]
    pub const fn settings(&self) -> &WallRunSettings {
        &self.settings
    }

    /// Current movement mode.
    #[must_use]
    pub const fn mode(&self) -> MovementMode {
        self.mode
    }

    /// Which side the wall is on, if wall-running.
    #[must_use]
    pub fn wall_run_status(&self) -> WallRunStatus {
        WallRunStatus::from(self.mode)
    }

    /// Outward normal of the tracked wall; zero unless wall-running.
    #[must_use]
    pub const fn wall_run_normal(&self) -> Vec3 {
        self.wall_normal
    }

    /// Wall running is allowed unless stamina overheated or the ability
    /// was switched off.
    #[must_use]
    pub const fn is_wall_run_enabled(&self) -> bool {
        self.wall_run_enabled && self.stamina.is_enabled()
    }

    /// Embedded stamina.
    #[must_use]
    pub const fn stamina(&self) -> &StaminaResource {
        &self.stamina
    }

    /// Stamina tuning.
    #[must_use]
    pub const fn stamina_settings(&self) -> &StaminaSettings {
        self.stamina.settings()
    }

    /// Replaces the live stamina values without emitting notifications.
    pub const fn restore_stamina(&mut self, state: StaminaState) {
        self.stamina.restore(state);
    }

    /// Overwrites the mode and tracked normal without running any hooks.
    /// Used when rewinding to a server-corrected or recorded state.
    pub const fn restore_mode(&mut self, mode: MovementMode, wall_normal: Vec3) {
        self.mode = mode;
        self.wall_normal = if mode.is_wall_run() {
            wall_normal
        } else {
            Vec3::ZERO
        };
    }

    /// Registers a mode-change observer. Without a predicate it fires on
    /// every change with payload 0; a one-shot observer is removed after it
    /// first fires.
    pub fn register_mode_observer(
        &mut self,
        predicate: Option<ModePredicate>,
        once: bool,
    ) -> ObserverId {
        self.observers.register(predicate, once)
    }

    /// Removes an observer. Returns whether it was still registered.
    pub fn unregister_mode_observer(&mut self, id: ObserverId) -> bool {
        self.observers.unregister(id)
    }

    /// Events queued since the last drain, oldest first.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, MovementEvent> {
        self.events.drain(..)
    }

    fn flush_stamina(&mut self) {
        let owner = self.owner;
        let notifications: Vec<_> = self.stamina.drain_notifications().collect();
        self.events.extend(
            notifications
                .into_iter()
                .map(|note| MovementEvent::Stamina(StaminaChanged::new(owner, note))),
        );
    }

    /// Switches mode, running the entry and exit hooks when it changes.
    pub fn set_movement_mode(
        &mut self,
        body: &CharacterBody,
        world: &dyn CollisionWorld,
        mode: MovementMode,
    ) {
        if self.mode == mode {
            return;
        }
        let previous = self.mode;
        self.mode = mode;
        self.on_movement_mode_changed(body, world, previous);
    }

    fn on_movement_mode_changed(
        &mut self,
        body: &CharacterBody,
        world: &dyn CollisionWorld,
        previous: MovementMode,
    ) {
        debug!("body {:?}: {previous:?} -> {:?}", self.owner, self.mode);
        let entering = self.mode.is_wall_run() && !previous.is_wall_run();
        let leaving = previous.is_wall_run() && !self.mode.is_wall_run();

        if entering {
            if let Some(side) = self.mode.wall_run_side() {
                if is_nearly_zero(self.wall_normal) {
                    let mut work = body.collision_work(false);
                    let scale = self.settings.wall_run_radius_scale_for_wall_scan_distance;
                    if work.line_trace_wall(world, side, scale) {
                        if let Some(hit) = work.hit {
                            self.wall_normal = hit.normal;
                        }
                    }
                }
            }
            self.stamina.on_status_changed(true);
        }
        if leaving {
            self.wall_normal = Vec3::ZERO;
            self.stamina.on_status_changed(false);
        }
        self.flush_stamina();

        let fired = self.observers.notify(self.owner, self.mode, previous);
        self.events
            .extend(fired.into_iter().map(MovementEvent::ModeChanged));
    }

    /// Speed cap of the current mode.
    #[must_use]
    pub fn max_speed(&self) -> f32 {
        if self.mode.is_wall_run() {
            self.settings.max_wall_run_speed
        } else {
            self.base.max_speed()
        }
    }

    /// Braking of the current mode; none while wall-running.
    #[must_use]
    pub fn max_braking_deceleration(&self) -> f32 {
        if self.mode.is_wall_run() {
            0.0
        } else {
            self.base.max_braking_deceleration(self.mode)
        }
    }

    /// A wall run can always be jumped off.
    #[must_use]
    pub fn can_attempt_jump(&self) -> bool {
        self.base.can_attempt_jump(self.mode) || self.mode.is_wall_run()
    }

    /// Jumps if allowed. A jump off a wall also pushes the body away from
    /// it along the wall's horizontal normal.
    pub fn do_jump(&mut self, body: &mut CharacterBody, world: &dyn CollisionWorld) -> bool {
        let status = self.wall_run_status();
        if !self.can_attempt_jump() {
            return false;
        }
        body.velocity.z = body.velocity.z.max(self.base.jump_z_velocity());
        self.set_movement_mode(body, world, MovementMode::Falling);

        if let Some(side) = status.side() {
            let mut work = body.collision_work(false);
            let scale = self.settings.wall_run_radius_scale_for_wall_scan_distance;
            if work.line_trace_wall(world, side, scale) {
                if let Some(hit) = work.hit {
                    let normal_2d = safe_normal_2d(hit.normal);
                    if !is_nearly_zero(normal_2d) {
                        body.velocity +=
                            normal_2d * self.settings.wall_run_jump_wall_normal_initial_velocity;
                    }
                }
            }
        }
        true
    }

    /// Per-move bookkeeping before physics: stamina, then wall-run entry
    /// from falling or a forced exit when the ability is disabled.
    pub fn update_state_before_movement(
        &mut self,
        body: &mut CharacterBody,
        world: &dyn CollisionWorld,
        dt: f32,
    ) {
        self.stamina.update(self.mode.is_wall_run(), dt);
        self.flush_stamina();

        if self.mode.is_falling() {
            self.try_wall_run(body, world);
        } else if self.mode.is_wall_run() && !self.is_wall_run_enabled() {
            self.set_movement_mode(body, world, MovementMode::Falling);
        }
    }

    /// Simulates one move of `dt` seconds.
    pub fn perform_move(
        &mut self,
        body: &mut CharacterBody,
        world: &dyn CollisionWorld,
        input: &MoveInput,
        dt: f32,
    ) {
        body.acceleration = input
            .acceleration
            .clamp_length_max(self.base.max_acceleration());
        if input.jump {
            self.do_jump(body, world);
        }
        self.update_state_before_movement(body, world, dt);
        self.start_new_physics(body, world, dt, 0);
    }

    /// Runs the physics of the current mode, following hand-offs until the
    /// time is consumed or the iteration budget is spent.
    pub fn start_new_physics(
        &mut self,
        body: &mut CharacterBody,
        world: &dyn CollisionWorld,
        delta_time: f32,
        mut iterations: u32,
    ) {
        let mut remaining = delta_time;
        while remaining >= MIN_TICK_TIME && iterations < self.base.max_iterations() {
            let outcome = match self.mode {
                MovementMode::Walking => self.base.phys_walking(world, body, remaining, iterations),
                MovementMode::Falling => self.base.phys_falling(world, body, remaining, iterations),
                MovementMode::WallRun(_) => self.phys_wall_run(body, world, remaining, iterations),
            };
            let PhysOutcome::Handoff {
                mode,
                remaining: left,
                iterations: used,
            } = outcome
            else {
                break;
            };
            if mode == self.mode {
                break;
            }
            self.set_movement_mode(body, world, mode);
            remaining = left;
            iterations = used;
        }
    }
}

impl<B: BaseMovement> WallRunEnableTarget for WallRunMovement<B> {
    fn wall_run_enable_flag(&self) -> bool {
        self.wall_run_enabled
    }

    fn set_wall_run_enable_flag(&mut self, enabled: bool) -> bool {
        let changed = self.wall_run_enabled != enabled;
        self.wall_run_enabled = enabled;
        changed
    }

    fn announce_enable_changed(&mut self, enabled: bool) {
        self.events.push(MovementEvent::EnableChanged(EnableChanged {
            instigator: self.owner,
            enabled,
        }));
    }
}
