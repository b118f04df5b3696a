//! Stamina gating the wall-run ability.
//!
//! Stamina drains linearly while the ability is in use, starts a cooldown
//! when it runs out (overheat), and refills linearly once the cooldown has
//! elapsed. Values are recomputed from a base value and an accumulated
//! elapsed time rather than integrated step by step, so replaying the same
//! sequence of updates from a restored [`StaminaState`] is exact.

use serde::{Deserialize, Serialize};

use crate::config::StaminaSettings;
use crate::vector_math::is_nearly_zero_scalar;

/// Predicted stamina values. Snapshotted into every predicted move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct StaminaState {
    /// Value now.
    pub current_value: f32,
    /// Value at the start of the current consume or recover phase.
    pub base_value: f32,
    /// Seconds spent in the current consume or recover phase.
    pub total_elapsed: f32,
    /// Seconds until recovery may begin.
    pub cooldown_remaining: f32,
    /// Length of the current cooldown.
    pub cooldown_base: f32,
    /// Seconds spent in the current cooldown.
    pub cooldown_elapsed: f32,
    /// Stamina ran out and has not fully recovered.
    pub overheat: bool,
}

impl StaminaState {
    /// Full stamina with no timers running.
    #[must_use]
    pub const fn at_max(max_value: f32) -> Self {
        Self {
            current_value: max_value,
            base_value: max_value,
            total_elapsed: 0.0,
            cooldown_remaining: 0.0,
            cooldown_base: 0.0,
            cooldown_elapsed: 0.0,
            overheat: false,
        }
    }

    /// Recovery is held back by a running cooldown.
    #[must_use]
    pub const fn is_cooling_down(&self) -> bool {
        self.cooldown_remaining != 0.0
    }
}

/// Payload describing how stamina evolves from now on.
///
/// `add_value_per_second` is the current slope and `duration` how long it
/// lasts before the value stops changing; both are zero when the value is
/// fixed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaminaNotification {
    /// Value now.
    pub current_value: f32,
    /// Current slope.
    pub add_value_per_second: f32,
    /// Seconds the slope lasts.
    pub duration: f32,
    /// Exhaustion or a full recovery from overheat.
    pub finished: bool,
}

impl StaminaNotification {
    const fn fixed(current_value: f32, finished: bool) -> Self {
        Self {
            current_value,
            add_value_per_second: 0.0,
            duration: 0.0,
            finished,
        }
    }

    const fn sloped(current_value: f32, add_value_per_second: f32, remaining: f32) -> Self {
        let duration = if is_nearly_zero_scalar(add_value_per_second) {
            0.0
        } else {
            remaining / add_value_per_second
        };
        Self {
            current_value,
            add_value_per_second,
            duration,
            finished: false,
        }
    }
}

/// Consume/cooldown/recover/overheat state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct StaminaResource {
    settings: StaminaSettings,
    state: StaminaState,
    outbox: Vec<StaminaNotification>,
}

impl StaminaResource {
    /// Creates a full resource.
    #[must_use]
    pub fn new(settings: StaminaSettings) -> Self {
        Self {
            state: StaminaState::at_max(settings.max_value),
            settings,
            outbox: Vec::new(),
        }
    }

    /// Tuning in use.
    #[must_use]
    pub const fn settings(&self) -> &StaminaSettings {
        &self.settings
    }

    /// Copy of the live values.
    #[must_use]
    pub const fn state(&self) -> StaminaState {
        self.state
    }

    /// Replaces the live values, e.g. from a predicted-move snapshot.
    pub const fn restore(&mut self, state: StaminaState) {
        self.state = state;
    }

    /// The ability is usable unless stamina overheated.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        !self.state.overheat
    }

    /// Notifications produced since the last drain, oldest first.
    pub fn drain_notifications(&mut self) -> std::vec::Drain<'_, StaminaNotification> {
        self.outbox.drain(..)
    }

    const fn recover_rate(&self) -> f32 {
        if self.state.overheat {
            self.settings.recover_overheat_rate
        } else {
            self.settings.recover_default_rate
        }
    }

    /// Advances the state machine by `dt` seconds.
    pub fn update(&mut self, consuming: bool, dt: f32) {
        let settings = self.settings;

        if self.state.is_cooling_down() {
            self.state.cooldown_elapsed += dt;
            self.state.cooldown_remaining =
                (self.state.cooldown_base - self.state.cooldown_elapsed).max(0.0);
            if self.state.cooldown_remaining == 0.0 {
                self.state.cooldown_elapsed = 0.0;
                let rate = self.recover_rate();
                self.outbox.push(StaminaNotification::sloped(
                    self.state.current_value,
                    rate,
                    settings.max_value - self.state.current_value,
                ));
            }
        }

        if consuming {
            if self.state.current_value > settings.min_value {
                self.state.total_elapsed += dt;
                self.state.current_value = (self.state.base_value
                    - self.state.total_elapsed * settings.consume_rate)
                    .max(settings.min_value);
                if self.state.current_value == settings.min_value {
                    self.exhaust();
                }
            }
        } else if !self.state.is_cooling_down() && self.state.current_value < settings.max_value {
            let rate = self.recover_rate();
            self.state.total_elapsed += dt;
            self.state.current_value = (self.state.base_value + self.state.total_elapsed * rate)
                .min(settings.max_value);
            if self.state.current_value == settings.max_value {
                self.state.total_elapsed = 0.0;
                self.state.base_value = self.state.current_value;
                self.outbox.push(StaminaNotification::fixed(
                    self.state.current_value,
                    self.state.overheat,
                ));
                self.state.overheat = false;
            }
        }
    }

    fn exhaust(&mut self) {
        let cooldown = self.settings.cooldown_seconds;
        self.state.total_elapsed = 0.0;
        self.state.base_value = self.state.current_value;
        self.state.overheat = true;
        self.state.cooldown_remaining = cooldown;
        self.state.cooldown_base = cooldown;
        self.state.cooldown_elapsed = 0.0;
        log::debug!("stamina exhausted, cooling down for {cooldown}s");
        self.outbox
            .push(StaminaNotification::fixed(self.state.current_value, true));
    }

    /// Handles the ability starting (`consuming == true`) or stopping.
    pub fn on_status_changed(&mut self, consuming: bool) {
        let settings = self.settings;
        let cooldown = if consuming {
            0.0
        } else {
            settings.cooldown_seconds
        };
        self.state.cooldown_remaining = cooldown;
        self.state.cooldown_base = cooldown;
        self.state.cooldown_elapsed = 0.0;
        self.state.total_elapsed = 0.0;
        self.state.base_value = self.state.current_value;

        if consuming {
            let rate = -settings.consume_rate;
            self.outbox.push(StaminaNotification::sloped(
                self.state.current_value,
                rate,
                settings.min_value - self.state.current_value,
            ));
        } else if !self.state.overheat {
            self.outbox
                .push(StaminaNotification::fixed(self.state.current_value, false));
        }
    }
}
