//! Outbound notifications and mode-change observers.
//!
//! The movement controller never calls into UI or ability code. It queues
//! [`MovementEvent`]s which the owner drains after each move; the ECS
//! plugin re-triggers the payloads as Bevy events.

use std::fmt;

use bevy::prelude::Event;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::collision::BodyId;
use crate::mode::MovementMode;
use crate::stamina::StaminaNotification;

/// Handle returned when registering a mode-change observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObserverId(u32);

/// Fired by a registered observer when the movement mode changed.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeChanged {
    /// Body whose mode changed.
    pub instigator: BodyId,
    /// Observer that fired.
    pub observer: ObserverId,
    /// Mode before the change.
    pub previous: MovementMode,
    /// Mode after the change.
    pub current: MovementMode,
    /// Value returned by the observer's predicate, or 0 without one.
    pub payload: i32,
}

/// Stamina evolution announced to dependent systems.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct StaminaChanged {
    /// Body owning the stamina.
    pub instigator: BodyId,
    /// Value now.
    pub current_value: f32,
    /// Current slope; zero when the value is fixed.
    pub add_value_per_second: f32,
    /// Seconds until the slope ends; zero when fixed.
    pub duration: f32,
    /// A recovery or exhaustion phase has just ended.
    pub finished: bool,
}

impl StaminaChanged {
    /// Attributes `notification` to `instigator`.
    #[must_use]
    pub const fn new(instigator: BodyId, notification: StaminaNotification) -> Self {
        let StaminaNotification {
            current_value,
            add_value_per_second,
            duration,
            finished,
        } = notification;
        Self {
            instigator,
            current_value,
            add_value_per_second,
            duration,
            finished,
        }
    }
}

/// The wall-run enabled flag changed.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnableChanged {
    /// Body whose flag changed.
    pub instigator: BodyId,
    /// New flag value.
    pub enabled: bool,
}

/// Anything the controller queued during a move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementEvent {
    /// A registered observer fired.
    ModeChanged(ModeChanged),
    /// Stamina started or stopped changing.
    Stamina(StaminaChanged),
    /// The enabled flag changed through the gate.
    EnableChanged(EnableChanged),
}

/// Predicate deciding whether an observer fires for a transition
/// `(current, previous)`. Zero suppresses the event; any other value is
/// forwarded as the payload.
pub type ModePredicate = Box<dyn FnMut(MovementMode, MovementMode) -> i32 + Send + Sync>;

struct Observer {
    predicate: Option<ModePredicate>,
    once: bool,
}

/// Registry of mode-change observers.
#[derive(Default)]
pub struct ModeChangeObservers {
    next_id: u32,
    observers: HashMap<ObserverId, Observer>,
}

impl fmt::Debug for ModeChangeObservers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeChangeObservers")
            .field("next_id", &self.next_id)
            .field("registered", &self.observers.len())
            .finish()
    }
}

impl ModeChangeObservers {
    /// Registers an observer. One-shot observers are dropped after they
    /// first fire.
    pub fn register(&mut self, predicate: Option<ModePredicate>, once: bool) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.observers.insert(id, Observer { predicate, once });
        id
    }

    /// Removes an observer. Returns `false` if it was not registered.
    pub fn unregister(&mut self, id: ObserverId) -> bool {
        self.observers.remove(&id).is_some()
    }

    /// Number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// No observer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Evaluates every observer for a transition, in registration order.
    pub fn notify(
        &mut self,
        instigator: BodyId,
        current: MovementMode,
        previous: MovementMode,
    ) -> Vec<ModeChanged> {
        let mut ids: Vec<ObserverId> = self.observers.keys().copied().collect();
        ids.sort_unstable();

        let mut fired = Vec::new();
        for id in ids {
            let Some(observer) = self.observers.get_mut(&id) else {
                continue;
            };
            let payload = match observer.predicate.as_mut() {
                Some(predicate) => predicate(current, previous),
                None => 0,
            };
            if observer.predicate.is_some() && payload == 0 {
                continue;
            }
            if observer.once {
                self.observers.remove(&id);
            }
            fired.push(ModeChanged {
                instigator,
                observer: id,
                previous,
                current,
                payload,
            });
        }
        fired
    }
}
