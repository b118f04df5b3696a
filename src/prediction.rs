//! Client-side prediction of wall-run movement.
//!
//! Every locally simulated move is recorded together with the body state
//! and the auxiliary state (stamina and the enabled flag) taken before the
//! move. Records are kept until the server acknowledges them so that a
//! correction can rewind to the authoritative state and replay the rest.
//! Adjacent unsent records with compatible state are merged to save
//! bandwidth.

use std::collections::VecDeque;

use glam::{Quat, Vec3};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::collision::CollisionWorld;
use crate::enable_gate::WallRunEnableTarget;
use crate::mode::MovementMode;
use crate::movement::{BaseMovement, CharacterBody, MoveInput, StandardMovement, WallRunMovement};
use crate::stamina::StaminaState;

/// Longest combined delta time a merged move may cover.
pub const MAX_MERGED_DELTA_TIME: f32 = 0.125;
/// Largest per-axis difference between accelerations that still merge.
pub const MERGE_ACCELERATION_TOLERANCE: f32 = 1e-3;
/// Saved moves kept before the oldest is discarded unacknowledged.
pub const DEFAULT_MAX_SAVED_MOVES: usize = 96;

/// Sequence number of a predicted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MoveId(
    /// Wrapping counter assigned by the predicting client.
    pub u32,
);

/// Predicted auxiliary state restored before every simulated move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuxSnapshot {
    /// Stamina values, timers included.
    pub stamina: StaminaState,
    /// Local enabled flag, independent of overheat.
    pub wall_run_enabled: bool,
}

impl AuxSnapshot {
    /// Reads the auxiliary state of `movement`.
    #[must_use]
    pub fn capture<B: BaseMovement>(movement: &WallRunMovement<B>) -> Self {
        Self {
            stamina: movement.stamina().state(),
            wall_run_enabled: movement.wall_run_enable_flag(),
        }
    }

    /// Writes the snapshot back without emitting notifications.
    pub fn restore<B: BaseMovement>(&self, movement: &mut WallRunMovement<B>) {
        movement.restore_stamina(self.stamina);
        movement.set_wall_run_enable_flag(self.wall_run_enabled);
    }
}

/// Kinematic state of the body and its movement mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshot {
    /// Capsule centre.
    pub location: Vec3,
    /// Facing.
    pub rotation: Quat,
    /// Velocity in cm/s.
    pub velocity: Vec3,
    /// Discrete movement mode.
    pub mode: MovementMode,
    /// Tracked wall normal; zero outside a wall run.
    pub wall_normal: Vec3,
}

impl BodySnapshot {
    /// Reads the body and the controller's mode.
    #[must_use]
    pub fn capture<B: BaseMovement>(body: &CharacterBody, movement: &WallRunMovement<B>) -> Self {
        Self {
            location: body.location,
            rotation: body.rotation,
            velocity: body.velocity,
            mode: movement.mode(),
            wall_normal: movement.wall_run_normal(),
        }
    }

    /// Rewinds the body and the controller's mode without running hooks.
    pub fn restore<B: BaseMovement>(
        &self,
        body: &mut CharacterBody,
        movement: &mut WallRunMovement<B>,
    ) {
        body.location = self.location;
        body.rotation = self.rotation;
        body.velocity = self.velocity;
        movement.restore_mode(self.mode, self.wall_normal);
    }
}

/// One recorded input together with the state it was simulated from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictedMove {
    /// Identity of the move; a merged move keeps the newer id.
    pub id: MoveId,
    /// Client time at the end of the move.
    pub timestamp: f32,
    /// Input applied over the whole move.
    pub input: MoveInput,
    /// Seconds covered by the move.
    pub delta_time: f32,
    /// Body state the move was simulated from.
    pub start: BodySnapshot,
    /// Auxiliary state restored before the move is simulated.
    pub aux: AuxSnapshot,
}

impl PredictedMove {
    /// Payload for the authority.
    #[must_use]
    pub fn to_server_move(&self) -> ServerMove {
        ServerMove {
            id: self.id,
            timestamp: self.timestamp,
            acceleration: self.input.acceleration,
            jump: self.input.jump,
            delta_time: self.delta_time,
            mode: self.start.mode,
        }
    }
}

/// Move payload sent to the authority.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServerMove {
    /// Identity echoed back in the acknowledgement.
    pub id: MoveId,
    /// Client time at the end of the move.
    pub timestamp: f32,
    /// Requested acceleration.
    pub acceleration: Vec3,
    /// Jump pressed during the move.
    pub jump: bool,
    /// Seconds covered by the move.
    pub delta_time: f32,
    /// Mode the client was in when the move started.
    pub mode: MovementMode,
}

impl ServerMove {
    /// Input the authority simulates.
    #[must_use]
    pub const fn input(&self) -> MoveInput {
        MoveInput {
            acceleration: self.acceleration,
            jump: self.jump,
        }
    }
}

/// Authoritative state after the move `acknowledged`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServerCorrection {
    /// Last move the authority simulated.
    pub acknowledged: MoveId,
    /// Authoritative body state after that move.
    pub body: BodySnapshot,
    /// Authoritative auxiliary state after that move.
    pub aux: AuxSnapshot,
}

/// Reason two adjacent moves cannot be combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MergeRejection {
    /// Either move carries a jump.
    #[error("a jump is pending in one of the moves")]
    JumpPending,
    /// The requested accelerations differ beyond the tolerance.
    #[error("the moves use different accelerations")]
    AccelerationMismatch,
    /// The moves start in different modes.
    #[error("the moves start in different movement modes")]
    ModeMismatch,
    /// The combined move would be too long.
    #[error("the combined delta time exceeds {MAX_MERGED_DELTA_TIME}s")]
    DeltaTooLarge,
    /// Only one move starts overheated.
    #[error("stamina overheat differs between the moves")]
    OverheatMismatch,
    /// Only one move has consume or recover time accumulated.
    #[error("only one move has a running consumption timer")]
    ConsumptionTimerMismatch,
    /// Only one move has cooldown time accumulated.
    #[error("only one move has a running cooldown timer")]
    CooldownTimerMismatch,
    /// The enabled flags differ.
    #[error("the wall-run enabled flag differs between the moves")]
    EnabledMismatch,
}

fn check_aux(older: &AuxSnapshot, newer: &AuxSnapshot) -> Result<(), MergeRejection> {
    if older.stamina.overheat != newer.stamina.overheat {
        return Err(MergeRejection::OverheatMismatch);
    }
    if (older.stamina.total_elapsed == 0.0) != (newer.stamina.total_elapsed == 0.0) {
        return Err(MergeRejection::ConsumptionTimerMismatch);
    }
    if (older.stamina.cooldown_elapsed == 0.0) != (newer.stamina.cooldown_elapsed == 0.0) {
        return Err(MergeRejection::CooldownTimerMismatch);
    }
    if older.wall_run_enabled != newer.wall_run_enabled {
        return Err(MergeRejection::EnabledMismatch);
    }
    Ok(())
}

/// Combines two adjacent moves into one.
///
/// The result starts from `older`'s snapshots, carries `newer`'s input and
/// identity, and covers both delta times.
///
/// # Errors
/// Returns the first rule that forbids combining the moves.
pub fn merge(older: &PredictedMove, newer: &PredictedMove) -> Result<PredictedMove, MergeRejection> {
    if older.input.jump || newer.input.jump {
        return Err(MergeRejection::JumpPending);
    }
    if !older
        .input
        .acceleration
        .abs_diff_eq(newer.input.acceleration, MERGE_ACCELERATION_TOLERANCE)
    {
        return Err(MergeRejection::AccelerationMismatch);
    }
    if older.start.mode != newer.start.mode {
        return Err(MergeRejection::ModeMismatch);
    }
    let delta_time = older.delta_time + newer.delta_time;
    if delta_time > MAX_MERGED_DELTA_TIME {
        return Err(MergeRejection::DeltaTooLarge);
    }
    check_aux(&older.aux, &newer.aux)?;

    Ok(PredictedMove {
        id: newer.id,
        timestamp: newer.timestamp,
        input: newer.input,
        delta_time,
        start: older.start,
        aux: older.aux,
    })
}

/// Whether [`merge`] would accept the pair.
#[must_use]
pub fn can_merge(older: &PredictedMove, newer: &PredictedMove) -> bool {
    merge(older, newer).is_ok()
}

/// Locally controlled body simulated ahead of the server.
#[derive(Debug)]
pub struct PredictionClient<B = StandardMovement> {
    movement: WallRunMovement<B>,
    body: CharacterBody,
    saved: VecDeque<PredictedMove>,
    /// Last saved move not yet handed to the transport.
    pending: Option<MoveId>,
    outgoing: Vec<ServerMove>,
    next_id: u32,
    clock: f32,
    max_saved: usize,
}

impl<B: BaseMovement> PredictionClient<B> {
    /// Starts predicting `body` with an empty move buffer.
    #[must_use]
    pub fn new(movement: WallRunMovement<B>, body: CharacterBody) -> Self {
        Self {
            movement,
            body,
            saved: VecDeque::new(),
            pending: None,
            outgoing: Vec::new(),
            next_id: 0,
            clock: 0.0,
            max_saved: DEFAULT_MAX_SAVED_MOVES,
        }
    }

    /// Caps the saved-move buffer; at least one move is always kept.
    #[must_use]
    pub fn with_max_saved_moves(mut self, max_saved: usize) -> Self {
        self.max_saved = max_saved.max(1);
        self
    }

    /// Predicted controller.
    #[must_use]
    pub const fn movement(&self) -> &WallRunMovement<B> {
        &self.movement
    }

    /// Predicted body.
    #[must_use]
    pub const fn body(&self) -> &CharacterBody {
        &self.body
    }

    /// Unacknowledged moves, oldest first.
    pub fn saved_moves(&self) -> impl Iterator<Item = &PredictedMove> {
        self.saved.iter()
    }

    /// Current body and auxiliary state.
    #[must_use]
    pub fn snapshot(&self) -> (BodySnapshot, AuxSnapshot) {
        (
            BodySnapshot::capture(&self.body, &self.movement),
            AuxSnapshot::capture(&self.movement),
        )
    }

    fn take_pending(&mut self) -> Option<PredictedMove> {
        let id = self.pending.take()?;
        match self.saved.back() {
            Some(last) if last.id == id => self.saved.pop_back(),
            _ => None,
        }
    }

    /// Simulates one move locally and records it.
    ///
    /// If the previous move has not been sent yet and the two merge, the
    /// body is rewound to the previous move's start and the combined move
    /// is simulated in its place.
    pub fn simulate(&mut self, world: &dyn CollisionWorld, input: MoveInput, delta_time: f32) {
        let id = MoveId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.clock += delta_time;
        let (start, aux) = self.snapshot();
        let mut record = PredictedMove {
            id,
            timestamp: self.clock,
            input,
            delta_time,
            start,
            aux,
        };

        if let Some(pending) = self.take_pending() {
            match merge(&pending, &record) {
                Ok(merged) => {
                    debug!("merged move {:?} into {:?}", pending.id, merged.id);
                    merged.start.restore(&mut self.body, &mut self.movement);
                    record = merged;
                }
                Err(reason) => {
                    debug!("move {:?} not merged: {reason}", pending.id);
                    self.outgoing.push(pending.to_server_move());
                    self.saved.push_back(pending);
                }
            }
        }

        record.aux.restore(&mut self.movement);
        self.movement
            .perform_move(&mut self.body, world, &record.input, record.delta_time);
        self.saved.push_back(record);
        self.pending = Some(record.id);

        while self.saved.len() > self.max_saved {
            if let Some(dropped) = self.saved.pop_front() {
                warn!("saved move buffer full; dropping {:?}", dropped.id);
            }
        }
    }

    /// Moves ready for the transport, including the pending one.
    pub fn flush(&mut self) -> Vec<ServerMove> {
        if let Some(id) = self.pending.take() {
            if let Some(last) = self.saved.back().filter(|last| last.id == id) {
                self.outgoing.push(last.to_server_move());
            }
        }
        std::mem::take(&mut self.outgoing)
    }

    /// Forgets every saved move up to and including `id`.
    pub fn acknowledge(&mut self, id: MoveId) {
        while self.saved.front().is_some_and(|front| front.id <= id) {
            self.saved.pop_front();
        }
        if self.saved.is_empty() {
            self.pending = None;
        }
    }

    /// Adopts the server's state and replays every unacknowledged move.
    /// Returns the number of moves replayed.
    pub fn apply_correction(
        &mut self,
        world: &dyn CollisionWorld,
        correction: &ServerCorrection,
    ) -> usize {
        self.acknowledge(correction.acknowledged);
        correction.body.restore(&mut self.body, &mut self.movement);
        correction.aux.restore(&mut self.movement);
        debug!(
            "correction after {:?}; replaying {} moves",
            correction.acknowledged,
            self.saved.len()
        );

        for record in &mut self.saved {
            record.start = BodySnapshot::capture(&self.body, &self.movement);
            record.aux.restore(&mut self.movement);
            self.movement
                .perform_move(&mut self.body, world, &record.input, record.delta_time);
        }
        self.saved.len()
    }
}
