//! Movement modes and wall-run side descriptors.
//!
//! The set of modes is closed: every mode has a physics routine, so there
//! is no "unknown custom mode" to guard against at runtime.

use serde::{Deserialize, Serialize};

/// Which side of the body the tracked wall is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WallRunSide {
    /// Wall to the left, against the right vector.
    Left,
    /// Wall along the right vector.
    Right,
}

impl WallRunSide {
    /// Sign applied to the body's right vector when scanning for the wall.
    #[must_use]
    pub const fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }
}

/// Discrete locomotion state of a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MovementMode {
    /// On walkable ground.
    Walking,
    /// Airborne.
    #[default]
    Falling,
    /// Running along a wall on the given side.
    WallRun(WallRunSide),
}

impl MovementMode {
    /// Returns the wall side when the mode is a wall-run.
    ///
    /// # Examples
    /// ```
    /// use wallrun::mode::{MovementMode, WallRunSide};
    /// assert_eq!(MovementMode::WallRun(WallRunSide::Left).wall_run_side(), Some(WallRunSide::Left));
    /// assert_eq!(MovementMode::Falling.wall_run_side(), None);
    /// ```
    #[must_use]
    pub const fn wall_run_side(self) -> Option<WallRunSide> {
        match self {
            Self::WallRun(side) => Some(side),
            Self::Walking | Self::Falling => None,
        }
    }

    /// Either wall-run side.
    #[must_use]
    pub const fn is_wall_run(self) -> bool {
        matches!(self, Self::WallRun(_))
    }

    /// Airborne without a wall.
    #[must_use]
    pub const fn is_falling(self) -> bool {
        matches!(self, Self::Falling)
    }
}

/// Public view of the wall-run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WallRunStatus {
    /// Not wall-running.
    #[default]
    None,
    /// Wall-running with the wall on the left.
    Left,
    /// Wall-running with the wall on the right.
    Right,
}

impl From<MovementMode> for WallRunStatus {
    fn from(mode: MovementMode) -> Self {
        match mode.wall_run_side() {
            Some(WallRunSide::Left) => Self::Left,
            Some(WallRunSide::Right) => Self::Right,
            None => Self::None,
        }
    }
}

impl WallRunStatus {
    /// Side of the wall, if any.
    #[must_use]
    pub const fn side(self) -> Option<WallRunSide> {
        match self {
            Self::Left => Some(WallRunSide::Left),
            Self::Right => Some(WallRunSide::Right),
            Self::None => None,
        }
    }
}
