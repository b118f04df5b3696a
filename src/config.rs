//! Tunable wall-run and stamina settings.
//!
//! Settings deserialise from JSON with `serde`. Every field has a default,
//! so a config file only needs to name the values it overrides. Loaded
//! configurations are validated before use.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::DEFAULT_WALL_GRAVITY_SCALE;

/// Errors raised while loading a [`MovementConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The text is not valid JSON for a [`MovementConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A value is out of range.
    #[error("invalid value for `{field}`: {reason}")]
    Invalid {
        /// Name of the offending setting.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Piecewise-linear curve mapping the cosine between acceleration and
/// horizontal travel direction to a gravity multiplier.
///
/// Keys are cosines in `[-1, 1]`, sorted ascending. Evaluation clamps to
/// the first and last keys outside the covered range.
///
/// # Examples
/// ```
/// use wallrun::config::GravityScaleCurve;
/// let curve = GravityScaleCurve::new(vec![(-1.0, 1.0), (0.0, 0.2), (1.0, 0.0)]);
/// assert!((curve.evaluate(-0.5) - 0.6).abs() < 1e-6);
/// assert_eq!(curve.evaluate(2.0), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct GravityScaleCurve {
    keys: Vec<(f32, f32)>,
}

impl GravityScaleCurve {
    /// Curve through `(cosine, scale)` keys, sorted by cosine.
    #[must_use]
    pub const fn new(keys: Vec<(f32, f32)>) -> Self {
        Self { keys }
    }

    /// Keys as given.
    #[must_use]
    pub fn keys(&self) -> &[(f32, f32)] {
        &self.keys
    }

    /// Samples the curve at `cosine`. An empty curve evaluates to `0`.
    #[must_use]
    pub fn evaluate(&self, cosine: f32) -> f32 {
        let (Some(&(first_key, first_value)), Some(&(last_key, last_value))) =
            (self.keys.first(), self.keys.last())
        else {
            return 0.0;
        };
        if cosine <= first_key {
            return first_value;
        }
        if cosine >= last_key {
            return last_value;
        }
        for window in self.keys.windows(2) {
            let &[(k0, v0), (k1, v1)] = window else {
                continue;
            };
            if cosine <= k1 {
                let span = k1 - k0;
                if span <= f32::EPSILON {
                    return v1;
                }
                let alpha = (cosine - k0) / span;
                return v0 + (v1 - v0) * alpha;
            }
        }
        last_value
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for &(key, value) in &self.keys {
            if !(-1.0..=1.0).contains(&key) {
                return Err(ConfigError::invalid(
                    "gravity_scale_curve",
                    format!("key {key} outside [-1, 1]"),
                ));
            }
            if !value.is_finite() {
                return Err(ConfigError::invalid(
                    "gravity_scale_curve",
                    format!("value at key {key} is not finite"),
                ));
            }
        }
        if self
            .keys
            .windows(2)
            .any(|window| matches!(window, &[(k0, _), (k1, _)] if k0 > k1))
        {
            return Err(ConfigError::invalid(
                "gravity_scale_curve",
                "keys must be sorted ascending",
            ));
        }
        Ok(())
    }
}

/// Wall-run tuning. Speeds are cm/s, distances cm, angles degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallRunSettings {
    /// Horizontal speed below which wall-running cannot start or continue.
    pub min_wall_run_speed: f32,
    /// Reported max speed while wall-running.
    pub max_wall_run_speed: f32,
    /// Upper clamp applied to vertical speed on entry.
    pub max_vertical_up_wall_run_speed: f32,
    /// Falling faster than this prevents or ends a wall-run.
    pub max_vertical_down_wall_run_speed: f32,
    /// Acceleration pointing away from the wall by more than this ends the run.
    pub wall_run_pull_away_angle: f32,
    /// Speed toward the wall per unit of capsule radius.
    pub wall_run_attraction_velocity_scale: f32,
    /// Floors closer than this prevent or end a wall-run.
    pub min_wall_run_height: f32,
    /// Push away from the wall added by a jump off it.
    pub wall_run_jump_wall_normal_initial_velocity: f32,
    /// Speed of the small outward nudge taken before each wall-run move.
    pub wall_run_away_from_wall_before_moving_velocity_scale: f32,
    /// Wall scan distance per unit of capsule radius.
    pub wall_run_radius_scale_for_wall_scan_distance: f32,
    /// Gravity multiplier by cosine between acceleration and travel;
    /// a fixed scale applies without one.
    pub gravity_scale_curve: Option<GravityScaleCurve>,
}

impl Default for WallRunSettings {
    fn default() -> Self {
        Self {
            min_wall_run_speed: 200.0,
            max_wall_run_speed: 800.0,
            max_vertical_up_wall_run_speed: 200.0,
            max_vertical_down_wall_run_speed: 400.0,
            wall_run_pull_away_angle: 60.0,
            wall_run_attraction_velocity_scale: 2.0,
            min_wall_run_height: 50.0,
            wall_run_jump_wall_normal_initial_velocity: 200.0,
            wall_run_away_from_wall_before_moving_velocity_scale: 0.03,
            wall_run_radius_scale_for_wall_scan_distance: 2.0,
            gravity_scale_curve: None,
        }
    }
}

impl WallRunSettings {
    /// Gravity multiplier for a body that is not rising, keyed by the
    /// cosine between acceleration and horizontal travel direction.
    #[must_use]
    pub fn gravity_scale_for_cosine(&self, cosine: f32) -> f32 {
        match &self.gravity_scale_curve {
            Some(curve) => curve.evaluate(cosine),
            None if cosine < 0.0 => DEFAULT_WALL_GRAVITY_SCALE,
            None => 0.0,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("min_wall_run_speed", self.min_wall_run_speed),
            ("max_wall_run_speed", self.max_wall_run_speed),
            (
                "max_vertical_up_wall_run_speed",
                self.max_vertical_up_wall_run_speed,
            ),
            (
                "max_vertical_down_wall_run_speed",
                self.max_vertical_down_wall_run_speed,
            ),
            (
                "wall_run_attraction_velocity_scale",
                self.wall_run_attraction_velocity_scale,
            ),
            ("min_wall_run_height", self.min_wall_run_height),
            (
                "wall_run_jump_wall_normal_initial_velocity",
                self.wall_run_jump_wall_normal_initial_velocity,
            ),
            (
                "wall_run_away_from_wall_before_moving_velocity_scale",
                self.wall_run_away_from_wall_before_moving_velocity_scale,
            ),
            (
                "wall_run_radius_scale_for_wall_scan_distance",
                self.wall_run_radius_scale_for_wall_scan_distance,
            ),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(
                    field,
                    format!("expected a finite non-negative value, got {value}"),
                ));
            }
        }
        if self.min_wall_run_speed > self.max_wall_run_speed {
            return Err(ConfigError::invalid(
                "min_wall_run_speed",
                "must not exceed max_wall_run_speed",
            ));
        }
        if !(0.0..=90.0).contains(&self.wall_run_pull_away_angle) {
            return Err(ConfigError::invalid(
                "wall_run_pull_away_angle",
                format!("{} is outside [0, 90] degrees", self.wall_run_pull_away_angle),
            ));
        }
        if let Some(curve) = &self.gravity_scale_curve {
            curve.validate()?;
        }
        Ok(())
    }
}

/// Stamina tuning. Rates are units per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaminaSettings {
    /// Drain while wall-running.
    pub consume_rate: f32,
    /// Recovery rate after an ordinary stop.
    pub recover_default_rate: f32,
    /// Recovery rate after the value was exhausted.
    pub recover_overheat_rate: f32,
    /// Delay after consumption stops before recovery begins.
    pub cooldown_seconds: f32,
    /// Empty value; reaching it overheats.
    pub min_value: f32,
    /// Full value.
    pub max_value: f32,
}

impl Default for StaminaSettings {
    fn default() -> Self {
        Self {
            consume_rate: 40.0,
            recover_default_rate: 30.0,
            recover_overheat_rate: 20.0,
            cooldown_seconds: 1.0,
            min_value: 0.0,
            max_value: 100.0,
        }
    }
}

impl StaminaSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        let rates = [
            ("consume_rate", self.consume_rate),
            ("recover_default_rate", self.recover_default_rate),
            ("recover_overheat_rate", self.recover_overheat_rate),
        ];
        for (field, value) in rates {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::invalid(
                    field,
                    format!("expected a positive rate, got {value}"),
                ));
            }
        }
        if !self.cooldown_seconds.is_finite() || self.cooldown_seconds < 0.0 {
            return Err(ConfigError::invalid(
                "cooldown_seconds",
                format!("expected a non-negative duration, got {}", self.cooldown_seconds),
            ));
        }
        if !(self.min_value.is_finite() && self.max_value.is_finite())
            || self.min_value >= self.max_value
        {
            return Err(ConfigError::invalid(
                "min_value",
                format!(
                    "expected min_value < max_value, got {} and {}",
                    self.min_value, self.max_value
                ),
            ));
        }
        Ok(())
    }
}

/// Complete movement configuration for one body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MovementConfig {
    /// Wall-run tuning.
    pub wall_run: WallRunSettings,
    /// Stamina tuning.
    pub stamina: StaminaSettings,
}

impl MovementConfig {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] when a value is out of range.
    ///
    /// # Examples
    /// ```
    /// use wallrun::config::MovementConfig;
    /// let cfg = MovementConfig::from_json_str(r#"{ "wall_run": { "min_wall_run_speed": 150.0 } }"#)
    ///     .expect("valid config");
    /// assert_eq!(cfg.wall_run.min_wall_run_speed, 150.0);
    /// assert_eq!(cfg.stamina.max_value, 100.0);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise
    /// the errors of [`MovementConfig::from_json_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = path.as_ref();
        let json = fs::read_to_string(file).map_err(|source| ConfigError::Io {
            path: file.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Checks every field against its allowed range.
    ///
    /// # Errors
    /// Returns the first [`ConfigError::Invalid`] encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.wall_run.validate()?;
        self.stamina.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    fn defaults_are_valid() {
        MovementConfig::default()
            .validate()
            .expect("default config should validate");
    }

    #[rstest]
    fn empty_object_yields_defaults() {
        let cfg = MovementConfig::from_json_str("{}").expect("empty config parses");
        assert_eq!(cfg, MovementConfig::default());
    }

    #[rstest]
    #[case::negative_speed(r#"{ "wall_run": { "min_wall_run_speed": -1.0 } }"#, "min_wall_run_speed")]
    #[case::min_above_max(r#"{ "wall_run": { "min_wall_run_speed": 900.0 } }"#, "min_wall_run_speed")]
    #[case::angle(r#"{ "wall_run": { "wall_run_pull_away_angle": 120.0 } }"#, "wall_run_pull_away_angle")]
    #[case::zero_rate(r#"{ "stamina": { "consume_rate": 0.0 } }"#, "consume_rate")]
    #[case::inverted_bounds(r#"{ "stamina": { "min_value": 100.0, "max_value": 10.0 } }"#, "min_value")]
    #[case::unsorted_curve(
        r#"{ "wall_run": { "gravity_scale_curve": [[0.5, 1.0], [-0.5, 0.0]] } }"#,
        "gravity_scale_curve"
    )]
    #[case::curve_key_range(
        r#"{ "wall_run": { "gravity_scale_curve": [[-2.0, 1.0]] } }"#,
        "gravity_scale_curve"
    )]
    fn invalid_values_are_rejected(#[case] json: &str, #[case] expected_field: &str) {
        match MovementConfig::from_json_str(json) {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected_field),
            other => panic!("expected invalid `{expected_field}`, got {other:?}"),
        }
    }

    #[rstest]
    fn malformed_json_is_a_parse_error() {
        let err = MovementConfig::from_json_str("{ not json").expect_err("should fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[rstest]
    fn missing_file_is_an_io_error() {
        let err = MovementConfig::from_path("/definitely/not/here.json").expect_err("should fail");
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[rstest]
    #[case::below_range(-3.0, 1.0)]
    #[case::first_key(-1.0, 1.0)]
    #[case::midpoint(-0.5, 0.6)]
    #[case::second_segment(0.5, 0.1)]
    #[case::above_range(4.0, 0.0)]
    fn curve_interpolates_linearly(#[case] cosine: f32, #[case] expected: f32) {
        let curve = GravityScaleCurve::new(vec![(-1.0, 1.0), (0.0, 0.2), (1.0, 0.0)]);
        assert_relative_eq!(curve.evaluate(cosine), expected, epsilon = 1e-6);
    }

    #[rstest]
    fn empty_curve_evaluates_to_zero() {
        assert_eq!(GravityScaleCurve::default().evaluate(-1.0), 0.0);
    }

    #[rstest]
    #[case::against_travel(-0.2, DEFAULT_WALL_GRAVITY_SCALE)]
    #[case::perpendicular(0.0, 0.0)]
    #[case::with_travel(0.9, 0.0)]
    fn default_gravity_scale_without_curve(#[case] cosine: f32, #[case] expected: f32) {
        let settings = WallRunSettings::default();
        assert_relative_eq!(settings.gravity_scale_for_cosine(cosine), expected);
    }
}
