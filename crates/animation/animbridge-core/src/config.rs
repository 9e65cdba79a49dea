//! Conversion configuration for animbridge-core.

use serde::{Deserialize, Serialize};

use crate::control_vars::GameVariant;

/// Settings shared by import and export passes.
/// Keep this minimal; callers usually only change `sample_rate` and `game`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConvertConfig {
    /// Curve-editor frames per second. Handle x coordinates are `t * sample_rate + 1`.
    pub sample_rate: f64,

    /// Target game; selects property-group names in the controlled-variable table.
    pub game: GameVariant,

    /// Auxiliary targets with no meaningful bind frame: use raw transform values.
    pub raw_transforms: bool,

    /// Two key times closer than this are treated as the same stamp.
    pub key_time_epsilon: f64,

    /// Export resampling step in seconds; `None` means `1 / sample_rate`.
    pub resample_step: Option<f64>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            sample_rate: 30.0,
            game: GameVariant::Skyrim,
            raw_transforms: false,
            key_time_epsilon: 1e-4,
            resample_step: None,
        }
    }
}

impl ConvertConfig {
    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_game(mut self, game: GameVariant) -> Self {
        self.game = game;
        self
    }

    /// Effective frames per second; non-finite or non-positive rates fall back to 30.
    #[inline]
    pub fn fps(&self) -> f64 {
        if self.sample_rate.is_finite() && self.sample_rate > 0.0 {
            self.sample_rate
        } else {
            30.0
        }
    }

    /// Effective export resampling step in seconds.
    pub fn step(&self) -> f64 {
        self.resample_step
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or_else(|| 1.0 / self.fps())
    }

    /// Seconds to curve-editor frame.
    #[inline]
    pub fn frame_of(&self, time: f64) -> f64 {
        time * self.fps() + 1.0
    }

    /// Curve-editor frame to seconds.
    #[inline]
    pub fn time_of(&self, frame: f64) -> f64 {
        (frame - 1.0) / self.fps()
    }

    #[inline]
    pub fn same_time(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.key_time_epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_time_mapping_is_one_based() {
        let cfg = ConvertConfig::default().with_sample_rate(30.0);
        assert_eq!(cfg.frame_of(0.0), 1.0);
        assert_eq!(cfg.frame_of(1.0), 31.0);
        assert_eq!(cfg.time_of(31.0), 1.0);
    }

    #[test]
    fn bogus_rate_falls_back() {
        let cfg = ConvertConfig::default().with_sample_rate(f64::NAN);
        assert_eq!(cfg.fps(), 30.0);
        assert!((cfg.step() - 1.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn deserializes_partial_json() {
        let cfg: ConvertConfig = serde_json::from_str(r#"{ "sample_rate": 60.0 }"#).unwrap();
        assert_eq!(cfg.sample_rate, 60.0);
        assert_eq!(cfg.game, GameVariant::Skyrim);
        assert!(!cfg.raw_transforms);
    }
}
