//! Tunable parameters for the behavioral engine
//!
//! Thresholds are configuration, not hard-coded constants: each detector
//! instance and the attention scorer receive their parameters at
//! construction time, with the defaults below.

use serde::{Deserialize, Serialize};

/// Default hand-raise sustain threshold (seconds)
pub const HAND_RAISE_SUSTAIN_SEC: f64 = 1.0;
/// Default hand-raise cooldown between confirmations (seconds)
pub const HAND_RAISE_COOLDOWN_SEC: f64 = 3.0;
/// Default looking-away sustain threshold (seconds)
pub const LOOKING_AWAY_SUSTAIN_SEC: f64 = 2.0;
/// Default looking-away cooldown between confirmations (seconds)
pub const LOOKING_AWAY_COOLDOWN_SEC: f64 = 5.0;
/// Default yaw threshold for the looking-away classification (degrees)
pub const YAW_THRESHOLD_DEG: f64 = 20.0;
/// Default pitch threshold for the looking-away classification (degrees)
pub const PITCH_THRESHOLD_DEG: f64 = 15.0;

/// Parameters for one debounced event detector instance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebounceConfig {
    /// Minimum continuous-true duration before an episode may confirm
    pub sustain_threshold_sec: f64,
    /// Minimum gap between two confirmations, measured from the previous
    /// confirmation time regardless of episode boundaries
    pub cooldown_period_sec: f64,
}

impl DebounceConfig {
    pub fn new(sustain_threshold_sec: f64, cooldown_period_sec: f64) -> Self {
        DebounceConfig {
            sustain_threshold_sec,
            cooldown_period_sec,
        }
    }

    /// Default parameters for the hand-raise detector (1.0 s / 3.0 s)
    pub fn hand_raise() -> Self {
        DebounceConfig::new(HAND_RAISE_SUSTAIN_SEC, HAND_RAISE_COOLDOWN_SEC)
    }

    /// Default parameters for the looking-away detector (2.0 s / 5.0 s)
    pub fn looking_away() -> Self {
        DebounceConfig::new(LOOKING_AWAY_SUSTAIN_SEC, LOOKING_AWAY_COOLDOWN_SEC)
    }
}

/// Parameters for the attention scorer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttentionConfig {
    /// Absolute yaw beyond which the pose counts as looking away (degrees)
    pub yaw_threshold_deg: f64,
    /// Absolute pitch beyond which the pose counts as looking away (degrees)
    pub pitch_threshold_deg: f64,
}

impl Default for AttentionConfig {
    fn default() -> Self {
        AttentionConfig {
            yaw_threshold_deg: YAW_THRESHOLD_DEG,
            pitch_threshold_deg: PITCH_THRESHOLD_DEG,
        }
    }
}

/// Full engine configuration: both detector instances plus the scorer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub hand_raise: DebounceConfig,
    pub looking_away: DebounceConfig,
    pub attention: AttentionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig::new()
    }
}

impl EngineConfig {
    /// Configuration with the documented default thresholds
    pub fn new() -> Self {
        EngineConfig {
            hand_raise: DebounceConfig::hand_raise(),
            looking_away: DebounceConfig::looking_away(),
            attention: AttentionConfig::default(),
        }
    }
}
