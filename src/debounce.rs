//! Debounced event detection
//!
//! Converts a per-frame boolean raw signal into a small number of confirmed
//! discrete events via hysteresis: an episode of continuous raw activity must
//! sustain for a minimum duration before it confirms, confirmations are
//! spaced by a cooldown, and a single episode never confirms twice.
//!
//! Two independent instances drive the session pipeline: one for the raw
//! hand-raised signal, one for the looking-away classification.

use crate::config::DebounceConfig;
use chrono::{DateTime, Utc};

/// Detector state.
///
/// `Timing` covers both "not yet sustained" and "sustained but still inside
/// the cooldown window"; the cooldown condition is re-checked on every
/// subsequent active frame until it clears, then the episode confirms
/// exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// Raw signal inactive
    Idle,
    /// Raw signal active, episode not confirmed yet
    Timing { episode_start: DateTime<Utc> },
    /// Raw signal active, episode already confirmed
    Confirmed,
}

/// Hysteresis state machine over a boolean per-frame signal.
///
/// Call [`EventDebouncer::update`] exactly once per frame; the returned
/// boolean is true only on the frame a new event is confirmed.
#[derive(Debug, Clone)]
pub struct EventDebouncer {
    config: DebounceConfig,
    state: DetectorState,
    last_confirmed: Option<DateTime<Utc>>,
    confirmed_count: u32,
}

impl EventDebouncer {
    pub fn new(config: DebounceConfig) -> Self {
        EventDebouncer {
            config,
            state: DetectorState::Idle,
            last_confirmed: None,
            confirmed_count: 0,
        }
    }

    /// Advance the state machine one frame.
    ///
    /// An inactive signal drops straight back to `Idle` and discards any
    /// accumulated timing: an episode shorter than the sustain threshold
    /// never counts. An active signal confirms once the episode has
    /// sustained long enough and the cooldown since the previous
    /// confirmation has elapsed.
    pub fn update(&mut self, signal: bool, now: DateTime<Utc>) -> bool {
        if !signal {
            self.state = DetectorState::Idle;
            return false;
        }

        match self.state {
            DetectorState::Idle => {
                self.state = DetectorState::Timing { episode_start: now };
                false
            }
            DetectorState::Timing { episode_start } => {
                let elapsed = seconds_between(episode_start, now);
                if elapsed < self.config.sustain_threshold_sec {
                    return false;
                }

                let cooled_down = match self.last_confirmed {
                    None => true,
                    Some(prev) => seconds_between(prev, now) >= self.config.cooldown_period_sec,
                };
                if !cooled_down {
                    // Sustained but still inside the cooldown window; keep the
                    // episode start and re-check next frame.
                    return false;
                }

                self.confirmed_count += 1;
                self.last_confirmed = Some(now);
                self.state = DetectorState::Confirmed;
                true
            }
            DetectorState::Confirmed => false,
        }
    }

    /// Cumulative confirmations since construction or the last reset
    pub fn confirmed_count(&self) -> u32 {
        self.confirmed_count
    }

    /// Timestamp of the most recent confirmation
    pub fn last_confirmed(&self) -> Option<DateTime<Utc>> {
        self.last_confirmed
    }

    /// Current detector state
    pub fn state(&self) -> DetectorState {
        self.state
    }

    /// When the current continuous raw-active run began, if one is being timed
    pub fn episode_start(&self) -> Option<DateTime<Utc>> {
        match self.state {
            DetectorState::Timing { episode_start } => Some(episode_start),
            _ => None,
        }
    }

    /// Clear all state and counters, keeping the configuration
    pub fn reset(&mut self) {
        self.state = DetectorState::Idle;
        self.last_confirmed = None;
        self.confirmed_count = 0;
    }
}

fn seconds_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    (later - earlier).num_milliseconds() as f64 / 1000.0
}
