//! Session state and per-frame aggregation
//!
//! A [`Session`] owns everything that accumulates between monitoring start
//! and stop: the per-entity records, the attendance ledger, and the two
//! debounced event detectors. Frames are folded in one at a time through
//! [`Session::observe_frame`]; the ordering is semantic, since debounce
//! timing and the fan-out of confirmed events both depend on it.

use crate::attention::AttentionScorer;
use crate::config::EngineConfig;
use crate::debounce::EventDebouncer;
use crate::types::{
    AttendanceRecord, AttendanceStatus, EntitySessionRecord, EntitySnapshot, FrameObservation,
    FrameOutcome, SessionSnapshot,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

/// All mutable state of one monitoring session.
///
/// Owned exclusively by its driver; readers only ever see it through
/// [`Session::snapshot`]. Entity records are keyed by identity and ordered,
/// so snapshots and reports come out in a stable order.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    started_at: DateTime<Utc>,
    records: BTreeMap<String, EntitySessionRecord>,
    attendance_marked: HashSet<String>,
    hand_raise: EventDebouncer,
    looking_away: EventDebouncer,
    scorer: AttentionScorer,
}

impl Session {
    /// Start a new session at `now` with the given tunables
    pub fn start(config: &EngineConfig, now: DateTime<Utc>) -> Self {
        Session {
            id: Uuid::new_v4().to_string(),
            started_at: now,
            records: BTreeMap::new(),
            attendance_marked: HashSet::new(),
            hand_raise: EventDebouncer::new(config.hand_raise),
            looking_away: EventDebouncer::new(config.looking_away),
            scorer: AttentionScorer::new(config.attention),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Fold one frame of collaborator output into the session.
    ///
    /// Identified faces create or refresh their entity records and may fire
    /// an attendance mark (once per identity for the session's lifetime).
    /// The raw hand signal always feeds the hand-raise detector; the pose,
    /// when present, is scored and feeds the looking-away detector. Confirmed
    /// events are credited to every currently-active entity: gesture
    /// detection and identification are independent signal paths, so an
    /// event is not attributable to a single entity.
    pub fn observe_frame(&mut self, frame: &FrameObservation) -> FrameOutcome {
        let now = frame.timestamp;
        let mut outcome = FrameOutcome::default();

        for face in &frame.faces {
            let Some(identity) = face.identity.as_deref() else {
                continue;
            };

            let record = self
                .records
                .entry(identity.to_string())
                .or_insert_with(|| EntitySessionRecord::new(identity, &face.display_name, now));
            record.last_seen = now;
            record.frame_count += 1;

            if self.attendance_marked.insert(identity.to_string()) {
                outcome.attendance_marked.push(AttendanceRecord {
                    identity: identity.to_string(),
                    display_name: record.display_name.clone(),
                    date: now.date_naive(),
                    time_in: now.time(),
                    status: AttendanceStatus::Present,
                });
            }
        }

        if self.hand_raise.update(frame.hand_raised, now) {
            outcome.hand_raise_confirmed = true;
            for record in self.records.values_mut() {
                record.hand_raise_count += 1;
            }
        }

        if let Some(pose) = &frame.pose {
            let reading = self.scorer.score(pose);

            for record in self.records.values_mut() {
                record.attention_samples.push(reading.score);
            }

            if self.looking_away.update(reading.looking_away, now) {
                outcome.looking_away_confirmed = true;
                for record in self.records.values_mut() {
                    record.looking_away_count += 1;
                }
            }

            outcome.attention = Some(reading);
        }

        outcome
    }

    /// Read-only view of the session as of `now`
    pub fn snapshot(&self, now: DateTime<Utc>) -> SessionSnapshot {
        let entities: Vec<EntitySnapshot> = self
            .records
            .values()
            .map(|record| EntitySnapshot {
                identity: record.identity.clone(),
                display_name: record.display_name.clone(),
                average_attention: record.average_attention(),
                hand_raises: record.hand_raise_count,
                looking_away_count: record.looking_away_count,
                frame_count: record.frame_count,
                last_seen: record.last_seen,
            })
            .collect();

        // Session-wide attention is the mean over entities that have
        // actually been scored; entities without samples do not dilute it.
        let scored: Vec<f64> = self
            .records
            .values()
            .filter(|r| !r.attention_samples.is_empty())
            .map(EntitySessionRecord::average_attention)
            .collect();
        let average_attention = if scored.is_empty() {
            0.0
        } else {
            scored.iter().sum::<f64>() / scored.len() as f64
        };

        SessionSnapshot {
            session_id: self.id.clone(),
            started_at: self.started_at,
            elapsed_seconds: (now - self.started_at).num_seconds().max(0),
            entity_count: self.records.len(),
            hand_raise_confirmations: self.hand_raise.confirmed_count(),
            looking_away_confirmations: self.looking_away.confirmed_count(),
            average_attention,
            entities,
        }
    }

    /// Zero all behavioral counters and samples without ending the session.
    ///
    /// Entity records survive with their sighting times and frame counts;
    /// the attendance ledger is untouched, so no identity is re-marked.
    pub fn reset_statistics(&mut self) {
        self.hand_raise.reset();
        self.looking_away.reset();
        for record in self.records.values_mut() {
            record.hand_raise_count = 0;
            record.looking_away_count = 0;
            record.attention_samples.clear();
        }
    }

    /// Entity records in identity order
    pub fn records(&self) -> impl Iterator<Item = &EntitySessionRecord> {
        self.records.values()
    }

    pub fn entity_count(&self) -> usize {
        self.records.len()
    }

    /// Session-wide confirmed hand-raise total
    pub fn hand_raise_confirmations(&self) -> u32 {
        self.hand_raise.confirmed_count()
    }

    /// Session-wide confirmed looking-away total
    pub fn looking_away_confirmations(&self) -> u32 {
        self.looking_away.confirmed_count()
    }
}
