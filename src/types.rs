//! Core types for the Aula behavioral pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: per-frame observations from the vision collaborators, running
//! per-entity session state, and the reduced session outputs.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Head pose angles in degrees, as reported by the pose collaborator.
///
/// Yaw is rotation left/right, pitch up/down. Roll is carried for
/// completeness but does not participate in attention scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadPose {
    pub yaw: f64,
    pub pitch: f64,
    #[serde(default)]
    pub roll: f64,
}

/// Pixel-space bounding region of a detected face (top, right, bottom, left)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingRegion {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

/// A face reported by the identification collaborator for one frame.
///
/// `identity = None` means the face was detected but could not be matched
/// to a registered person; such entries never create or update session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservedFace {
    /// Opaque identity key, absent for unmatched detections
    pub identity: Option<String>,
    /// Display label supplied by the identification collaborator
    pub display_name: String,
    /// Where the face was found in the frame
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_region: Option<BoundingRegion>,
    /// Match confidence (0-1), 0 for unmatched detections
    #[serde(default)]
    pub match_confidence: f64,
}

impl ObservedFace {
    /// An identified face with the given key and label
    pub fn identified(identity: impl Into<String>, display_name: impl Into<String>) -> Self {
        ObservedFace {
            identity: Some(identity.into()),
            display_name: display_name.into(),
            bounding_region: None,
            match_confidence: 1.0,
        }
    }

    /// A detected but unmatched face
    pub fn unidentified() -> Self {
        ObservedFace {
            identity: None,
            display_name: "Unknown".to_string(),
            bounding_region: None,
            match_confidence: 0.0,
        }
    }
}

/// Everything the upstream collaborators produced for a single frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameObservation {
    /// When the frame was captured
    pub timestamp: DateTime<Utc>,
    /// Identification results (possibly empty, possibly containing
    /// unidentified detections)
    pub faces: Vec<ObservedFace>,
    /// Raw hand-raised signal from the gesture collaborator
    pub hand_raised: bool,
    /// Head pose if a face/pose was solved this frame, absent otherwise
    pub pose: Option<HeadPose>,
}

/// Output of the attention scorer for one pose reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttentionReading {
    /// Attention score in [0, 100]
    pub score: f64,
    /// Whether the pose exceeds the looking-away thresholds
    pub looking_away: bool,
}

/// Running state accumulated for one identified entity over a session.
///
/// Created lazily on the first frame an identity is recognized; never
/// removed mid-session. Absence in a frame leaves the record untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySessionRecord {
    /// Opaque identity key
    pub identity: String,
    /// Display label from the identification collaborator
    pub display_name: String,
    /// First frame this identity was recognized
    pub first_seen: DateTime<Utc>,
    /// Most recent frame this identity was recognized
    pub last_seen: DateTime<Utc>,
    /// Confirmed hand-raise events credited to this entity
    pub hand_raise_count: u32,
    /// Confirmed looking-away events credited to this entity
    pub looking_away_count: u32,
    /// One attention score per pose-bearing frame while active
    pub attention_samples: Vec<f64>,
    /// Frames in which this identity was recognized
    pub frame_count: u64,
}

impl EntitySessionRecord {
    /// Create a fresh record for an identity first recognized at `now`
    pub fn new(
        identity: impl Into<String>,
        display_name: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        EntitySessionRecord {
            identity: identity.into(),
            display_name: display_name.into(),
            first_seen: now,
            last_seen: now,
            hand_raise_count: 0,
            looking_away_count: 0,
            attention_samples: Vec::new(),
            frame_count: 0,
        }
    }

    /// Arithmetic mean of recorded attention samples, 0 when none exist
    pub fn average_attention(&self) -> f64 {
        if self.attention_samples.is_empty() {
            return 0.0;
        }
        self.attention_samples.iter().sum::<f64>() / self.attention_samples.len() as f64
    }

    /// Whole seconds between first and last sighting, non-negative
    pub fn presence_seconds(&self) -> i64 {
        (self.last_seen - self.first_seen).num_seconds().max(0)
    }
}

/// Attendance status recorded with a mark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
}

impl Default for AttendanceStatus {
    fn default() -> Self {
        AttendanceStatus::Present
    }
}

/// Attendance mark emitted at most once per identity per session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub identity: String,
    pub display_name: String,
    /// Calendar date of the first sighting
    pub date: NaiveDate,
    /// Time of day of the first sighting
    pub time_in: NaiveTime,
    #[serde(default)]
    pub status: AttendanceStatus,
}

/// One persisted behavior-log row per entity, emitted at session end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorLogEntry {
    pub identity: String,
    pub display_name: String,
    pub session_date: NaiveDate,
    /// Mean attention score over the session, 0 when no samples
    pub average_attention: f64,
    pub hand_raises: u32,
    pub looking_away_count: u32,
    /// Seconds between the entity's first and last sighting
    pub duration_seconds: i64,
}

/// Reduced output of a finished session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Unique session instance id
    pub session_id: String,
    /// Calendar date the session ended on
    pub session_date: NaiveDate,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Whole-session duration in seconds
    pub duration_seconds: i64,
    /// One entry per entity observed during the session
    pub entries: Vec<BehaviorLogEntry>,
}

/// Live per-entity row in a session snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub identity: String,
    pub display_name: String,
    /// Mean attention so far, 0 when no samples yet
    pub average_attention: f64,
    pub hand_raises: u32,
    pub looking_away_count: u32,
    pub frame_count: u64,
    pub last_seen: DateTime<Utc>,
}

/// Read-only view of the running session, safe to take while frames
/// are being processed on another thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    /// Seconds elapsed since session start
    pub elapsed_seconds: i64,
    /// Number of entities observed so far
    pub entity_count: usize,
    /// Session-wide confirmed hand raises (detector total)
    pub hand_raise_confirmations: u32,
    /// Session-wide confirmed looking-away events (detector total)
    pub looking_away_confirmations: u32,
    /// Mean of per-entity attention means, over entities with samples
    pub average_attention: f64,
    pub entities: Vec<EntitySnapshot>,
}

/// What a single frame update produced
#[derive(Debug, Clone, Default)]
pub struct FrameOutcome {
    /// Attendance marks fired this frame (first sighting of an identity)
    pub attendance_marked: Vec<AttendanceRecord>,
    /// A hand-raise event was confirmed this frame
    pub hand_raise_confirmed: bool,
    /// A looking-away event was confirmed this frame
    pub looking_away_confirmed: bool,
    /// Attention reading for this frame, absent when no pose was available
    pub attention: Option<AttentionReading>,
}

/// A registered identity known to the roster collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub identity: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

impl RosterEntry {
    /// A roster entry with just an identity key and display label
    pub fn new(identity: impl Into<String>, display_name: impl Into<String>) -> Self {
        RosterEntry {
            identity: identity.into(),
            display_name: display_name.into(),
            email: None,
            class_name: None,
        }
    }
}

/// Cross-session aggregate for one identity, computed from logged entries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorSummary {
    pub identity: String,
    /// Number of logged sessions
    pub sessions: u32,
    /// Mean of per-session average attention
    pub average_attention: f64,
    pub total_hand_raises: u32,
    pub total_looking_away: u32,
}
