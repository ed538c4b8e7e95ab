//! Collaborator boundaries
//!
//! The engine delegates everything that touches the outside world: frames
//! arrive from vision collaborators already reduced to identification,
//! gesture, and pose signals; attendance marks and behavior-log entries
//! leave through sinks; the roster decides whether a session may start at
//! all. Each boundary is a capability trait so concrete backends can be
//! selected at runtime and injected at session start.
//!
//! The in-memory implementations back the CLI replay path and tests.

use crate::error::EngineError;
use crate::types::{
    AttendanceRecord, BehaviorLogEntry, BehaviorSummary, FrameObservation, RosterEntry,
};
use std::sync::Mutex;

/// Upstream boundary: one fused observation per frame.
///
/// Identification, gesture detection, and pose estimation run outside the
/// engine; whatever combination of backends is wired in, the engine only
/// sees their per-frame output. `Ok(None)` means the stream is exhausted.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<FrameObservation>, EngineError>;
}

/// Downstream sink for attendance marks. Fire-and-forget: failures are
/// logged by the caller, never propagated into frame processing.
pub trait AttendanceSink: Send + Sync {
    fn mark_attendance(&self, record: &AttendanceRecord) -> Result<(), EngineError>;
}

/// Downstream sink for per-entity behavior-log entries at session end
pub trait BehaviorLogSink: Send + Sync {
    fn log_behavior(&self, entry: &BehaviorLogEntry) -> Result<(), EngineError>;
}

/// Registered-identity lookup; a session may only start when non-empty
pub trait RosterQuery: Send + Sync {
    fn list_known_identities(&self) -> Result<Vec<RosterEntry>, EngineError>;
}

/// In-memory roster
#[derive(Debug, Default)]
pub struct MemoryRoster {
    entries: Vec<RosterEntry>,
}

impl MemoryRoster {
    pub fn new(entries: Vec<RosterEntry>) -> Self {
        MemoryRoster { entries }
    }

    pub fn add(&mut self, entry: RosterEntry) {
        self.entries.push(entry);
    }
}

impl RosterQuery for MemoryRoster {
    fn list_known_identities(&self) -> Result<Vec<RosterEntry>, EngineError> {
        Ok(self.entries.clone())
    }
}

/// In-memory attendance sink that records every mark it receives
#[derive(Debug, Default)]
pub struct MemoryAttendanceSink {
    records: Mutex<Vec<AttendanceRecord>>,
}

impl MemoryAttendanceSink {
    pub fn new() -> Self {
        MemoryAttendanceSink::default()
    }

    /// All marks received so far
    pub fn records(&self) -> Vec<AttendanceRecord> {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl AttendanceSink for MemoryAttendanceSink {
    fn mark_attendance(&self, record: &AttendanceRecord) -> Result<(), EngineError> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        Ok(())
    }
}

/// In-memory behavior log with per-identity history and aggregates
#[derive(Debug, Default)]
pub struct MemoryBehaviorLog {
    entries: Mutex<Vec<BehaviorLogEntry>>,
}

impl MemoryBehaviorLog {
    pub fn new() -> Self {
        MemoryBehaviorLog::default()
    }

    /// All logged entries in insertion order
    pub fn entries(&self) -> Vec<BehaviorLogEntry> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Logged entries for one identity
    pub fn history_for(&self, identity: &str) -> Vec<BehaviorLogEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.identity == identity)
            .collect()
    }

    /// Cross-session aggregate for one identity, `None` if never logged
    pub fn summary_for(&self, identity: &str) -> Option<BehaviorSummary> {
        let history = self.history_for(identity);
        if history.is_empty() {
            return None;
        }

        let sessions = history.len() as u32;
        let average_attention =
            history.iter().map(|e| e.average_attention).sum::<f64>() / sessions as f64;

        Some(BehaviorSummary {
            identity: identity.to_string(),
            sessions,
            average_attention,
            total_hand_raises: history.iter().map(|e| e.hand_raises).sum(),
            total_looking_away: history.iter().map(|e| e.looking_away_count).sum(),
        })
    }
}

impl BehaviorLogSink for MemoryBehaviorLog {
    fn log_behavior(&self, entry: &BehaviorLogEntry) -> Result<(), EngineError> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(identity: &str, attention: f64, hand_raises: u32) -> BehaviorLogEntry {
        BehaviorLogEntry {
            identity: identity.to_string(),
            display_name: identity.to_string(),
            session_date: NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
            average_attention: attention,
            hand_raises,
            looking_away_count: 1,
            duration_seconds: 600,
        }
    }

    #[test]
    fn test_memory_roster_lists_entries() {
        let mut roster = MemoryRoster::default();
        assert!(roster.list_known_identities().unwrap().is_empty());

        roster.add(RosterEntry::new("S001", "Alice"));
        roster.add(RosterEntry::new("S002", "Bob"));

        let known = roster.list_known_identities().unwrap();
        assert_eq!(known.len(), 2);
        assert_eq!(known[0].identity, "S001");
    }

    #[test]
    fn test_behavior_log_history_filters_by_identity() {
        let log = MemoryBehaviorLog::new();
        log.log_behavior(&entry("S001", 80.0, 2)).unwrap();
        log.log_behavior(&entry("S002", 50.0, 0)).unwrap();
        log.log_behavior(&entry("S001", 60.0, 1)).unwrap();

        assert_eq!(log.entries().len(), 3);
        assert_eq!(log.history_for("S001").len(), 2);
        assert_eq!(log.history_for("S003").len(), 0);
    }

    #[test]
    fn test_behavior_summary_aggregates_sessions() {
        let log = MemoryBehaviorLog::new();
        log.log_behavior(&entry("S001", 80.0, 2)).unwrap();
        log.log_behavior(&entry("S001", 60.0, 1)).unwrap();

        let summary = log.summary_for("S001").unwrap();
        assert_eq!(summary.sessions, 2);
        assert!((summary.average_attention - 70.0).abs() < 1e-9);
        assert_eq!(summary.total_hand_raises, 3);
        assert_eq!(summary.total_looking_away, 2);

        assert!(log.summary_for("S999").is_none());
    }

    #[test]
    fn test_attendance_sink_records_marks() {
        let sink = MemoryAttendanceSink::new();
        assert!(sink.records().is_empty());

        let record = AttendanceRecord {
            identity: "S001".to_string(),
            display_name: "Alice".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
            time_in: chrono::NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            status: crate::types::AttendanceStatus::Present,
        };
        sink.mark_attendance(&record).unwrap();

        assert_eq!(sink.records().len(), 1);
        assert_eq!(sink.records()[0].identity, "S001");
    }
}
