//! Monitoring pipeline facade
//!
//! [`BehaviorMonitor`] owns the session behind a single mutual-exclusion
//! boundary and wires it to the collaborators: roster gating at start,
//! attendance and behavior-log sinks on the way out. Frame processing is
//! strictly sequential; a front-end thread may clone the monitor and read
//! snapshots concurrently while the worker feeds frames.

use crate::collaborators::{AttendanceSink, BehaviorLogSink, FrameSource, RosterQuery};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::report::SessionReportGenerator;
use crate::session::Session;
use crate::types::{FrameObservation, FrameOutcome, SessionReport, SessionSnapshot};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Behavioral monitoring pipeline: session lifecycle, per-frame updates,
/// and concurrent read-only snapshots.
///
/// Cloning is cheap and shares the underlying session; typical use is one
/// clone driving frames on a worker thread while another answers snapshot
/// queries for a front end.
#[derive(Clone)]
pub struct BehaviorMonitor {
    config: EngineConfig,
    roster: Arc<dyn RosterQuery>,
    attendance: Arc<dyn AttendanceSink>,
    behavior_log: Arc<dyn BehaviorLogSink>,
    session: Arc<Mutex<Option<Session>>>,
}

impl BehaviorMonitor {
    pub fn new(
        config: EngineConfig,
        roster: Arc<dyn RosterQuery>,
        attendance: Arc<dyn AttendanceSink>,
        behavior_log: Arc<dyn BehaviorLogSink>,
    ) -> Self {
        BehaviorMonitor {
            config,
            roster,
            attendance,
            behavior_log,
            session: Arc::new(Mutex::new(None)),
        }
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a monitoring session at `now`.
    ///
    /// Refused when the roster is empty or a session is already running.
    /// Returns the new session's id.
    pub fn start_session(&self, now: DateTime<Utc>) -> Result<String, EngineError> {
        let known = self.roster.list_known_identities()?;
        if known.is_empty() {
            return Err(EngineError::EmptyRoster);
        }

        let mut guard = self.lock_session();
        if guard.is_some() {
            return Err(EngineError::SessionAlreadyActive);
        }

        let session = Session::start(&self.config, now);
        let id = session.id().to_string();
        info!(
            "monitoring session {} started ({} registered identities)",
            id,
            known.len()
        );
        *guard = Some(session);
        Ok(id)
    }

    /// Whether a session is currently running
    pub fn is_active(&self) -> bool {
        self.lock_session().is_some()
    }

    /// Fold one frame into the active session.
    ///
    /// Attendance marks fired by the frame are forwarded to the attendance
    /// sink outside the session lock; sink failures are logged and dropped,
    /// never surfaced into frame processing.
    pub fn process_frame(&self, frame: &FrameObservation) -> Result<FrameOutcome, EngineError> {
        let outcome = {
            let mut guard = self.lock_session();
            let session = guard.as_mut().ok_or(EngineError::NoActiveSession)?;
            session.observe_frame(frame)
        };

        for record in &outcome.attendance_marked {
            info!(
                "attendance marked for {} ({}) at {}",
                record.display_name, record.identity, record.time_in
            );
            if let Err(e) = self.attendance.mark_attendance(record) {
                warn!("attendance sink failed for {}: {}", record.identity, e);
            }
        }

        if outcome.hand_raise_confirmed {
            debug!("hand raise confirmed at {}", frame.timestamp);
        }
        if outcome.looking_away_confirmed {
            debug!("looking away confirmed at {}", frame.timestamp);
        }

        Ok(outcome)
    }

    /// Read-only snapshot of the running session, `None` when idle
    pub fn snapshot(&self, now: DateTime<Utc>) -> Option<SessionSnapshot> {
        self.lock_session().as_ref().map(|s| s.snapshot(now))
    }

    /// Zero behavioral counters of the running session without ending it
    pub fn reset_statistics(&self) -> Result<(), EngineError> {
        let mut guard = self.lock_session();
        let session = guard.as_mut().ok_or(EngineError::NoActiveSession)?;
        session.reset_statistics();
        info!("session {} statistics reset", session.id());
        Ok(())
    }

    /// End the active session, generate its report, and forward every entry
    /// to the behavior-log sink.
    ///
    /// The session is consumed; a second call without a new `start_session`
    /// returns [`EngineError::NoActiveSession`].
    pub fn end_session(&self, now: DateTime<Utc>) -> Result<SessionReport, EngineError> {
        let session = self
            .lock_session()
            .take()
            .ok_or(EngineError::NoActiveSession)?;

        let report = SessionReportGenerator::generate(&session, now);
        for entry in &report.entries {
            if let Err(e) = self.behavior_log.log_behavior(entry) {
                warn!("behavior log sink failed for {}: {}", entry.identity, e);
            }
        }

        info!(
            "session {} ended after {}s with {} entities",
            report.session_id,
            report.duration_seconds,
            report.entries.len()
        );
        Ok(report)
    }

    /// Drive the active session over a frame source until it is exhausted
    /// or `stop` is raised, then end the session.
    ///
    /// Cancellation is cooperative: the flag is checked before each frame is
    /// pulled, and the report is generated synchronously afterwards. The
    /// session ends at the last processed frame's timestamp, or at the wall
    /// clock for a zero-frame run.
    pub fn run<S: FrameSource>(
        &self,
        source: &mut S,
        stop: &AtomicBool,
    ) -> Result<SessionReport, EngineError> {
        let mut last_timestamp = None;

        while !stop.load(Ordering::Relaxed) {
            match source.next_frame()? {
                Some(frame) => {
                    self.process_frame(&frame)?;
                    last_timestamp = Some(frame.timestamp);
                }
                None => break,
            }
        }

        let ended_at = last_timestamp.unwrap_or_else(Utc::now);
        self.end_session(ended_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{MemoryAttendanceSink, MemoryBehaviorLog, MemoryRoster};
    use crate::types::{HeadPose, ObservedFace, RosterEntry};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 11, 10, 0, 0).unwrap()
    }

    struct Fixture {
        monitor: BehaviorMonitor,
        attendance: Arc<MemoryAttendanceSink>,
        behavior_log: Arc<MemoryBehaviorLog>,
    }

    fn fixture_with_roster(entries: Vec<RosterEntry>) -> Fixture {
        let attendance = Arc::new(MemoryAttendanceSink::new());
        let behavior_log = Arc::new(MemoryBehaviorLog::new());
        let monitor = BehaviorMonitor::new(
            EngineConfig::new(),
            Arc::new(MemoryRoster::new(entries)),
            attendance.clone(),
            behavior_log.clone(),
        );
        Fixture {
            monitor,
            attendance,
            behavior_log,
        }
    }

    fn fixture() -> Fixture {
        fixture_with_roster(vec![
            RosterEntry::new("S001", "Alice"),
            RosterEntry::new("S002", "Bob"),
        ])
    }

    fn frame(ms: i64, faces: Vec<ObservedFace>, hand: bool, pose: Option<HeadPose>) -> FrameObservation {
        FrameObservation {
            timestamp: t0() + Duration::milliseconds(ms),
            faces,
            hand_raised: hand,
            pose,
        }
    }

    #[test]
    fn test_empty_roster_refuses_session() {
        let f = fixture_with_roster(vec![]);
        let result = f.monitor.start_session(t0());
        assert!(matches!(result, Err(EngineError::EmptyRoster)));
        assert!(!f.monitor.is_active());
    }

    #[test]
    fn test_double_start_refused() {
        let f = fixture();
        f.monitor.start_session(t0()).unwrap();
        let result = f.monitor.start_session(t0());
        assert!(matches!(result, Err(EngineError::SessionAlreadyActive)));
    }

    #[test]
    fn test_frame_without_session_is_an_error() {
        let f = fixture();
        let result = f.monitor.process_frame(&frame(0, vec![], false, None));
        assert!(matches!(result, Err(EngineError::NoActiveSession)));
    }

    #[test]
    fn test_attendance_forwarded_once_per_identity() {
        let f = fixture();
        f.monitor.start_session(t0()).unwrap();

        for ms in [0, 100, 200] {
            f.monitor
                .process_frame(&frame(
                    ms,
                    vec![ObservedFace::identified("S001", "Alice")],
                    false,
                    None,
                ))
                .unwrap();
        }

        let marks = f.attendance.records();
        assert_eq!(marks.len(), 1);
        assert_eq!(marks[0].identity, "S001");
    }

    #[test]
    fn test_end_session_logs_behavior_and_consumes() {
        let f = fixture();
        f.monitor.start_session(t0()).unwrap();

        let mut ms = 0;
        while ms <= 1200 {
            f.monitor
                .process_frame(&frame(
                    ms,
                    vec![
                        ObservedFace::identified("S001", "Alice"),
                        ObservedFace::identified("S002", "Bob"),
                    ],
                    true,
                    Some(HeadPose {
                        yaw: 10.0,
                        pitch: 0.0,
                        roll: 0.0,
                    }),
                ))
                .unwrap();
            ms += 100;
        }

        let report = f
            .monitor
            .end_session(t0() + Duration::seconds(60))
            .unwrap();
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.duration_seconds, 60);

        // Both entities got the fanned-out hand raise.
        for entry in &report.entries {
            assert_eq!(entry.hand_raises, 1);
        }

        // Every entry went to the sink, and the session is gone.
        assert_eq!(f.behavior_log.entries().len(), 2);
        assert!(!f.monitor.is_active());
        assert!(matches!(
            f.monitor.end_session(t0() + Duration::seconds(61)),
            Err(EngineError::NoActiveSession)
        ));
    }

    #[test]
    fn test_zero_frame_session_reports_empty() {
        let f = fixture();
        f.monitor.start_session(t0()).unwrap();
        let report = f.monitor.end_session(t0() + Duration::seconds(5)).unwrap();

        assert!(report.entries.is_empty());
        assert!(f.behavior_log.entries().is_empty());
    }

    #[test]
    fn test_snapshot_while_active() {
        let f = fixture();
        assert!(f.monitor.snapshot(t0()).is_none());

        f.monitor.start_session(t0()).unwrap();
        f.monitor
            .process_frame(&frame(
                0,
                vec![ObservedFace::identified("S001", "Alice")],
                false,
                None,
            ))
            .unwrap();

        let snapshot = f.monitor.snapshot(t0() + Duration::seconds(30)).unwrap();
        assert_eq!(snapshot.entity_count, 1);
        assert_eq!(snapshot.elapsed_seconds, 30);
    }

    #[test]
    fn test_snapshot_from_clone_shares_session() {
        let f = fixture();
        f.monitor.start_session(t0()).unwrap();

        let reader = f.monitor.clone();
        f.monitor
            .process_frame(&frame(
                0,
                vec![ObservedFace::identified("S002", "Bob")],
                false,
                None,
            ))
            .unwrap();

        let snapshot = reader.snapshot(t0() + Duration::seconds(1)).unwrap();
        assert_eq!(snapshot.entity_count, 1);
        assert_eq!(snapshot.entities[0].identity, "S002");
    }

    #[test]
    fn test_run_drains_source_and_reports() {
        struct ScriptedSource {
            frames: Vec<FrameObservation>,
        }
        impl FrameSource for ScriptedSource {
            fn next_frame(&mut self) -> Result<Option<FrameObservation>, EngineError> {
                if self.frames.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(self.frames.remove(0)))
                }
            }
        }

        let f = fixture();
        f.monitor.start_session(t0()).unwrap();

        let mut source = ScriptedSource {
            frames: (0..20)
                .map(|i| {
                    frame(
                        i * 100,
                        vec![ObservedFace::identified("S001", "Alice")],
                        i >= 5, // hand goes up at 0.5 s and stays up
                        None,
                    )
                })
                .collect(),
        };

        let stop = AtomicBool::new(false);
        let report = f.monitor.run(&mut source, &stop).unwrap();

        assert_eq!(report.entries.len(), 1);
        // Hand held from 0.5 s through 1.9 s sustains past 1.0 s: one event.
        assert_eq!(report.entries[0].hand_raises, 1);
        // Session ended at the last frame's timestamp.
        assert_eq!(report.ended_at, t0() + Duration::milliseconds(1900));
        assert!(!f.monitor.is_active());
    }

    #[test]
    fn test_run_honors_stop_flag() {
        struct EndlessSource;
        impl FrameSource for EndlessSource {
            fn next_frame(&mut self) -> Result<Option<FrameObservation>, EngineError> {
                Ok(Some(FrameObservation {
                    timestamp: Utc::now(),
                    faces: vec![],
                    hand_raised: false,
                    pose: None,
                }))
            }
        }

        let f = fixture();
        f.monitor.start_session(t0()).unwrap();

        // Raised before the run: the loop exits before pulling any frame.
        let stop = AtomicBool::new(true);
        let report = f.monitor.run(&mut EndlessSource, &stop).unwrap();
        assert!(report.entries.is_empty());
    }
}
