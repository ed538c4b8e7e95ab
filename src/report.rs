//! Session report generation
//!
//! At session end every entity record is reduced into one behavior-log
//! entry: mean attention over the recorded samples (0 when none), event
//! counters, and the whole-second span between first and last sighting.
//! Generation is a pure read of the session; it does not consume or guard
//! it, so calling it twice simply produces the same rows twice.

use crate::session::Session;
use crate::types::{BehaviorLogEntry, SessionReport};
use chrono::{DateTime, Utc};

/// Reduces a finished session into its report
pub struct SessionReportGenerator;

impl SessionReportGenerator {
    /// Build the report for `session` as of `ended_at`.
    ///
    /// A session with no observed entities yields an empty entry list; a
    /// zero-frame session is not an error.
    pub fn generate(session: &Session, ended_at: DateTime<Utc>) -> SessionReport {
        let session_date = ended_at.date_naive();

        let entries: Vec<BehaviorLogEntry> = session
            .records()
            .map(|record| BehaviorLogEntry {
                identity: record.identity.clone(),
                display_name: record.display_name.clone(),
                session_date,
                average_attention: record.average_attention(),
                hand_raises: record.hand_raise_count,
                looking_away_count: record.looking_away_count,
                duration_seconds: record.presence_seconds(),
            })
            .collect();

        SessionReport {
            session_id: session.id().to_string(),
            session_date,
            started_at: session.started_at(),
            ended_at,
            duration_seconds: (ended_at - session.started_at()).num_seconds().max(0),
            entries,
        }
    }
}
