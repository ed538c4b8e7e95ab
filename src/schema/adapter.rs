//! Adapter for turning vision.frame.v1 logs into pipeline input
//!
//! Parses frame logs (NDJSON or a JSON array), validates each record, and
//! produces the time-ordered observation stream the session pipeline
//! consumes. Ordering matters: debounce timing and event fan-out are
//! defined over monotonically advancing frames, so records are sorted by
//! timestamp before replay.

use crate::collaborators::FrameSource;
use crate::error::EngineError;
use crate::schema::frame::{FrameRecord, ValidationError};
use crate::types::{FrameObservation, RosterEntry};
use std::collections::VecDeque;

/// Adapter for parsing and validating frame logs
pub struct FrameLogAdapter;

impl FrameLogAdapter {
    /// Parse a JSON string containing an array of frame records
    pub fn parse_array(json: &str) -> Result<Vec<FrameRecord>, EngineError> {
        let records: Vec<FrameRecord> = serde_json::from_str(json)?;
        Ok(records)
    }

    /// Parse NDJSON (newline-delimited JSON) containing frame records
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<FrameRecord>, EngineError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<FrameRecord>(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => {
                    return Err(EngineError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }

    /// Validate a batch of records, returning one result per failure
    pub fn validate_records(records: &[FrameRecord]) -> Vec<ValidationResult> {
        records
            .iter()
            .enumerate()
            .filter_map(|(idx, record)| {
                record.validate().err().map(|error| ValidationResult {
                    index: idx,
                    frame_id: record.frame_id.clone(),
                    error,
                })
            })
            .collect()
    }

    /// Validate records and convert them into a time-ordered observation
    /// stream
    pub fn to_observations(records: Vec<FrameRecord>) -> Result<Vec<FrameObservation>, EngineError> {
        for record in &records {
            if let Err(e) = record.validate() {
                return Err(EngineError::InvalidFrame(e.to_string()));
            }
        }

        let mut observations: Vec<FrameObservation> = records
            .into_iter()
            .map(FrameRecord::into_observation)
            .collect();
        observations.sort_by_key(|o| o.timestamp);
        Ok(observations)
    }

    /// Derive a roster from the identified faces in a log.
    ///
    /// One entry per distinct identity, labeled with the first display name
    /// seen for it. Used by the replay CLI when no roster file is supplied.
    pub fn roster_from_records(records: &[FrameRecord]) -> Vec<RosterEntry> {
        let mut entries: Vec<RosterEntry> = Vec::new();
        for record in records {
            for face in &record.faces {
                let Some(identity) = face.identity.as_deref() else {
                    continue;
                };
                if entries.iter().any(|e| e.identity == identity) {
                    continue;
                }
                entries.push(RosterEntry::new(identity, &face.display_name));
            }
        }
        entries.sort_by(|a, b| a.identity.cmp(&b.identity));
        entries
    }
}

/// Result of a failed record validation
#[derive(Debug)]
pub struct ValidationResult {
    pub index: usize,
    pub frame_id: Option<String>,
    pub error: ValidationError,
}

/// A parsed frame log, replayable as a [`FrameSource`]
#[derive(Debug)]
pub struct FrameLog {
    frames: VecDeque<FrameObservation>,
}

impl FrameLog {
    /// Build a replayable log from parsed records
    pub fn new(records: Vec<FrameRecord>) -> Result<Self, EngineError> {
        let observations = FrameLogAdapter::to_observations(records)?;
        Ok(FrameLog {
            frames: observations.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Timestamp of the first (earliest) frame, if any
    pub fn first_timestamp(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.frames.front().map(|f| f.timestamp)
    }
}

impl FrameSource for FrameLog {
    fn next_frame(&mut self) -> Result<Option<FrameObservation>, EngineError> {
        Ok(self.frames.pop_front())
    }
}
