//! vision.frame.v1 schema definition
//!
//! One record per captured frame, carrying the fused output of the vision
//! collaborators: identification results, the raw hand-raised signal, and
//! the solved head pose when one was available. Captured sessions are
//! written as NDJSON frame logs and can be replayed through the full
//! pipeline offline.

use crate::types::{FrameObservation, HeadPose, ObservedFace};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current schema version
pub const SCHEMA_VERSION: &str = "vision.frame.v1";

/// Pose angles are rejected outside this bound (degrees)
const MAX_ANGLE_DEG: f64 = 180.0;

/// The main vision.frame.v1 record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Schema version identifier
    pub schema_version: String,
    /// Unique frame identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<String>,
    /// Capture timestamp (UTC)
    pub timestamp: DateTime<Utc>,
    /// Identification results for this frame
    #[serde(default)]
    pub faces: Vec<ObservedFace>,
    /// Raw hand-raised signal from the gesture collaborator
    #[serde(default)]
    pub hand_raised: bool,
    /// Head pose if one was solved this frame
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pose: Option<HeadPose>,
}

impl FrameRecord {
    /// Create an empty record for a frame captured at `timestamp`
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        FrameRecord {
            schema_version: SCHEMA_VERSION.to_string(),
            frame_id: Some(uuid::Uuid::new_v4().to_string()),
            timestamp,
            faces: Vec::new(),
            hand_raised: false,
            pose: None,
        }
    }

    /// Attach identification results
    pub fn with_faces(mut self, faces: Vec<ObservedFace>) -> Self {
        self.faces = faces;
        self
    }

    /// Set the raw hand-raised signal
    pub fn with_hand_raised(mut self, hand_raised: bool) -> Self {
        self.hand_raised = hand_raised;
        self
    }

    /// Attach a solved head pose
    pub fn with_pose(mut self, pose: HeadPose) -> Self {
        self.pose = Some(pose);
        self
    }

    /// Validate the record against the schema
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ValidationError::InvalidSchemaVersion {
                expected: SCHEMA_VERSION.to_string(),
                actual: self.schema_version.clone(),
            });
        }

        for face in &self.faces {
            if !(0.0..=1.0).contains(&face.match_confidence) {
                return Err(ValidationError::ConfidenceOutOfRange {
                    value: face.match_confidence,
                });
            }
        }

        if let Some(pose) = &self.pose {
            for (axis, value) in [("yaw", pose.yaw), ("pitch", pose.pitch), ("roll", pose.roll)] {
                if !value.is_finite() || value.abs() > MAX_ANGLE_DEG {
                    return Err(ValidationError::AngleOutOfRange {
                        axis: axis.to_string(),
                        value,
                    });
                }
            }
        }

        Ok(())
    }

    /// Convert into the observation fed to the session pipeline
    pub fn into_observation(self) -> FrameObservation {
        FrameObservation {
            timestamp: self.timestamp,
            faces: self.faces,
            hand_raised: self.hand_raised,
            pose: self.pose,
        }
    }
}

/// Validation errors for frame records
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid schema version: expected {expected}, got {actual}")]
    InvalidSchemaVersion { expected: String, actual: String },

    #[error("Match confidence out of range [0, 1]: {value}")]
    ConfidenceOutOfRange { value: f64 },

    #[error("Pose {axis} out of range [-180, 180]: {value}")]
    AngleOutOfRange { axis: String, value: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 11, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_serialize_frame_record() {
        let record = FrameRecord::new(t0())
            .with_faces(vec![ObservedFace::identified("S001", "Alice")])
            .with_hand_raised(true)
            .with_pose(HeadPose {
                yaw: 5.0,
                pitch: -2.0,
                roll: 0.5,
            });

        let json = serde_json::to_string_pretty(&record).unwrap();
        assert!(json.contains("vision.frame.v1"));
        assert!(json.contains("S001"));
        assert!(json.contains("hand_raised"));
    }

    #[test]
    fn test_deserialize_minimal_record() {
        let json = r#"{
            "schema_version": "vision.frame.v1",
            "timestamp": "2024-03-11T10:00:00Z"
        }"#;

        let record: FrameRecord = serde_json::from_str(json).unwrap();
        assert!(record.faces.is_empty());
        assert!(!record.hand_raised);
        assert!(record.pose.is_none());
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_wrong_schema_version() {
        let mut record = FrameRecord::new(t0());
        record.schema_version = "vision.frame.v0".to_string();

        assert!(matches!(
            record.validate(),
            Err(ValidationError::InvalidSchemaVersion { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_confidence() {
        let mut face = ObservedFace::identified("S001", "Alice");
        face.match_confidence = 1.3;
        let record = FrameRecord::new(t0()).with_faces(vec![face]);

        assert!(matches!(
            record.validate(),
            Err(ValidationError::ConfidenceOutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_out_of_range_angles() {
        let record = FrameRecord::new(t0()).with_pose(HeadPose {
            yaw: 200.0,
            pitch: 0.0,
            roll: 0.0,
        });

        assert!(matches!(
            record.validate(),
            Err(ValidationError::AngleOutOfRange { .. })
        ));

        let record = FrameRecord::new(t0()).with_pose(HeadPose {
            yaw: f64::NAN,
            pitch: 0.0,
            roll: 0.0,
        });
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_into_observation_preserves_signals() {
        let record = FrameRecord::new(t0())
            .with_faces(vec![ObservedFace::identified("S001", "Alice")])
            .with_hand_raised(true);

        let observation = record.into_observation();
        assert_eq!(observation.timestamp, t0());
        assert_eq!(observation.faces.len(), 1);
        assert!(observation.hand_raised);
        assert!(observation.pose.is_none());
    }
}
