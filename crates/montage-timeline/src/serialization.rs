//! Timeline serialization with versioning and migration.
//!
//! Uses JSON with a schema version field. Undo snapshots sent to the store
//! use the same encoding.

use montage_core::{MontageError, Result};
use serde::{Deserialize, Serialize};

use crate::timeline::Timeline;

/// Current schema version.
pub const CURRENT_VERSION: u32 = 2;

/// Versioned timeline file wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineFile {
    /// Schema version for migration.
    pub version: u32,
    pub timeline: Timeline,
    /// Application version that wrote this file.
    pub app_version: String,
}

impl TimelineFile {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            version: CURRENT_VERSION,
            timeline,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Serialize to JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| MontageError::Serialization(format!("Failed to serialize timeline: {}", e)))
    }

    /// Deserialize from JSON bytes, applying migrations if needed.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_slice(data)
            .map_err(|e| MontageError::Serialization(format!("Invalid JSON: {}", e)))?;

        let version = raw.get("version").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
        if version > CURRENT_VERSION {
            return Err(MontageError::Serialization(format!(
                "Timeline file version {} is newer than supported version {}",
                version, CURRENT_VERSION
            )));
        }

        let migrated = migrate(raw, version)?;
        serde_json::from_value(migrated)
            .map_err(|e| MontageError::Serialization(format!("Failed to parse timeline: {}", e)))
    }

    pub fn load_from_file(path: &std::path::Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_json(&data)
    }
}

/// Apply sequential migrations from `from_version` to CURRENT_VERSION.
fn migrate(mut data: serde_json::Value, from_version: u32) -> Result<serde_json::Value> {
    let mut version = from_version;

    while version < CURRENT_VERSION {
        match version {
            0 => {
                // v0 → v1: bare timeline without a wrapper
                if data.get("version").is_none() {
                    data = serde_json::json!({
                        "version": 1,
                        "timeline": data,
                        "app_version": "0.1.0",
                    });
                }
                version = 1;
            }
            1 => {
                // v1 → v2: transitions gained a direction parameter
                if let Some(transitions) = data
                    .pointer_mut("/timeline/transitions")
                    .and_then(|t| t.as_array_mut())
                {
                    for transition in transitions {
                        let default = match transition.get("type").and_then(|t| t.as_str()) {
                            Some("Zoom") => "in",
                            Some("Rotate") => "right",
                            _ => "left",
                        };
                        if let Some(obj) = transition.as_object_mut() {
                            obj.entry("direction").or_insert_with(|| default.into());
                        }
                    }
                }
                if let Some(obj) = data.as_object_mut() {
                    obj.insert("version".to_string(), 2.into());
                }
                version = 2;
            }
            _ => {
                return Err(MontageError::Serialization(format!(
                    "No migration path from version {}",
                    version
                )));
            }
        }
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::LayerIndex;
    use crate::segment::Segment;
    use crate::transition::Direction;

    fn sample() -> Timeline {
        Timeline::from_parts(
            vec![
                Segment::video("intro.mp4", LayerIndex::visual(0), 0.0, 4.0, 0.0, (1920, 1080)),
                Segment::audio("bed.mp3", LayerIndex::audio(0), 0.0, 8.0, 2.0),
            ],
            Vec::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_roundtrip() {
        let file = TimelineFile::new(sample());
        let data = file.to_json().unwrap();
        let loaded = TimelineFile::from_json(&data).unwrap();
        assert_eq!(loaded.version, CURRENT_VERSION);
        assert_eq!(loaded.timeline, file.timeline);
    }

    #[test]
    fn test_bare_timeline_migrates() {
        let bare = serde_json::to_vec(&sample()).unwrap();
        let loaded = TimelineFile::from_json(&bare).unwrap();
        assert_eq!(loaded.version, CURRENT_VERSION);
        assert_eq!(loaded.timeline.segment_count(), 2);
    }

    #[test]
    fn test_v1_transitions_get_direction() {
        let seg = Segment::image("a.png", LayerIndex::visual(0), 0.0, 3.0, (10, 10))
            .with_id(crate::id::SegmentId::canonical("s1"));
        let data = serde_json::json!({
            "version": 1,
            "app_version": "0.1.0",
            "timeline": {
                "segments": [seg],
                "transitions": [{
                    "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
                    "segmentId": {"canonical": "s1"},
                    "layer": 0,
                    "boundary": "start",
                    "type": "Zoom",
                    "duration": 1.0,
                    "timelineStartTime": 0.0
                }]
            }
        });
        let loaded = TimelineFile::from_json(&serde_json::to_vec(&data).unwrap()).unwrap();
        assert_eq!(loaded.timeline.transitions()[0].direction, Direction::In);
    }

    #[test]
    fn test_future_version_rejected() {
        let data = br#"{"version": 99, "timeline": {"segments": []}, "app_version": "9.0.0"}"#;
        assert!(TimelineFile::from_json(data).is_err());
    }
}
