//! Identifiers for segments, transitions and layers.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of a segment.
///
/// Segments are created locally with a provisional id and receive their
/// canonical id once the project store confirms them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SegmentId {
    Provisional(Uuid),
    Canonical(String),
}

impl SegmentId {
    /// Generate a fresh provisional id.
    pub fn provisional() -> Self {
        Self::Provisional(Uuid::new_v4())
    }

    /// Wrap an id issued by the project store.
    pub fn canonical(id: impl Into<String>) -> Self {
        Self::Canonical(id.into())
    }

    pub fn is_provisional(&self) -> bool {
        matches!(self, Self::Provisional(_))
    }

    /// The store-issued id, if this segment has been confirmed.
    pub fn as_canonical(&self) -> Option<&str> {
        match self {
            Self::Canonical(id) => Some(id),
            Self::Provisional(_) => None,
        }
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provisional(uuid) => write!(f, "local-{}", uuid),
            Self::Canonical(id) => f.write_str(id),
        }
    }
}

/// Identity of a transition. Transition ids are generated locally and
/// accepted by the store as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionId(pub Uuid);

impl TransitionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransitionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a layer.
///
/// Non-negative indices are visual layers stacked bottom-to-top; negative
/// indices are audio layers, where `-(n + 1)` is the n-th audio layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerIndex(pub i32);

impl LayerIndex {
    /// The n-th visual layer.
    pub const fn visual(n: u32) -> Self {
        Self(n as i32)
    }

    /// The n-th audio layer.
    pub const fn audio(n: u32) -> Self {
        Self(-(n as i32) - 1)
    }

    pub fn is_audio(self) -> bool {
        self.0 < 0
    }

    pub fn is_visual(self) -> bool {
        self.0 >= 0
    }

    /// Position among the layers of the same class.
    pub fn ordinal(self) -> u32 {
        if self.0 < 0 {
            (-(self.0 + 1)) as u32
        } else {
            self.0 as u32
        }
    }
}

impl fmt::Display for LayerIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_audio() {
            write!(f, "A{}", self.ordinal() + 1)
        } else {
            write!(f, "V{}", self.ordinal() + 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_index_classes() {
        assert_eq!(LayerIndex::audio(0), LayerIndex(-1));
        assert_eq!(LayerIndex::audio(2), LayerIndex(-3));
        assert!(LayerIndex::audio(0).is_audio());
        assert!(LayerIndex::visual(0).is_visual());
        assert_eq!(LayerIndex(-3).ordinal(), 2);
        assert_eq!(LayerIndex::visual(1).to_string(), "V2");
        assert_eq!(LayerIndex::audio(0).to_string(), "A1");
    }

    #[test]
    fn test_segment_id_roundtrip() {
        let local = SegmentId::provisional();
        assert!(local.is_provisional());
        assert!(local.as_canonical().is_none());

        let confirmed = SegmentId::canonical("seg_42");
        assert_eq!(confirmed.as_canonical(), Some("seg_42"));
        assert_eq!(confirmed.to_string(), "seg_42");

        let json = serde_json::to_string(&confirmed).unwrap();
        assert_eq!(json, r#"{"canonical":"seg_42"}"#);
        let back: SegmentId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, confirmed);
    }
}
