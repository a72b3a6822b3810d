//! Cache of decoded media durations.

use std::collections::HashMap;

/// Source media durations in seconds, keyed by media filename.
///
/// Resizes of video and audio segments consult this to keep the source
/// window inside the media. Unknown media is only bounded below by zero.
#[derive(Debug, Clone, Default)]
pub struct SourceDurationCache {
    durations: HashMap<String, f64>,
}

impl SourceDurationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, media: impl Into<String>, seconds: f64) {
        self.durations.insert(media.into(), seconds);
    }

    pub fn get(&self, media: &str) -> Option<f64> {
        self.durations.get(media).copied()
    }

    pub fn remove(&mut self, media: &str) -> Option<f64> {
        self.durations.remove(media)
    }

    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }
}
