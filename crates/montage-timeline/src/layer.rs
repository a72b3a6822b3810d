//! Layers hold non-overlapping segments ordered by start time.

use montage_core::TimeRange;

use crate::error::TimelineResult;
use crate::id::{LayerIndex, SegmentId};
use crate::segment::Segment;
use crate::validate;

/// One horizontal lane of the timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    index: LayerIndex,
    /// Sorted by start time, never overlapping
    segments: Vec<Segment>,
}

impl Layer {
    pub fn new(index: LayerIndex) -> Self {
        Self {
            index,
            segments: Vec::new(),
        }
    }

    pub fn index(&self) -> LayerIndex {
        self.index
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// End of the last segment, or 0 for an empty layer.
    pub fn end_time(&self) -> f64 {
        self.segments.last().map_or(0.0, Segment::end_time)
    }

    pub fn find(&self, id: &SegmentId) -> Option<&Segment> {
        self.segments.iter().find(|s| &s.id == id)
    }

    pub fn find_mut(&mut self, id: &SegmentId) -> Option<&mut Segment> {
        self.segments.iter_mut().find(|s| &s.id == id)
    }

    /// Segment covering `time`, if any.
    pub fn segment_at(&self, time: f64) -> Option<&Segment> {
        let idx = self.segments.partition_point(|s| s.start_time <= time);
        idx.checked_sub(1)
            .map(|i| &self.segments[i])
            .filter(|s| s.contains(time))
    }

    /// First segment other than `exclude` whose range overlaps `range`.
    pub fn overlapping(&self, range: TimeRange, exclude: Option<&SegmentId>) -> Option<&Segment> {
        self.segments
            .iter()
            .filter(|s| Some(&s.id) != exclude)
            .find(|s| s.range().overlaps(range))
    }

    /// Insert a segment, keeping start-time order. Fails on overlap.
    pub fn insert(&mut self, segment: Segment) -> TimelineResult<()> {
        validate::validate_overlap(self, &segment)?;
        let idx = self
            .segments
            .partition_point(|s| s.start_time <= segment.start_time);
        self.segments.insert(idx, segment);
        Ok(())
    }

    /// Remove a segment by id.
    pub fn remove(&mut self, id: &SegmentId) -> Option<Segment> {
        let idx = self.segments.iter().position(|s| &s.id == id)?;
        Some(self.segments.remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TimelineError;

    fn image(start: f64, duration: f64) -> Segment {
        Segment::image("still.png", LayerIndex::visual(0), start, duration, (100, 100))
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut layer = Layer::new(LayerIndex::visual(0));
        layer.insert(image(5.0, 1.0)).unwrap();
        layer.insert(image(0.0, 2.0)).unwrap();
        layer.insert(image(2.0, 3.0)).unwrap();

        let starts: Vec<f64> = layer.segments().iter().map(|s| s.start_time).collect();
        assert_eq!(starts, vec![0.0, 2.0, 5.0]);
        assert_eq!(layer.end_time(), 6.0);
    }

    #[test]
    fn test_insert_rejects_overlap() {
        let mut layer = Layer::new(LayerIndex::visual(0));
        layer.insert(image(0.0, 2.0)).unwrap();
        let err = layer.insert(image(1.5, 2.0)).unwrap_err();
        assert!(matches!(err, TimelineError::Overlap { .. }));
        assert_eq!(layer.len(), 1);
    }

    #[test]
    fn test_segment_at_is_half_open() {
        let mut layer = Layer::new(LayerIndex::visual(0));
        layer.insert(image(0.0, 2.0)).unwrap();
        layer.insert(image(2.0, 2.0)).unwrap();

        let at_two = layer.segment_at(2.0).unwrap();
        assert_eq!(at_two.start_time, 2.0);
        assert!(layer.segment_at(4.0).is_none());
    }
}
