//! Audio transport planning.
//!
//! Audio segments are not drawn; each frame the planner compares where every
//! audio transport should be with what the transport reports and emits the
//! instructions needed to get there. Small drift is tolerated so playback
//! does not stutter from constant corrections.

use montage_core::config::AudioConfig;
use montage_core::round_time;
use montage_timeline::{Property, Segment, SegmentContent, SegmentId, Timeline};
use tracing::debug;

use crate::media::MediaLocator;

/// State reported by the transport playing one segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportStatus {
    pub playing: bool,
    /// Current position in the source media, seconds
    pub position: f64,
}

/// One instruction for the transport of an audio segment.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioInstruction {
    /// Start playback at `source_offset`.
    Play {
        segment: SegmentId,
        url: String,
        source_offset: f64,
        volume: f32,
    },
    /// Jump a playing transport back in sync.
    Seek {
        segment: SegmentId,
        source_offset: f64,
        volume: f32,
    },
    /// Keep playing; only the volume is refreshed.
    SetVolume { segment: SegmentId, volume: f32 },
    Pause { segment: SegmentId },
}

impl AudioInstruction {
    pub fn segment(&self) -> &SegmentId {
        match self {
            Self::Play { segment, .. }
            | Self::Seek { segment, .. }
            | Self::SetVolume { segment, .. }
            | Self::Pause { segment } => segment,
        }
    }
}

/// Plans audio transport instructions per frame.
#[derive(Debug, Clone)]
pub struct AudioTransport {
    drift_tolerance: f64,
    media: MediaLocator,
}

impl AudioTransport {
    pub fn new(config: &AudioConfig, media: MediaLocator) -> Self {
        Self {
            drift_tolerance: config.drift_tolerance,
            media,
        }
    }

    pub fn drift_tolerance(&self) -> f64 {
        self.drift_tolerance
    }

    /// Instructions for every audio segment at `time`.
    ///
    /// `status` reports the transport of a segment, `None` when it has
    /// never been started.
    pub fn plan<F>(&self, timeline: &Timeline, time: f64, status: F) -> Vec<AudioInstruction>
    where
        F: Fn(&SegmentId) -> Option<TransportStatus>,
    {
        timeline
            .layers()
            .filter(|layer| layer.index().is_audio())
            .flat_map(|layer| layer.segments())
            .filter_map(|segment| self.plan_segment(segment, time, status(&segment.id)))
            .collect()
    }

    fn plan_segment(
        &self,
        segment: &Segment,
        time: f64,
        status: Option<TransportStatus>,
    ) -> Option<AudioInstruction> {
        let SegmentContent::Audio(audio) = &segment.content else {
            return None;
        };
        let id = segment.id.clone();

        if !segment.contains(time) {
            return match status {
                Some(TransportStatus { playing: false, .. }) => None,
                _ => Some(AudioInstruction::Pause { segment: id }),
            };
        }

        let local_time = time - segment.start_time;
        let source_offset = round_time(local_time + audio.start_within_source);
        let volume = segment.value_at(Property::Volume, local_time).max(0.0) as f32;

        match status {
            Some(TransportStatus { playing: true, position }) => {
                let drift = (position - source_offset).abs();
                if drift > self.drift_tolerance {
                    debug!(segment = %id, drift, source_offset, "Audio drift, seeking");
                    Some(AudioInstruction::Seek {
                        segment: id,
                        source_offset,
                        volume,
                    })
                } else {
                    Some(AudioInstruction::SetVolume { segment: id, volume })
                }
            }
            _ => Some(AudioInstruction::Play {
                segment: id,
                url: self.media.locate(&audio.media),
                source_offset,
                volume,
            }),
        }
    }
}
