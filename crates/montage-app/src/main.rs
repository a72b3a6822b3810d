//! Montage - headless playback driver
//!
//! Loads a timeline file and plays it back on a 30 fps clock. Every frame
//! is composited and the audio transport planned; the driver keeps a
//! simulated transport per audio segment so drift correction behaves as it
//! would against a real player.

use anyhow::{bail, Context, Result};
use montage_compositor::{AudioInstruction, AudioTransport, Compositor, TransportStatus};
use montage_core::EditorConfig;
use montage_timeline::{SegmentId, TimelineFile};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const FPS: f64 = 30.0;
const PROJECT_ID: &str = "local";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut args = std::env::args().skip(1);
    let Some(timeline_path) = args.next().map(PathBuf::from) else {
        bail!("usage: montage <timeline.json> [config.json]");
    };
    let config = match args.next() {
        Some(path) => EditorConfig::load_from_file(Path::new(&path))
            .with_context(|| format!("Failed to load config {path}"))?,
        None => EditorConfig::default(),
    };

    let timeline = TimelineFile::load_from_file(&timeline_path)
        .with_context(|| format!("Failed to load timeline {}", timeline_path.display()))?
        .timeline;
    info!(
        segments = timeline.segment_count(),
        transitions = timeline.transitions().len(),
        duration = timeline.duration(),
        "Timeline loaded"
    );

    let compositor = Compositor::new(&config, PROJECT_ID);
    let planner = AudioTransport::new(&config.audio, compositor.media().clone());
    let mut transports = SimulatedTransports::default();

    let step = 1.0 / FPS;
    let frames = (timeline.duration() * FPS).ceil() as u64;
    let mut clock = tokio::time::interval(Duration::from_secs_f64(step));
    let mut seeks = 0usize;

    for frame in 0..frames {
        clock.tick().await;
        let time = frame as f64 * step;

        let descriptors = compositor.visible_at(&timeline, time);
        let instructions = planner.plan(&timeline, time, |id| transports.status(id));
        seeks += instructions
            .iter()
            .filter(|i| matches!(i, AudioInstruction::Seek { .. }))
            .count();
        transports.apply(&instructions);
        transports.advance(step);

        debug!(frame, time, visible = descriptors.len(), audio = instructions.len(), "Frame");
        if frame % FPS as u64 == 0 {
            info!(time, visible = descriptors.len(), audio = instructions.len(), "Playback");
        }
    }

    info!(frames, seeks, "Playback finished");
    Ok(())
}

/// Stand-in for the audio players a renderer would own.
#[derive(Default)]
struct SimulatedTransports {
    players: HashMap<SegmentId, TransportStatus>,
}

impl SimulatedTransports {
    fn status(&self, id: &SegmentId) -> Option<TransportStatus> {
        self.players.get(id).copied()
    }

    fn apply(&mut self, instructions: &[AudioInstruction]) {
        for instruction in instructions {
            let id = instruction.segment().clone();
            match instruction {
                AudioInstruction::Play { source_offset, .. } | AudioInstruction::Seek { source_offset, .. } => {
                    self.players.insert(
                        id,
                        TransportStatus {
                            playing: true,
                            position: *source_offset,
                        },
                    );
                }
                AudioInstruction::SetVolume { .. } => {}
                AudioInstruction::Pause { .. } => {
                    if let Some(player) = self.players.get_mut(&id) {
                        player.playing = false;
                    } else {
                        self.players.insert(
                            id,
                            TransportStatus {
                                playing: false,
                                position: 0.0,
                            },
                        );
                    }
                }
            }
        }
    }

    fn advance(&mut self, seconds: f64) {
        for player in self.players.values_mut().filter(|p| p.playing) {
            player.position += seconds;
        }
    }
}
