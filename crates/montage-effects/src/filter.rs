//! Filter backends.
//!
//! The compositor only describes a filter chain; a backend executes it on
//! pixels. Transform filters (rotate, flips) are placement changes handled
//! by the compositor and are skipped here.

use montage_core::{Filter, FilterKind, FrameBuffer, Result};
use rayon::prelude::*;
use tracing::trace;

/// Executes a segment's filter chain on a frame.
pub trait FilterBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Apply `chain` in order to `frame`, returning a new frame.
    fn apply(&self, chain: &[Filter], frame: &FrameBuffer) -> Result<FrameBuffer>;
}

/// Per-pixel color operation in normalized RGB.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ColorOp {
    Brightness(f32),
    Contrast(f32),
    Saturate(f32),
    Grayscale(f32),
    Sepia(f32),
    Invert(f32),
}

impl ColorOp {
    fn from_filter(filter: &Filter) -> Option<Self> {
        let amount = (filter.value / 100.0) as f32;
        match filter.kind() {
            FilterKind::Brightness => Some(Self::Brightness(amount.max(0.0))),
            FilterKind::Contrast => Some(Self::Contrast(amount.max(0.0))),
            FilterKind::Saturate => Some(Self::Saturate(amount.max(0.0))),
            FilterKind::Grayscale => Some(Self::Grayscale(amount.clamp(0.0, 1.0))),
            FilterKind::Sepia => Some(Self::Sepia(amount.clamp(0.0, 1.0))),
            FilterKind::Invert => Some(Self::Invert(amount.clamp(0.0, 1.0))),
            FilterKind::Rotate
            | FilterKind::FlipHorizontal
            | FilterKind::FlipVertical
            | FilterKind::Other => None,
        }
    }

    fn apply(self, [r, g, b]: [f32; 3]) -> [f32; 3] {
        match self {
            Self::Brightness(a) => [r * a, g * a, b * a],
            Self::Contrast(a) => [
                (r - 0.5) * a + 0.5,
                (g - 0.5) * a + 0.5,
                (b - 0.5) * a + 0.5,
            ],
            Self::Saturate(s) => mul3(saturate_matrix(s), [r, g, b]),
            Self::Grayscale(a) => mul3(saturate_matrix(1.0 - a), [r, g, b]),
            Self::Sepia(a) => {
                let inv = 1.0 - a;
                let m = [
                    [0.393 + 0.607 * inv, 0.769 - 0.769 * inv, 0.189 - 0.189 * inv],
                    [0.349 - 0.349 * inv, 0.686 + 0.314 * inv, 0.168 - 0.168 * inv],
                    [0.272 - 0.272 * inv, 0.534 - 0.534 * inv, 0.131 + 0.869 * inv],
                ];
                mul3(m, [r, g, b])
            }
            Self::Invert(a) => [
                r * (1.0 - a) + (1.0 - r) * a,
                g * (1.0 - a) + (1.0 - g) * a,
                b * (1.0 - a) + (1.0 - b) * a,
            ],
        }
    }
}

/// Luminance-preserving saturation matrix.
fn saturate_matrix(s: f32) -> [[f32; 3]; 3] {
    [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]
}

fn mul3(m: [[f32; 3]; 3], v: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

/// CPU backend: color filters evaluated per pixel, rows processed in
/// parallel.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuFilterBackend;

impl FilterBackend for CpuFilterBackend {
    fn name(&self) -> &str {
        "cpu"
    }

    fn apply(&self, chain: &[Filter], frame: &FrameBuffer) -> Result<FrameBuffer> {
        let ops: Vec<ColorOp> = chain.iter().filter_map(ColorOp::from_filter).collect();
        let mut out = frame.clone();
        if ops.is_empty() {
            return Ok(out);
        }
        trace!(ops = ops.len(), width = frame.width(), height = frame.height(), "CPU filter pass");

        out.data_mut()
            .par_chunks_mut(FrameBuffer::BYTES_PER_PIXEL)
            .for_each(|px| {
                let mut rgb = [
                    px[0] as f32 / 255.0,
                    px[1] as f32 / 255.0,
                    px[2] as f32 / 255.0,
                ];
                for op in &ops {
                    rgb = op.apply(rgb);
                }
                for (channel, value) in px.iter_mut().zip(rgb) {
                    *channel = (value.clamp(0.0, 1.0) * 255.0).round() as u8;
                }
            });
        Ok(out)
    }
}
