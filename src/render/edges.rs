//! Gradient edges.
//!
//! Every edge is cut into `pieces` equal segments. The half nearest the
//! source is drawn in the source color, the half nearest the target in the
//! target color. Opacity falls off parabolically toward the middle of the
//! edge and is scaled by the edge's normalized weight, so heavy links read
//! as bright strokes leaving and entering their endpoints.

use super::canvas::palette::{self, Rgb, Rgba};
use super::canvas::{Canvas, Segment};
use super::{Layer, Scene};
use crate::layout::Point;
use anyhow::{anyhow, bail, Result};
use tracing::{debug, info, warn};

/// Weight floor so the lightest edge stays visible.
pub const MIN_INTENSITY: f64 = 0.02;

pub const DEFAULT_PIECES: usize = 20;

/// Which halves of an edge to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halves {
    /// Pieces `0..pieces/2`, in the source color
    Source,
    /// Pieces `pieces/2..pieces`, in the target color
    Target,
    /// Both halves, each in its own color
    Both,
}

impl Halves {
    /// Map a pair of layer switches to a selection; `None` draws nothing.
    pub fn from_flags(source: bool, target: bool) -> Option<Self> {
        match (source, target) {
            (true, true) => Some(Halves::Both),
            (true, false) => Some(Halves::Source),
            (false, true) => Some(Halves::Target),
            (false, false) => None,
        }
    }

    fn includes_source(self) -> bool {
        matches!(self, Halves::Source | Halves::Both)
    }

    fn includes_target(self) -> bool {
        matches!(self, Halves::Target | Halves::Both)
    }
}

/// Edge styling shared by every segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeStyle {
    pub source_color: Rgb,
    pub target_color: Rgb,
    /// Line width in points
    pub line_width: f64,
}

impl Default for EdgeStyle {
    fn default() -> Self {
        Self {
            source_color: palette::SOURCE,
            target_color: palette::TARGET,
            line_width: 0.2,
        }
    }
}

/// Opacity of piece `i`: 1 at the ends, 0 at the midpoint, times `weight`.
pub fn piece_alpha(i: usize, pieces: usize, weight: f64) -> f64 {
    let half = pieces as f64 / 2.0;
    let offset = i as f64 - half;
    let alpha = (offset * offset) / (half * half) * 255.0 * weight;
    (alpha / 255.0).clamp(0.0, 1.0)
}

/// Scale a raw link count into `[MIN_INTENSITY, 1]`.
pub fn normalize_weight(weight: u64, max_weight: u64) -> f64 {
    MIN_INTENSITY + (1.0 - MIN_INTENSITY) * (weight as f64 / max_weight as f64)
}

/// Split the line `start -> end` into gradient segments.
///
/// `pieces` must be even and non-zero, `weight` must lie in (0, 1].
pub fn split_edge(
    start: Point,
    end: Point,
    weight: f64,
    pieces: usize,
    halves: Halves,
    style: &EdgeStyle,
) -> Result<Vec<Segment>> {
    if pieces == 0 || pieces % 2 != 0 {
        bail!("piece count must be a positive even number, got {}", pieces);
    }
    if !weight.is_finite() || weight <= 0.0 || weight > 1.0 {
        bail!("edge weight must be in (0, 1], got {}", weight);
    }

    let half = pieces / 2;
    let mut indices: Vec<(usize, Rgb)> = Vec::with_capacity(pieces);
    if halves.includes_source() {
        indices.extend((0..half).map(|i| (i, style.source_color)));
    }
    if halves.includes_target() {
        indices.extend((half..pieces).map(|i| (i, style.target_color)));
    }

    let fraction = |i: usize| i as f64 / pieces as f64;
    let segments = indices
        .into_iter()
        .map(|(i, rgb)| Segment {
            start: start.lerp(end, fraction(i)),
            end: start.lerp(end, fraction(i + 1)),
            color: Rgba::from_rgb(rgb, piece_alpha(i, pieces, weight)),
            width: style.line_width,
        })
        .collect();
    Ok(segments)
}

/// Draws every edge of the graph as one line collection.
#[derive(Debug, Clone)]
pub struct EdgeLayer {
    pub halves: Halves,
    pub pieces: usize,
    pub style: EdgeStyle,
}

impl EdgeLayer {
    pub fn new(halves: Halves) -> Self {
        Self {
            halves,
            pieces: DEFAULT_PIECES,
            style: EdgeStyle::default(),
        }
    }

    pub fn with_pieces(mut self, pieces: usize) -> Self {
        self.pieces = pieces;
        self
    }

    pub fn with_style(mut self, style: EdgeStyle) -> Self {
        self.style = style;
        self
    }
}

impl Layer for EdgeLayer {
    fn name(&self) -> &'static str {
        match self.halves {
            Halves::Source => "edge_sources",
            Halves::Target => "edge_targets",
            Halves::Both => "edges",
        }
    }

    fn draw(&self, scene: &Scene<'_>, canvas: &mut Canvas) -> Result<usize> {
        info!(layer = self.name(), "drawing edges");
        let graph = scene.graph;

        let max_weight = graph.max_weight().filter(|&w| w > 0).ok_or_else(|| {
            anyhow!(
                "cannot normalize edge weights: the graph has {} edges and no positive weight",
                graph.edge_count()
            )
        })?;

        let total = graph.edge_count();
        let mut drawn = 0;
        let mut unplaced = 0;
        for (i, (source, target, weight)) in graph.edges().enumerate() {
            if i % 100 == 0 {
                debug!(
                    "drawing edges: {:.2}%",
                    i as f64 / total as f64 * 100.0
                );
            }
            let (Some(&start), Some(&end)) = (scene.layout.get(source), scene.layout.get(target))
            else {
                unplaced += 1;
                continue;
            };

            let segments = split_edge(
                start,
                end,
                normalize_weight(weight, max_weight),
                self.pieces,
                self.halves,
                &self.style,
            )?;
            drawn += segments.len();
            canvas.add_lines(segments);
        }

        if unplaced > 0 {
            warn!(unplaced, "skipped edges with an endpoint missing from the layout");
        }
        info!("segments added: {}", drawn);
        Ok(drawn)
    }
}
