//! Render layers - each draws one optional part of the picture.

pub mod canvas;
pub mod edges;
pub mod labels;

use crate::graph::SubredditGraph;
use crate::layout::Layout;
use anyhow::Result;
use canvas::Canvas;

/// What a layer draws from.
pub struct Scene<'a> {
    pub graph: &'a SubredditGraph,
    pub layout: &'a Layout,
}

/// Trait for all render layers.
pub trait Layer {
    /// Name of this layer.
    fn name(&self) -> &'static str;

    /// Draw onto the canvas.
    /// Returns how many primitives (segments or labels) were added.
    fn draw(&self, scene: &Scene<'_>, canvas: &mut Canvas) -> Result<usize>;
}
