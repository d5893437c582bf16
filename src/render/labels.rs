//! Subreddit name labels.

use super::canvas::palette::Rgb;
use super::canvas::{Anchor, Canvas, TextStyle};
use super::{Layer, Scene};
use crate::records::TopSubredditRecord;
use anyhow::Result;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Deduplicated union of the top-sources and top-targets lists.
pub fn label_set(
    top_sources: &[TopSubredditRecord],
    top_targets: &[TopSubredditRecord],
) -> BTreeSet<String> {
    top_sources
        .iter()
        .chain(top_targets)
        .map(|record| record.subreddit.clone())
        .collect()
}

pub struct LabelLayer {
    pub names: BTreeSet<String>,
    pub style: TextStyle,
}

impl LabelLayer {
    pub fn new(names: BTreeSet<String>) -> Self {
        Self {
            names,
            style: TextStyle {
                color: Rgb::new(255, 255, 255),
                size: 1.0,
                family: "monospace".to_string(),
            },
        }
    }

    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = style;
        self
    }
}

impl Layer for LabelLayer {
    fn name(&self) -> &'static str {
        "labels"
    }

    fn draw(&self, scene: &Scene<'_>, canvas: &mut Canvas) -> Result<usize> {
        info!("drawing labels");

        let mut drawn = 0;
        for name in &self.names {
            match scene.layout.get(name) {
                Some(&at) => {
                    canvas.add_text(at, name, &self.style, Anchor::Center);
                    drawn += 1;
                }
                None => debug!(name = %name, "no position for label, skipping"),
            }
        }
        info!(drawn, requested = self.names.len(), "labels drawn");
        Ok(drawn)
    }
}
