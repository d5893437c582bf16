//! The render pipeline: load, build, lay out, draw, save.

use crate::config::{AtlasConfig, DataConfig, RenderConfig};
use crate::graph::SubredditGraph;
use crate::layout::{self, Layout, LayoutMode, LayoutStore};
use crate::output::{self, OutputSettings};
use crate::records::{self, DegreeRecord, LinkRecord, TopSubredditRecord};
use crate::render::canvas::palette::Rgb;
use crate::render::canvas::TextStyle;
use crate::render::edges::{EdgeLayer, EdgeStyle, Halves};
use crate::render::labels::{self, LabelLayer};
use crate::render::{Layer, Scene};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

/// Switches for a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunOptions {
    pub reuse_layout: bool,
    pub render_source_gradient: bool,
    pub render_target_gradient: bool,
    pub render_labels: bool,
}

impl RunOptions {
    pub fn layout_mode(&self) -> LayoutMode {
        if self.reuse_layout {
            LayoutMode::Reuse
        } else {
            LayoutMode::Generate
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub nodes: usize,
    pub edges: usize,
    pub segments: usize,
    pub labels: usize,
    pub output: PathBuf,
}

/// Load degree and link records and build the graph.
pub fn load_graph(data: &DataConfig) -> Result<SubredditGraph> {
    let degrees: Vec<DegreeRecord> = records::load_folder(&data.degrees_dir())?;
    let links: Vec<LinkRecord> = records::load_folder(&data.links_dir())?;
    Ok(SubredditGraph::build(&degrees, &links))
}

/// Generate or load the layout for `graph`.
pub fn prepare_layout(
    config: &AtlasConfig,
    graph: &SubredditGraph,
    mode: LayoutMode,
) -> Result<Layout> {
    let store = LayoutStore::new(&config.layout.store);
    let positions = layout::provide(graph, mode, &store, config.layout.seed)?;
    if mode == LayoutMode::Reuse {
        layout::validate(&positions)
            .with_context(|| format!("bad layout in {}", store.path().display()))?;
    }
    Ok(positions)
}

pub fn edge_style(render: &RenderConfig) -> Result<EdgeStyle> {
    Ok(EdgeStyle {
        source_color: Rgb::from_hex(&render.source_color).context("render.source_color")?,
        target_color: Rgb::from_hex(&render.target_color).context("render.target_color")?,
        line_width: render.line_width,
    })
}

pub fn label_style(render: &RenderConfig) -> Result<TextStyle> {
    Ok(TextStyle {
        color: Rgb::from_hex(&render.label_color).context("render.label_color")?,
        size: render.label_size,
        family: render.label_font.clone(),
    })
}

/// Edge passes in draw order: sources first, then targets.
pub fn edge_layers(config: &AtlasConfig, options: &RunOptions) -> Result<Vec<EdgeLayer>> {
    let style = edge_style(&config.render)?;
    let passes = [
        (options.render_source_gradient, Halves::Source),
        (options.render_target_gradient, Halves::Target),
    ];
    Ok(passes
        .into_iter()
        .filter(|(enabled, _)| *enabled)
        .map(|(_, halves)| {
            EdgeLayer::new(halves)
                .with_pieces(config.render.pieces)
                .with_style(style)
        })
        .collect())
}

fn label_layer(config: &AtlasConfig) -> Result<LabelLayer> {
    let style = label_style(&config.render)?;
    let top_sources: Vec<TopSubredditRecord> =
        records::load_folder(&config.data.top_sources_dir())?;
    let top_targets: Vec<TopSubredditRecord> =
        records::load_folder(&config.data.top_targets_dir())?;
    Ok(LabelLayer::new(labels::label_set(&top_sources, &top_targets)).with_style(style))
}

/// Build a fresh layout and persist it without drawing anything.
pub fn generate_layout(config: &AtlasConfig) -> Result<(SubredditGraph, Layout)> {
    let graph = load_graph(&config.data)?;
    let positions = prepare_layout(config, &graph, LayoutMode::Generate)?;
    Ok((graph, positions))
}

/// Run the whole pipeline and write one image.
pub fn run(config: &AtlasConfig, options: &RunOptions) -> Result<RunSummary> {
    // resolve settings before any data is read so config mistakes fail fast
    let settings = OutputSettings::from_config(&config.output)?;
    let edge_layers = edge_layers(config, options)?;
    if options.render_labels {
        label_style(&config.render)?;
    }

    let graph = load_graph(&config.data)?;
    let positions = prepare_layout(config, &graph, options.layout_mode())?;
    let scene = Scene {
        graph: &graph,
        layout: &positions,
    };

    let mut canvas = settings.canvas();
    let mut segments = 0;
    for layer in &edge_layers {
        segments += layer.draw(&scene, &mut canvas)?;
    }

    let mut labels = 0;
    if options.render_labels {
        labels = label_layer(config)?.draw(&scene, &mut canvas)?;
    }

    let output = output::save(&mut canvas, &settings)?;
    info!(segments, labels, "render complete");

    Ok(RunSummary {
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        segments,
        labels,
        output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_mode_follows_reuse_flag() {
        let mut options = RunOptions::default();
        assert_eq!(options.layout_mode(), LayoutMode::Generate);
        options.reuse_layout = true;
        assert_eq!(options.layout_mode(), LayoutMode::Reuse);
    }

    #[test]
    fn test_edge_passes_run_sources_then_targets() {
        let config = AtlasConfig::default();
        let options = RunOptions {
            render_source_gradient: true,
            render_target_gradient: true,
            ..RunOptions::default()
        };
        let layers = edge_layers(&config, &options).unwrap();
        let halves: Vec<Halves> = layers.iter().map(|layer| layer.halves).collect();
        assert_eq!(halves, vec![Halves::Source, Halves::Target]);

        let none = edge_layers(&config, &RunOptions::default()).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_bad_edge_color_fails_before_loading_data() {
        let mut config = AtlasConfig::default();
        config.render.source_color = "orange".to_string();
        config.data.root = PathBuf::from("/definitely/not/here");
        let options = RunOptions {
            render_source_gradient: true,
            ..RunOptions::default()
        };

        let err = run(&config, &options).unwrap_err();
        assert!(format!("{err:#}").contains("render.source_color"));
    }
}
