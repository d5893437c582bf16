//! Configuration loading for the atlas renderer.
//!
//! Configuration is loaded from TOML files with environment variable overrides.

use crate::output::OutputFormat;
use crate::pipeline::RunOptions;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "config.default.toml";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AtlasConfig {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Where the analysis job left its JSON-lines folders.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,

    #[serde(default = "default_degrees")]
    pub degrees: PathBuf,

    #[serde(default = "default_links")]
    pub links: PathBuf,

    #[serde(default = "default_top_sources")]
    pub top_sources: PathBuf,

    #[serde(default = "default_top_targets")]
    pub top_targets: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            degrees: default_degrees(),
            links: default_links(),
            top_sources: default_top_sources(),
            top_targets: default_top_targets(),
        }
    }
}

impl DataConfig {
    pub fn degrees_dir(&self) -> PathBuf {
        self.root.join(&self.degrees)
    }

    pub fn links_dir(&self) -> PathBuf {
        self.root.join(&self.links)
    }

    pub fn top_sources_dir(&self) -> PathBuf {
        self.root.join(&self.top_sources)
    }

    pub fn top_targets_dir(&self) -> PathBuf {
        self.root.join(&self.top_targets)
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_degrees() -> PathBuf {
    PathBuf::from("spark_output/degrees")
}

fn default_links() -> PathBuf {
    PathBuf::from("spark_output/links")
}

fn default_top_sources() -> PathBuf {
    PathBuf::from("spark_output/top_sources")
}

fn default_top_targets() -> PathBuf {
    PathBuf::from("spark_output/top_targets")
}

#[derive(Debug, Clone, Deserialize)]
pub struct LayoutConfig {
    /// Load the last persisted layout instead of generating a new one.
    #[serde(default)]
    pub reuse: bool,

    #[serde(default = "default_store")]
    pub store: PathBuf,

    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            reuse: false,
            store: default_store(),
            seed: None,
        }
    }
}

fn default_store() -> PathBuf {
    PathBuf::from("graph_layout.bin")
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    #[serde(default)]
    pub source_gradient: bool,

    #[serde(default)]
    pub target_gradient: bool,

    #[serde(default = "default_true")]
    pub labels: bool,

    #[serde(default = "default_pieces")]
    pub pieces: usize,

    #[serde(default = "default_line_width")]
    pub line_width: f64,

    #[serde(default = "default_source_color")]
    pub source_color: String,

    #[serde(default = "default_target_color")]
    pub target_color: String,

    #[serde(default = "default_label_color")]
    pub label_color: String,

    #[serde(default = "default_label_size")]
    pub label_size: f64,

    #[serde(default = "default_label_font")]
    pub label_font: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            source_gradient: false,
            target_gradient: false,
            labels: true,
            pieces: default_pieces(),
            line_width: default_line_width(),
            source_color: default_source_color(),
            target_color: default_target_color(),
            label_color: default_label_color(),
            label_size: default_label_size(),
            label_font: default_label_font(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_pieces() -> usize {
    20
}

fn default_line_width() -> f64 {
    0.2
}

fn default_source_color() -> String {
    "#ff8b57".to_string()
}

fn default_target_color() -> String {
    "#57b5ff".to_string()
}

fn default_label_color() -> String {
    "#ffffff".to_string()
}

fn default_label_size() -> f64 {
    1.0
}

fn default_label_font() -> String {
    "monospace".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    #[serde(default)]
    pub format: OutputFormat,

    #[serde(default = "default_dpi")]
    pub dpi: f64,

    #[serde(default = "default_width_in")]
    pub width_in: f64,

    #[serde(default = "default_height_in")]
    pub height_in: f64,

    #[serde(default = "default_background")]
    pub background: String,

    #[serde(default = "default_watermark")]
    pub watermark: String,

    #[serde(default = "default_watermark_color")]
    pub watermark_color: String,

    #[serde(default = "default_watermark_size")]
    pub watermark_size: f64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            format: OutputFormat::default(),
            dpi: default_dpi(),
            width_in: default_width_in(),
            height_in: default_height_in(),
            background: default_background(),
            watermark: default_watermark(),
            watermark_color: default_watermark_color(),
            watermark_size: default_watermark_size(),
        }
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_dpi() -> f64 {
    1200.0
}

fn default_width_in() -> f64 {
    6.4
}

fn default_height_in() -> f64 {
    4.8
}

fn default_background() -> String {
    "#000000".to_string()
}

fn default_watermark() -> String {
    "github.com/ufukty".to_string()
}

fn default_watermark_color() -> String {
    "#888888".to_string()
}

fn default_watermark_size() -> f64 {
    4.0
}

impl AtlasConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false))
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("ATLAS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to read configuration from {}", path.display()))?;

        let atlas_config: AtlasConfig = config
            .try_deserialize()
            .context("invalid configuration")?;
        Ok(atlas_config)
    }

    /// The layer and layout switches for one run.
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            reuse_layout: self.layout.reuse,
            render_source_gradient: self.render.source_gradient,
            render_target_gradient: self.render.target_gradient,
            render_labels: self.render.labels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_run_draws_labels_on_a_fresh_layout() {
        let config = AtlasConfig::default();
        let options = config.run_options();

        assert!(!options.reuse_layout);
        assert!(!options.render_source_gradient);
        assert!(!options.render_target_gradient);
        assert!(options.render_labels);
        assert_eq!(config.render.pieces, 20);
        assert_eq!(config.output.dpi, 1200.0);
        assert_eq!(
            config.data.links_dir(),
            PathBuf::from("./spark_output/links")
        );
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atlas.toml");
        fs::write(
            &path,
            r#"
[layout]
reuse = true
seed = 7

[render]
source_gradient = true
labels = false
pieces = 10

[output]
format = "svg"
dpi = 300
"#,
        )
        .unwrap();

        let config = AtlasConfig::load(&path).unwrap();
        assert!(config.layout.reuse);
        assert_eq!(config.layout.seed, Some(7));
        assert_eq!(config.render.pieces, 10);
        assert_eq!(config.output.format, OutputFormat::Svg);
        assert_eq!(config.output.dpi, 300.0);
        // untouched sections keep their defaults
        assert_eq!(config.output.background, "#000000");

        let options = config.run_options();
        assert!(options.reuse_layout);
        assert!(options.render_source_gradient);
        assert!(!options.render_target_gradient);
        assert!(!options.render_labels);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AtlasConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.layout.store, PathBuf::from("graph_layout.bin"));
    }
}
