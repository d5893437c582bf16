//! Figure finishing and image output.
//!
//! The figure is always built as SVG. PNG output rasterizes that document
//! with resvg at the figure's pixel size.

use crate::config::OutputConfig;
use crate::layout::Point;
use crate::render::canvas::palette::Rgb;
use crate::render::canvas::{Anchor, Canvas, TextStyle};
use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, TimeZone};
use resvg::{tiny_skia, usvg};
use serde::Deserialize;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Visible plot range, slightly wider than the unit square so nodes on the
/// border are not clipped.
pub const PLOT_LIMITS: (f64, f64) = (-0.05, 1.05);

/// Figure-relative anchor of the credit line.
pub const WATERMARK_AT: Point = Point { x: 0.98, y: 0.03 };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Svg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }
}

/// Output configuration with colors resolved.
#[derive(Debug, Clone)]
pub struct OutputSettings {
    pub directory: PathBuf,
    pub format: OutputFormat,
    pub dpi: f64,
    pub width_in: f64,
    pub height_in: f64,
    pub background: Rgb,
    pub watermark: String,
    pub watermark_style: TextStyle,
}

impl OutputSettings {
    pub fn from_config(config: &OutputConfig) -> Result<Self> {
        if !(config.dpi > 0.0 && config.width_in > 0.0 && config.height_in > 0.0) {
            bail!(
                "figure size must be positive, got {}x{} in at {} dpi",
                config.width_in,
                config.height_in,
                config.dpi
            );
        }
        Ok(Self {
            directory: config.directory.clone(),
            format: config.format,
            dpi: config.dpi,
            width_in: config.width_in,
            height_in: config.height_in,
            background: Rgb::from_hex(&config.background).context("output.background")?,
            watermark: config.watermark.clone(),
            watermark_style: TextStyle {
                color: Rgb::from_hex(&config.watermark_color).context("output.watermark_color")?,
                size: config.watermark_size,
                family: "sans-serif".to_string(),
            },
        })
    }

    pub fn canvas(&self) -> Canvas {
        Canvas::new(self.width_in, self.height_in, self.dpi)
    }
}

/// `output YYYY.MM.DD HH.MM.SS.<ext>` for the given time.
pub fn output_filename<Tz>(at: &DateTime<Tz>, format: OutputFormat) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "{}.{}",
        at.format("output %Y.%m.%d %H.%M.%S"),
        format.extension()
    )
}

/// Fix the visible range and add the credit line.
pub fn finalize(canvas: &mut Canvas, settings: &OutputSettings) {
    canvas.set_limits(PLOT_LIMITS, PLOT_LIMITS);
    if !settings.watermark.is_empty() {
        canvas.add_figure_text(
            WATERMARK_AT,
            &settings.watermark,
            &settings.watermark_style,
            Anchor::BaselineEnd,
        );
    }
}

/// Rasterize an SVG document at its own pixel size.
pub fn rasterize(svg: &str) -> Result<tiny_skia::Pixmap> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt).context("failed to parse generated svg")?;
    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow!("failed to allocate {}x{} pixmap", size.width(), size.height()))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap_mut);
    Ok(pixmap)
}

/// Write the figure in `format` to `path`.
pub fn write_image(svg: &str, format: OutputFormat, path: &Path) -> Result<()> {
    match format {
        OutputFormat::Svg => {
            fs::write(path, svg).with_context(|| format!("failed to write {}", path.display()))?;
        }
        OutputFormat::Png => {
            let pixmap = rasterize(svg)?;
            pixmap
                .save_png(path)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
    }
    Ok(())
}

/// Finish the figure and save it under a timestamped name.
pub fn save(canvas: &mut Canvas, settings: &OutputSettings) -> Result<PathBuf> {
    info!("saving");
    finalize(canvas, settings);

    fs::create_dir_all(&settings.directory).with_context(|| {
        format!(
            "failed to create output directory {}",
            settings.directory.display()
        )
    })?;
    let path = settings
        .directory
        .join(output_filename(&chrono::Local::now(), settings.format));

    let svg = canvas.to_svg(settings.background);
    write_image(&svg, settings.format, &path)?;
    info!(
        width = canvas.width_px(),
        height = canvas.height_px(),
        "saved to {}",
        path.display()
    );
    Ok(path)
}
