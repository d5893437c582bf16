//! Atlas CLI - render subreddit link networks to high-resolution images.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use subreddit_atlas::config::AtlasConfig;
use subreddit_atlas::output::OutputFormat;
use subreddit_atlas::pipeline;

#[derive(Parser)]
#[command(name = "atlas")]
#[command(about = "Render subreddit link networks as gradient-edged images")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(long, default_value = "atlas.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Render one image
    Render {
        /// Load the last stored layout instead of generating one
        #[arg(long)]
        reuse_layout: bool,

        /// Draw the source half of every edge
        #[arg(long)]
        sources: bool,

        /// Draw the target half of every edge
        #[arg(long)]
        targets: bool,

        /// Draw labels for top subreddits
        #[arg(long)]
        labels: bool,

        /// Seed for a newly generated layout
        #[arg(short = 'S', long)]
        seed: Option<u64>,

        /// Image format
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,

        /// Output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Resolution in dots per inch
        #[arg(long)]
        dpi: Option<f64>,
    },

    /// Generate and store a layout without drawing
    Layout {
        /// Seed for generation
        #[arg(short = 'S', long)]
        seed: Option<u64>,
    },
}

#[derive(Clone, ValueEnum, Debug)]
enum FormatArg {
    /// Raster image
    Png,
    /// Vector document
    Svg,
}

impl FormatArg {
    fn to_format(&self) -> OutputFormat {
        match self {
            FormatArg::Png => OutputFormat::Png,
            FormatArg::Svg => OutputFormat::Svg,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("subreddit_atlas=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let mut config = AtlasConfig::load(Path::new(&cli.config))?;

    match cli.command {
        Commands::Render {
            reuse_layout,
            sources,
            targets,
            labels,
            seed,
            format,
            output_dir,
            dpi,
        } => {
            if seed.is_some() {
                config.layout.seed = seed;
            }
            if let Some(format) = format {
                config.output.format = format.to_format();
            }
            if let Some(dir) = output_dir {
                config.output.directory = dir;
            }
            if let Some(dpi) = dpi {
                config.output.dpi = dpi;
            }

            // Explicit layer flags replace the configured layer set
            let mut options = config.run_options();
            options.reuse_layout |= reuse_layout;
            if sources || targets || labels {
                options.render_source_gradient = sources;
                options.render_target_gradient = targets;
                options.render_labels = labels;
            }

            let summary = pipeline::run(&config, &options)?;
            println!(
                "  {} nodes, {} edges, {} segments, {} labels",
                summary.nodes, summary.edges, summary.segments, summary.labels
            );
            println!("Saved to {}", summary.output.display());
        }

        Commands::Layout { seed } => {
            if seed.is_some() {
                config.layout.seed = seed;
            }
            let (graph, positions) = pipeline::generate_layout(&config)?;
            println!(
                "Stored layout for {} of {} subreddits in {}",
                positions.len(),
                graph.node_count(),
                config.layout.store.display()
            );
        }
    }

    Ok(())
}
