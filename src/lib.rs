//! Subreddit Atlas - network pictures from subreddit link analysis.
//!
//! Reads the degree, link and top-subreddit tables produced by a separate
//! analysis job, places every subreddit in the unit square, and draws each
//! link as a two-tone gradient stroke with optional name labels on top.

pub mod config;
pub mod graph;
pub mod layout;
pub mod output;
pub mod pipeline;
pub mod records;
pub mod render;

pub use config::AtlasConfig;
pub use graph::SubredditGraph;
pub use pipeline::{run, RunOptions, RunSummary};
pub use render::Layer;
