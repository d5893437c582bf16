//! Node positions in the unit square.
//!
//! A layout is either drawn fresh (one uniform random point per node) or
//! read back from the layout store, so separate runs can render separate
//! layers on top of the same picture.

use crate::graph::SubredditGraph;
use anyhow::{anyhow, bail, Context, Result};
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Point at fraction `t` of the way from `self` to `other`.
    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// Position per subreddit name.
pub type Layout = BTreeMap<String, Point>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    /// Draw a new random layout and append it to the store
    Generate,
    /// Load the most recently stored layout
    Reuse,
}

/// One uniform random position in [0, 1)² per node, in node order.
pub fn random_layout(graph: &SubredditGraph, rng: &mut impl Rng) -> Layout {
    graph
        .names()
        .map(|name| {
            let x = rng.gen::<f64>();
            let y = rng.gen::<f64>();
            (name.to_string(), Point::new(x, y))
        })
        .collect()
}

/// A layout as persisted in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLayout {
    /// RFC 3339 creation time
    pub created_at: String,
    /// Fingerprint of the node set the layout was generated for
    pub fingerprint: String,
    pub positions: Layout,
}

impl StoredLayout {
    pub fn new(graph: &SubredditGraph, positions: Layout) -> Self {
        Self {
            created_at: chrono::Local::now().to_rfc3339(),
            fingerprint: graph.fingerprint(),
            positions,
        }
    }
}

/// Append-only file of length-prefixed bincode frames.
///
/// Each frame is a little-endian `u64` byte length followed by one
/// encoded [`StoredLayout`]. Readers take the last complete frame.
#[derive(Debug, Clone)]
pub struct LayoutStore {
    path: PathBuf,
}

impl LayoutStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, layout: &StoredLayout) -> Result<()> {
        let encoded = bincode::serialize(layout).context("failed to encode layout")?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open layout store {}", self.path.display()))?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&(encoded.len() as u64).to_le_bytes())?;
        writer.write_all(&encoded)?;
        writer
            .flush()
            .with_context(|| format!("failed to write layout store {}", self.path.display()))?;
        Ok(())
    }

    /// Every layout in the store, oldest first.
    pub fn load_all(&self) -> Result<Vec<StoredLayout>> {
        let data = fs::read(&self.path)
            .with_context(|| format!("failed to read layout store {}", self.path.display()))?;

        let mut layouts = Vec::new();
        let mut offset = 0usize;
        while offset < data.len() {
            let header = data
                .get(offset..offset + 8)
                .ok_or_else(|| self.truncated(offset))?;
            let mut len_bytes = [0u8; 8];
            len_bytes.copy_from_slice(header);
            let len = usize::try_from(u64::from_le_bytes(len_bytes))
                .map_err(|_| self.truncated(offset))?;

            let start = offset + 8;
            let body = start
                .checked_add(len)
                .and_then(|end| data.get(start..end))
                .ok_or_else(|| self.truncated(offset))?;
            let layout: StoredLayout = bincode::deserialize(body).with_context(|| {
                format!(
                    "corrupt layout frame at byte {} of {}",
                    offset,
                    self.path.display()
                )
            })?;
            layouts.push(layout);
            offset = start + len;
        }
        Ok(layouts)
    }

    pub fn load_latest(&self) -> Result<StoredLayout> {
        let mut layouts = self.load_all()?;
        let count = layouts.len();
        let latest = layouts
            .pop()
            .ok_or_else(|| anyhow!("layout store {} is empty", self.path.display()))?;
        info!(
            frames = count,
            created_at = %latest.created_at,
            "loaded layout from {}",
            self.path.display()
        );
        Ok(latest)
    }

    fn truncated(&self, offset: usize) -> anyhow::Error {
        anyhow!(
            "truncated layout frame at byte {} of {}",
            offset,
            self.path.display()
        )
    }
}

/// Produce the layout for this run.
///
/// `Generate` draws a fresh layout and appends it to the store. `Reuse`
/// loads the latest stored layout and warns when it was made for a
/// different node set.
pub fn provide(
    graph: &SubredditGraph,
    mode: LayoutMode,
    store: &LayoutStore,
    seed: Option<u64>,
) -> Result<Layout> {
    match mode {
        LayoutMode::Generate => {
            let seed = seed.unwrap_or_else(rand::random);
            info!(seed, "generating random layout");
            let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
            let positions = random_layout(graph, &mut rng);
            store.append(&StoredLayout::new(graph, positions.clone()))?;
            info!("layout appended to {}", store.path().display());
            Ok(positions)
        }
        LayoutMode::Reuse => {
            let stored = store.load_latest()?;
            if stored.fingerprint != graph.fingerprint() {
                warn!("stored layout was generated for a different set of subreddits");
            }
            let missing = graph
                .names()
                .filter(|name| !stored.positions.contains_key(*name))
                .count();
            if missing > 0 {
                warn!(missing, "subreddits without a stored position will not be drawn");
            }
            Ok(stored.positions)
        }
    }
}

/// Check that every position lies in the unit square.
pub fn validate(layout: &Layout) -> Result<()> {
    for (name, point) in layout {
        let inside = (0.0..=1.0).contains(&point.x) && (0.0..=1.0).contains(&point.y);
        if !inside {
            bail!(
                "position of {} ({}, {}) is outside the unit square",
                name,
                point.x,
                point.y
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::DegreeRecord;

    fn graph_of(names: &[&str]) -> SubredditGraph {
        let degrees: Vec<DegreeRecord> = names
            .iter()
            .map(|name| DegreeRecord {
                subreddit: name.to_string(),
            })
            .collect();
        SubredditGraph::build(&degrees, &[])
    }

    #[test]
    fn test_random_layout_covers_every_node_in_unit_square() {
        let graph = graph_of(&["a", "b", "c", "d", "e"]);
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let layout = random_layout(&graph, &mut rng);

        assert_eq!(layout.len(), graph.node_count());
        for name in graph.names() {
            let point = layout[name];
            assert!((0.0..=1.0).contains(&point.x));
            assert!((0.0..=1.0).contains(&point.y));
        }
        validate(&layout).unwrap();
    }

    #[test]
    fn test_same_seed_same_layout() {
        let graph = graph_of(&["a", "b", "c"]);
        let first = random_layout(&graph, &mut rand::rngs::StdRng::seed_from_u64(9));
        let second = random_layout(&graph, &mut rand::rngs::StdRng::seed_from_u64(9));
        assert_eq!(first, second);
    }

    #[test]
    fn test_persist_then_load_is_bit_identical() {
        let dir = tempfile::tempdir().unwrap();
        let store = LayoutStore::new(dir.path().join("layout.bin"));
        let graph = graph_of(&["rust", "golang", "cpp"]);

        let generated = provide(&graph, LayoutMode::Generate, &store, Some(3)).unwrap();
        let loaded = provide(&graph, LayoutMode::Reuse, &store, None).unwrap();

        assert_eq!(generated.len(), loaded.len());
        for (name, point) in &generated {
            let other = loaded[name];
            assert_eq!(point.x.to_bits(), other.x.to_bits());
            assert_eq!(point.y.to_bits(), other.y.to_bits());
        }
    }

    #[test]
    fn test_latest_appended_layout_wins() {
        let dir = tempfile::tempdir().unwrap();
        let store = LayoutStore::new(dir.path().join("layout.bin"));
        let graph = graph_of(&["a", "b"]);

        provide(&graph, LayoutMode::Generate, &store, Some(1)).unwrap();
        let second = provide(&graph, LayoutMode::Generate, &store, Some(2)).unwrap();

        assert_eq!(store.load_all().unwrap().len(), 2);
        assert_eq!(store.load_latest().unwrap().positions, second);
    }

    #[test]
    fn test_reuse_without_store_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = LayoutStore::new(dir.path().join("missing.bin"));
        let err = provide(&graph_of(&["a"]), LayoutMode::Reuse, &store, None).unwrap_err();
        assert!(err.to_string().contains("missing.bin"));
    }

    #[test]
    fn test_truncated_frame_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.bin");
        let store = LayoutStore::new(&path);
        provide(&graph_of(&["a"]), LayoutMode::Generate, &store, Some(1)).unwrap();

        let mut bytes = fs::read(&path).unwrap();
        bytes.truncate(bytes.len() - 3);
        fs::write(&path, bytes).unwrap();

        let err = store.load_latest().unwrap_err();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn test_validate_rejects_outside_points() {
        let mut layout = Layout::new();
        layout.insert("a".to_string(), Point::new(0.5, 1.5));
        assert!(validate(&layout).is_err());
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = Point::new(0.0, 1.0);
        let b = Point::new(1.0, 0.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Point::new(0.5, 0.5));
    }
}
