//! Subreddit link graph.
//!
//! Nodes are subreddit names, edges are undirected links carrying their
//! aggregated link count. The count lives on the edge itself, so edge
//! iteration order never has to line up with a separate weight list.

use crate::records::{DegreeRecord, LinkRecord};
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct SubredditGraph {
    graph: UnGraph<String, u64>,
    index: HashMap<String, NodeIndex>,
}

impl SubredditGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from degree and link records.
    ///
    /// Link endpoints missing from the degree data are created on the fly
    /// and reported once as a warning.
    pub fn build(degrees: &[DegreeRecord], links: &[LinkRecord]) -> Self {
        info!("populating the graph");
        let mut graph = Self::new();

        for degree in degrees {
            graph.add_node(&degree.subreddit);
        }
        let known = graph.node_count();

        for link in links {
            graph.add_link(&link.source, &link.target, link.count);
        }

        let created = graph.node_count() - known;
        if created > 0 {
            warn!(
                created,
                "link data references subreddits missing from the degree data; added them as nodes"
            );
        }

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "graph populated"
        );
        graph
    }

    /// Insert a node if it does not exist yet.
    pub fn add_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.index.insert(name.to_string(), idx);
        idx
    }

    /// Insert an edge or add `count` to the existing edge between the pair.
    pub fn add_link(&mut self, source: &str, target: &str, count: u64) -> EdgeIndex {
        let a = self.add_node(source);
        let b = self.add_node(target);

        if let Some(edge) = self.graph.find_edge(a, b) {
            debug!(source, target, count, "repeated link, accumulating count");
            if let Some(weight) = self.graph.edge_weight_mut(edge) {
                *weight += count;
            }
            edge
        } else {
            self.graph.add_edge(a, b, count)
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Node names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }

    /// Edges as `(source, target, weight)` in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, u64)> {
        self.graph.edge_references().map(|edge| {
            (
                self.graph[edge.source()].as_str(),
                self.graph[edge.target()].as_str(),
                *edge.weight(),
            )
        })
    }

    /// Edge weights in edge insertion order.
    pub fn weights(&self) -> Vec<u64> {
        self.graph.edge_weights().copied().collect()
    }

    pub fn weight_between(&self, source: &str, target: &str) -> Option<u64> {
        let a = *self.index.get(source)?;
        let b = *self.index.get(target)?;
        let edge = self.graph.find_edge(a, b)?;
        self.graph.edge_weight(edge).copied()
    }

    pub fn max_weight(&self) -> Option<u64> {
        self.graph.edge_weights().copied().max()
    }

    /// SHA-256 over the sorted node names, hex encoded.
    ///
    /// Identifies the node set a persisted layout was generated for.
    pub fn fingerprint(&self) -> String {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();

        let mut hasher = Sha256::new();
        for name in names {
            hasher.update(name.as_bytes());
            hasher.update([0u8]);
        }
        hasher
            .finalize()
            .iter()
            .map(|byte| format!("{:02x}", byte))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn degree(name: &str) -> DegreeRecord {
        DegreeRecord {
            subreddit: name.to_string(),
        }
    }

    fn link(source: &str, target: &str, count: u64) -> LinkRecord {
        LinkRecord {
            source: source.to_string(),
            target: target.to_string(),
            count,
        }
    }

    #[test]
    fn test_three_nodes_two_links() {
        let graph = SubredditGraph::build(
            &[degree("A"), degree("B"), degree("C")],
            &[link("A", "B", 5), link("B", "C", 10)],
        );

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.weights(), vec![5, 10]);
        assert_eq!(graph.max_weight(), Some(10));

        let edges: Vec<_> = graph.edges().collect();
        assert_eq!(edges, vec![("A", "B", 5), ("B", "C", 10)]);
    }

    #[test]
    fn test_weight_count_matches_edge_count() {
        let graph = SubredditGraph::build(
            &[degree("a"), degree("b"), degree("c"), degree("d")],
            &[
                link("a", "b", 1),
                link("a", "c", 2),
                link("c", "d", 3),
                link("d", "a", 4),
            ],
        );
        assert_eq!(graph.weights().len(), graph.edge_count());
    }

    #[test]
    fn test_unknown_endpoints_become_nodes() {
        let graph = SubredditGraph::build(&[degree("A")], &[link("A", "ghost", 3)]);

        assert_eq!(graph.node_count(), 2);
        assert!(graph.contains("ghost"));
        assert_eq!(graph.weight_between("ghost", "A"), Some(3));
    }

    #[test]
    fn test_repeated_and_reversed_links_accumulate() {
        let graph = SubredditGraph::build(
            &[degree("A"), degree("B")],
            &[link("A", "B", 2), link("B", "A", 3), link("A", "B", 1)],
        );

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.weights(), vec![6]);
    }

    #[test]
    fn test_duplicate_degree_records_keep_one_node() {
        let graph = SubredditGraph::build(&[degree("A"), degree("A")], &[]);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.max_weight(), None);
    }

    #[test]
    fn test_fingerprint_ignores_insertion_order() {
        let first = SubredditGraph::build(&[degree("x"), degree("y")], &[]);
        let second = SubredditGraph::build(&[degree("y"), degree("x")], &[]);
        let other = SubredditGraph::build(&[degree("x"), degree("z")], &[]);

        assert_eq!(first.fingerprint(), second.fingerprint());
        assert_ne!(first.fingerprint(), other.fingerprint());
        assert_eq!(first.fingerprint().len(), 64);
    }
}
