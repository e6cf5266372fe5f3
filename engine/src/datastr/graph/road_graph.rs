//! The routing graph the matrix searches run on.
//!
//! Edges are undirected records with per direction access flags, so a two way road is one edge
//! which shows up in both adjacency arrays.
//! This is important for turn handling: a U-turn is leaving a node over the same edge id one arrived on.
//!
//! Besides road segments the graph contains contraction hierarchy shortcuts and query time virtual edges.
//! A virtual edge is a piece of a real edge, split where a location was snapped onto it.
//! It remembers the id of the real (original) edge it belongs to.
//! Nodes without a level are virtual nodes, created by that splitting.

use super::*;
use crate::io::*;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeKind {
    /// A road segment or a virtual piece of one.
    Base,
    /// Bridges `skipped[0]` and `skipped[1]` around a contracted node.
    /// The weight is fixed at contraction time.
    /// `ends` are the first and the last base edge of the unpacked path, turns onto and off the shortcut happen there.
    Shortcut { skipped: [EdgeId; 2], weight: Weight, ends: [EdgeId; 2] },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeData {
    pub tail: NodeId,
    pub head: NodeId,
    /// meters
    pub distance: f64,
    /// seconds
    pub duration: f64,
    /// may be traversed from tail to head
    pub forward: bool,
    /// may be traversed from head to tail
    pub backward: bool,
    /// Id of the real edge this one was split from. Its own id for everything but virtual edges.
    pub original: EdgeId,
    pub kind: EdgeKind,
}

impl EdgeData {
    pub fn is_shortcut(&self) -> bool {
        matches!(self.kind, EdgeKind::Shortcut { .. })
    }

    /// Base edges at the `(via, far)` ends when a search in `direction` relaxes this edge (with id `edge_id`) from `via`.
    #[inline]
    pub fn turn_edges(&self, edge_id: EdgeId, direction: Direction) -> (EdgeId, EdgeId) {
        match (self.kind, direction) {
            (EdgeKind::Base, _) => (edge_id, edge_id),
            (EdgeKind::Shortcut { ends, .. }, Direction::Forward) => (ends[0], ends[1]),
            (EdgeKind::Shortcut { ends, .. }, Direction::Backward) => (ends[1], ends[0]),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("edge {edge} references node {node} but the graph only has {num_nodes} nodes")]
    NodeOutOfRange { edge: EdgeId, node: NodeId, num_nodes: usize },
    #[error("shortcut {edge} skips edge {skipped} which was not added before it")]
    InvalidSkippedEdge { edge: EdgeId, skipped: EdgeId },
    #[error("edge {edge} has a negative or NaN distance, duration or weight")]
    InvalidMetric { edge: EdgeId },
    #[error("got {levels} node levels for a graph with {num_nodes} nodes")]
    TooManyLevels { levels: usize, num_nodes: usize },
}

/// Read access to the contraction levels of a graph.
///
/// Nodes with a level of at least `core_level` make up the core.
/// Nodes on `core_level + 1` are core nodes with turn restrictions.
/// Virtual nodes have no level, they count as level 0 and are never part of the core.
#[derive(Debug, Clone, Copy)]
pub struct ContractionLevels<'a> {
    levels: &'a [Level],
    core_level: Level,
}

impl<'a> ContractionLevels<'a> {
    pub fn core_level(&self) -> Level {
        self.core_level
    }

    pub fn turn_restricted_level(&self) -> Level {
        self.core_level + 1
    }

    #[inline]
    pub fn is_virtual(&self, node: NodeId) -> bool {
        node as usize >= self.levels.len()
    }

    #[inline]
    pub fn level(&self, node: NodeId) -> Level {
        self.levels.get(node as usize).copied().unwrap_or(0)
    }

    #[inline]
    pub fn is_core(&self, node: NodeId) -> bool {
        !self.is_virtual(node) && self.level(node) >= self.core_level
    }

    #[inline]
    pub fn is_turn_restricted(&self, node: NodeId) -> bool {
        !self.is_virtual(node) && self.level(node) == self.turn_restricted_level()
    }
}

#[derive(Debug, Clone)]
pub struct RoadGraph {
    edges: Vec<EdgeData>,
    forward: FirstOutGraph,
    backward: FirstOutGraph,
    levels: Option<Vec<Level>>,
    core_level: Level,
}

impl RoadGraph {
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn edge(&self, edge_id: EdgeId) -> &EdgeData {
        &self.edges[edge_id as usize]
    }

    pub fn edges(&self) -> &[EdgeData] {
        &self.edges
    }

    /// Links of `node` in the given search direction.
    /// Forward yields the nodes reachable from `node`, backward the nodes `node` can be reached from.
    #[inline]
    pub fn links(&self, node: NodeId, direction: Direction) -> <FirstOutGraph as LinkIterable<LinkWithId>>::Iter<'_> {
        match direction {
            Direction::Forward => self.forward.link_iter(node),
            Direction::Backward => self.backward.link_iter(node),
        }
    }

    /// `None` if the graph was never contracted.
    pub fn levels(&self) -> Option<ContractionLevels<'_>> {
        self.levels.as_ref().map(|levels| ContractionLevels {
            levels,
            core_level: self.core_level,
        })
    }
}

impl Graph for RoadGraph {
    fn num_nodes(&self) -> usize {
        self.forward.num_nodes()
    }

    fn num_arcs(&self) -> usize {
        self.forward.num_arcs()
    }

    fn degree(&self, node: NodeId) -> usize {
        self.forward.degree(node)
    }
}

/// Incrementally assemble a `RoadGraph`.
///
/// Edge ids are handed out in insertion order.
/// Shortcuts have to be added after the edges they skip.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    num_nodes: usize,
    edges: Vec<EdgeData>,
    levels: Option<Vec<Level>>,
    core_level: Level,
}

impl GraphBuilder {
    pub fn new(num_nodes: usize) -> Self {
        GraphBuilder {
            num_nodes,
            ..Default::default()
        }
    }

    pub fn add_edge(&mut self, tail: NodeId, head: NodeId, distance: f64, duration: f64, forward: bool, backward: bool) -> EdgeId {
        let id = self.edges.len() as EdgeId;
        self.add_virtual_edge(tail, head, distance, duration, forward, backward, id)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_virtual_edge(&mut self, tail: NodeId, head: NodeId, distance: f64, duration: f64, forward: bool, backward: bool, original: EdgeId) -> EdgeId {
        self.push(EdgeData {
            tail,
            head,
            distance,
            duration,
            forward,
            backward,
            original,
            kind: EdgeKind::Base,
        })
    }

    /// One way shortcut from `tail` to `head`.
    /// Distance, duration and end edges are filled in from the skipped edges on `build`.
    pub fn add_shortcut(&mut self, tail: NodeId, head: NodeId, skipped: [EdgeId; 2], weight: Weight) -> EdgeId {
        let id = self.edges.len() as EdgeId;
        self.push(EdgeData {
            tail,
            head,
            distance: 0.0,
            duration: 0.0,
            forward: true,
            backward: false,
            original: id,
            kind: EdgeKind::Shortcut {
                skipped,
                weight,
                ends: [NO_EDGE; 2],
            },
        })
    }

    /// Attach contraction levels for the first `levels.len()` nodes, all others are virtual.
    pub fn contraction_levels(&mut self, levels: Vec<Level>, core_level: Level) -> &mut Self {
        self.levels = Some(levels);
        self.core_level = core_level;
        self
    }

    fn push(&mut self, edge: EdgeData) -> EdgeId {
        self.edges.push(edge);
        (self.edges.len() - 1) as EdgeId
    }

    pub fn build(mut self) -> Result<RoadGraph, GraphError> {
        let num_nodes = self.num_nodes;
        if let Some(levels) = &self.levels {
            if levels.len() > num_nodes {
                return Err(GraphError::TooManyLevels { levels: levels.len(), num_nodes });
            }
        }

        for edge_id in 0..self.edges.len() {
            let edge = self.edges[edge_id];
            let id = edge_id as EdgeId;
            for node in [edge.tail, edge.head] {
                if node as usize >= num_nodes {
                    return Err(GraphError::NodeOutOfRange { edge: id, node, num_nodes });
                }
            }
            match edge.kind {
                EdgeKind::Base => {
                    if !(edge.distance >= 0.0 && edge.duration >= 0.0) {
                        return Err(GraphError::InvalidMetric { edge: id });
                    }
                }
                EdgeKind::Shortcut { skipped, weight, .. } => {
                    if !(weight >= 0.0) {
                        return Err(GraphError::InvalidMetric { edge: id });
                    }
                    let (mut distance, mut duration) = (0.0, 0.0);
                    let mut ends = [NO_EDGE; 2];
                    for (i, skipped) in skipped.into_iter().enumerate() {
                        if skipped >= id {
                            return Err(GraphError::InvalidSkippedEdge { edge: id, skipped });
                        }
                        // skipped shortcuts were completed in earlier iterations
                        let inner = self.edges[skipped as usize];
                        distance += inner.distance;
                        duration += inner.duration;
                        ends[i] = match inner.kind {
                            EdgeKind::Base => skipped,
                            EdgeKind::Shortcut { ends: inner_ends, .. } => inner_ends[i],
                        };
                    }
                    let edge = &mut self.edges[edge_id];
                    edge.distance = distance;
                    edge.duration = duration;
                    edge.kind = EdgeKind::Shortcut { skipped, weight, ends };
                }
            }
        }

        let mut forward = vec![Vec::new(); num_nodes];
        let mut backward = vec![Vec::new(); num_nodes];
        for (edge_id, edge) in self.edges.iter().enumerate() {
            let edge_id = edge_id as EdgeId;
            if edge.forward {
                forward[edge.tail as usize].push(LinkWithId { node: edge.head, edge_id });
                backward[edge.head as usize].push(LinkWithId { node: edge.tail, edge_id });
            }
            if edge.backward {
                forward[edge.head as usize].push(LinkWithId { node: edge.tail, edge_id });
                backward[edge.tail as usize].push(LinkWithId { node: edge.head, edge_id });
            }
        }

        Ok(RoadGraph {
            edges: self.edges,
            forward: FirstOutGraph::from_adjacency_lists(forward),
            backward: FirstOutGraph::from_adjacency_lists(backward),
            levels: self.levels,
            core_level: self.core_level,
        })
    }
}

const ACCESS_FORWARD: u8 = 1;
const ACCESS_BACKWARD: u8 = 2;

impl Deconstruct for RoadGraph {
    fn store_each(&self, store: &dyn Fn(&str, &dyn Store) -> std::io::Result<()>) -> std::io::Result<()> {
        let column = |f: &dyn Fn(&EdgeData) -> u32| self.edges.iter().map(f).collect::<Vec<u32>>();
        let float_column = |f: &dyn Fn(&EdgeData) -> f64| self.edges.iter().map(f).collect::<Vec<f64>>();
        let skipped = |i: usize| {
            column(&|e| match e.kind {
                EdgeKind::Base => NO_EDGE,
                EdgeKind::Shortcut { skipped, .. } => skipped[i],
            })
        };

        store("num_nodes", &vec![self.num_nodes() as u32])?;
        store("edge_tail", &column(&|e| e.tail))?;
        store("edge_head", &column(&|e| e.head))?;
        store("edge_original", &column(&|e| e.original))?;
        store(
            "edge_access",
            &self
                .edges
                .iter()
                .map(|e| u8::from(e.forward) * ACCESS_FORWARD | u8::from(e.backward) * ACCESS_BACKWARD)
                .collect::<Vec<u8>>(),
        )?;
        store("edge_distance", &float_column(&|e| e.distance))?;
        store("edge_duration", &float_column(&|e| e.duration))?;
        store("shortcut_skipped_first", &skipped(0))?;
        store("shortcut_skipped_second", &skipped(1))?;
        store(
            "shortcut_weight",
            &float_column(&|e| match e.kind {
                EdgeKind::Base => 0.0,
                EdgeKind::Shortcut { weight, .. } => weight,
            }),
        )?;
        if let Some(levels) = &self.levels {
            store("level", levels)?;
            store("core_level", &vec![self.core_level])?;
        }
        Ok(())
    }
}

impl Reconstruct for RoadGraph {
    fn reconstruct_with(loader: Loader) -> std::io::Result<Self> {
        use std::io::{Error, ErrorKind};

        let num_nodes: Vec<u32> = loader.load("num_nodes")?;
        let num_nodes = *num_nodes.first().ok_or_else(|| Error::new(ErrorKind::InvalidData, "empty num_nodes file"))? as usize;
        let tail: Vec<NodeId> = loader.load("edge_tail")?;
        let head: Vec<NodeId> = loader.load("edge_head")?;
        let original: Vec<EdgeId> = loader.load("edge_original")?;
        let access: Vec<u8> = loader.load("edge_access")?;
        let distance: Vec<f64> = loader.load("edge_distance")?;
        let duration: Vec<f64> = loader.load("edge_duration")?;
        let skipped_first: Vec<EdgeId> = loader.load("shortcut_skipped_first")?;
        let skipped_second: Vec<EdgeId> = loader.load("shortcut_skipped_second")?;
        let shortcut_weight: Vec<Weight> = loader.load("shortcut_weight")?;

        let m = tail.len();
        for len in [head.len(), original.len(), access.len(), distance.len(), duration.len(), skipped_first.len(), skipped_second.len(), shortcut_weight.len()] {
            if len != m {
                return Err(Error::new(ErrorKind::InvalidData, "edge attribute files differ in length"));
            }
        }

        let mut builder = GraphBuilder::new(num_nodes);
        for e in 0..m {
            if skipped_first[e] != NO_EDGE {
                builder.add_shortcut(tail[e], head[e], [skipped_first[e], skipped_second[e]], shortcut_weight[e]);
            } else {
                builder.add_virtual_edge(
                    tail[e],
                    head[e],
                    distance[e],
                    duration[e],
                    access[e] & ACCESS_FORWARD != 0,
                    access[e] & ACCESS_BACKWARD != 0,
                    original[e],
                );
            }
        }

        if loader.exists("level") {
            let levels: Vec<Level> = loader.load("level")?;
            let core_level: Vec<Level> = loader.load("core_level")?;
            let core_level = *core_level.first().ok_or_else(|| Error::new(ErrorKind::InvalidData, "empty core_level file"))?;
            builder.contraction_levels(levels, core_level);
        }

        builder.build().map_err(|e| Error::new(ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> GraphBuilder {
        let mut builder = GraphBuilder::new(3);
        builder.add_edge(0, 1, 10.0, 1.0, true, true);
        builder.add_edge(1, 2, 20.0, 2.0, true, false);
        builder
    }

    #[test]
    fn two_way_edges_show_up_in_both_directions() {
        let graph = triangle().build().unwrap();
        assert_eq!(graph.links(1, Direction::Forward).collect::<Vec<_>>(), vec![LinkWithId { node: 0, edge_id: 0 }, LinkWithId { node: 2, edge_id: 1 }]);
        assert_eq!(graph.links(2, Direction::Backward).collect::<Vec<_>>(), vec![LinkWithId { node: 1, edge_id: 1 }]);
        assert_eq!(graph.links(2, Direction::Forward).count(), 0);
        assert!(graph.levels().is_none());
    }

    #[test]
    fn shortcuts_sum_up_skipped_edges() {
        let mut builder = triangle();
        let shortcut = builder.add_shortcut(0, 2, [0, 1], 3.0);
        builder.contraction_levels(vec![2, 1, 3], 3);
        let graph = builder.build().unwrap();
        let edge = graph.edge(shortcut);
        assert_eq!(edge.distance, 30.0);
        assert_eq!(edge.duration, 3.0);
        assert!(edge.is_shortcut());
        assert_eq!(edge.turn_edges(shortcut, Direction::Forward), (0, 1));
        assert_eq!(edge.turn_edges(shortcut, Direction::Backward), (1, 0));
        assert_eq!(graph.edge(1).turn_edges(1, Direction::Backward), (1, 1));

        let levels = graph.levels().unwrap();
        assert!(levels.is_core(2));
        assert!(!levels.is_core(1));
    }

    #[test]
    fn nested_shortcuts_end_in_base_edges() {
        let mut builder = GraphBuilder::new(4);
        builder.add_edge(0, 1, 1.0, 1.0, true, true);
        builder.add_edge(1, 2, 1.0, 1.0, true, true);
        builder.add_edge(2, 3, 1.0, 1.0, true, true);
        let inner = builder.add_shortcut(1, 3, [1, 2], 2.0);
        let outer = builder.add_shortcut(0, 3, [0, inner], 3.0);
        let graph = builder.build().unwrap();
        assert_eq!(graph.edge(outer).turn_edges(outer, Direction::Forward), (0, 2));
        assert_eq!(graph.edge(outer).distance, 3.0);
    }

    #[test]
    fn rejects_shortcuts_over_later_edges() {
        let mut builder = triangle();
        builder.add_shortcut(0, 2, [0, 7], 3.0);
        assert_eq!(builder.build().unwrap_err(), GraphError::InvalidSkippedEdge { edge: 2, skipped: 7 });
    }

    #[test]
    fn rejects_dangling_edges() {
        let mut builder = GraphBuilder::new(2);
        builder.add_edge(0, 5, 1.0, 1.0, true, true);
        assert!(matches!(builder.build(), Err(GraphError::NodeOutOfRange { node: 5, .. })));
    }

    #[test]
    fn nodes_without_level_are_virtual() {
        let mut builder = GraphBuilder::new(4);
        builder.contraction_levels(vec![1, 5, 6], 5);
        let graph = builder.build().unwrap();
        let levels = graph.levels().unwrap();
        assert!(levels.is_virtual(3));
        assert!(!levels.is_core(3));
        assert_eq!(levels.level(3), 0);
        assert!(levels.is_turn_restricted(2));
        assert!(levels.is_core(1) && !levels.is_turn_restricted(1));
    }

    #[test]
    fn survives_a_trip_to_disk() {
        let dir = std::env::temp_dir().join(format!("core_matrix_road_graph_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut builder = triangle();
        builder.add_virtual_edge(2, 0, 5.0, 0.5, false, true, 1);
        builder.add_shortcut(0, 2, [0, 1], 3.0);
        builder.contraction_levels(vec![0, 1, 2], 2);
        let graph = builder.build().unwrap();
        graph.deconstruct_to(&dir).unwrap();

        let reloaded = RoadGraph::reconstruct_from(&dir).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(reloaded.edges(), graph.edges());
        assert_eq!(reloaded.num_nodes(), 3);
        assert_eq!(reloaded.links(0, Direction::Backward).collect::<Vec<_>>(), graph.links(0, Direction::Backward).collect::<Vec<_>>());
        assert_eq!(reloaded.levels().unwrap().core_level(), 2);
    }
}
