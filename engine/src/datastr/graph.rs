//! Road graphs with contraction hierarchy levels and an uncontracted core.
//!
//! Several traits and structs for working with graphs.

use std::ops::Range;

pub mod first_out_graph;
pub mod road_graph;

pub use self::first_out_graph::FirstOutGraph;
pub use self::road_graph::{ContractionLevels, EdgeData, EdgeKind, GraphBuilder, GraphError, RoadGraph};

/// Node ids are 32bit unsigned ints
pub type NodeId = u32;
/// Edge ids are 32bit unsigned ints
pub type EdgeId = u32;
/// Weights are generalized costs (seconds, meters or anything a weighting comes up with).
pub type Weight = f64;
/// Unreachable or forbidden.
pub const INFINITY: Weight = f64::INFINITY;
/// Contraction level of a node. Higher is more important.
pub type Level = u32;

/// Placeholder edge id for the root of a search tree, where no edge was used yet.
pub const NO_EDGE: EdgeId = EdgeId::MAX;

/// Direction in which a search walks the edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Along the allowed travel direction, from sources towards targets.
    Forward,
    /// Against the allowed travel direction, from targets towards sources.
    Backward,
}

impl Direction {
    pub fn reversed(self) -> Direction {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }

    pub fn is_backward(self) -> bool {
        self == Direction::Backward
    }
}

/// An adjacent node together with the id of the edge leading there.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LinkWithId {
    pub node: NodeId,
    pub edge_id: EdgeId,
}

/// Base trait for graphs.
/// Interesting behaviour will be added through subtraits.
pub trait Graph {
    fn num_nodes(&self) -> usize;
    fn num_arcs(&self) -> usize;
    fn degree(&self, node: NodeId) -> usize;
}

pub trait LinkIterable<Link>: Graph {
    /// Type of the outgoing neighbor iterator.
    type Iter<'a>: Iterator<Item = Link>
    where
        Self: 'a;

    /// Get a iterator over the outgoing links of the given node.
    fn link_iter(&self, node: NodeId) -> Self::Iter<'_>;
}

/// Create a `first_out` array from node degrees by doing a prefix sum.
pub fn degrees_to_first_out<I: Iterator<Item = EdgeId>>(degrees: I) -> impl Iterator<Item = EdgeId> {
    std::iter::once(0).chain(degrees.scan(0, |state, degree| {
        *state += degree;
        Some(*state)
    }))
}

/// Index range of the arcs of `node` within a `first_out` array.
#[inline]
pub fn neighbor_range(first_out: &[EdgeId], node: NodeId) -> Range<usize> {
    let node = node as usize;
    first_out[node] as usize..first_out[node + 1] as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_out_is_prefix_sum() {
        let first_out: Vec<EdgeId> = degrees_to_first_out(vec![2, 0, 3].into_iter()).collect();
        assert_eq!(first_out, vec![0, 2, 2, 5]);
        assert_eq!(neighbor_range(&first_out, 2), 2..5);
    }
}
