//! The part of the downward graph which leads to the destinations.
//!
//! Similar to the target selection of RPHAST, but restricted to the hierarchy below the core.
//! Starting from all destinations, edges are explored against the search direction towards higher levels.
//! Exploration stops at the core: a core node reached from below is an exit point, where the core search
//! can leave the core towards the destinations.
//! Destinations which are core nodes themselves are exit points right away.

use super::filter::CoreEdgeFilter;
use crate::{datastr::graph::*, util::in_range_option::InRangeOption};

#[derive(Debug, Clone)]
pub struct TargetGraph {
    // global id -> local id
    local_ids: Vec<InRangeOption<NodeId>>,
    // local id -> global id
    nodes: Vec<NodeId>,
    exit_point: Vec<bool>,
    queue: Vec<NodeId>,
    // (local id of upper node, lower node, edge) in discovery order
    arcs: Vec<(NodeId, NodeId, EdgeId)>,
    // downward adjacency by local id of the upper node
    first_out: Vec<EdgeId>,
    head: Vec<NodeId>,
    edge_ids: Vec<EdgeId>,
    num_exit_points: usize,
}

impl TargetGraph {
    pub fn new(num_nodes: usize) -> TargetGraph {
        TargetGraph {
            local_ids: vec![InRangeOption::NONE; num_nodes],
            nodes: Vec::new(),
            exit_point: Vec::new(),
            queue: Vec::new(),
            arcs: Vec::new(),
            first_out: vec![0],
            head: Vec::new(),
            edge_ids: Vec::new(),
            num_exit_points: 0,
        }
    }

    fn clear(&mut self) {
        for node in self.nodes.drain(..) {
            self.local_ids[node as usize] = InRangeOption::NONE;
        }
        self.exit_point.clear();
        self.queue.clear();
        self.arcs.clear();
        self.first_out.truncate(1);
        self.head.clear();
        self.edge_ids.clear();
        self.num_exit_points = 0;
    }

    // returns the local id and whether the node is new
    fn add_node(&mut self, node: NodeId) -> (NodeId, bool) {
        if let Some(local) = self.local_ids[node as usize].value() {
            return (local, false);
        }
        let local = self.nodes.len() as NodeId;
        self.local_ids[node as usize] = InRangeOption::some(local);
        self.nodes.push(node);
        self.exit_point.push(false);
        (local, true)
    }

    fn mark_exit_point(&mut self, local: NodeId) {
        if !self.exit_point[local as usize] {
            self.exit_point[local as usize] = true;
            self.num_exit_points += 1;
        }
    }

    /// Select the target graph for the given destinations.
    /// `search_direction` is the direction of the searches which will later walk down the target graph.
    pub fn build(&mut self, graph: &RoadGraph, filter: &CoreEdgeFilter, destinations: &[Option<NodeId>], search_direction: Direction) {
        self.clear();
        let levels = filter.levels();

        for &node in destinations.iter().flatten() {
            let (local, new) = self.add_node(node);
            if levels.is_core(node) {
                self.mark_exit_point(local);
            } else if new {
                self.queue.push(node);
            }
        }

        let explore = search_direction.reversed();
        while let Some(node) = self.queue.pop() {
            for link in graph.links(node, explore) {
                if !filter.accept_target_graph(node, link.node) {
                    continue;
                }
                let (upper, new) = self.add_node(link.node);
                self.arcs.push((upper, node, link.edge_id));
                if levels.is_core(link.node) {
                    self.mark_exit_point(upper);
                } else if new {
                    self.queue.push(link.node);
                }
            }
        }

        // bucket arcs by their upper node
        let mut degrees = vec![0 as EdgeId; self.nodes.len()];
        for &(upper, _, _) in &self.arcs {
            degrees[upper as usize] += 1;
        }
        self.first_out.clear();
        self.first_out.extend(degrees_to_first_out(degrees.into_iter()));
        let mut next: Vec<EdgeId> = self.first_out[..self.nodes.len()].to_vec();
        self.head.resize(self.arcs.len(), 0);
        self.edge_ids.resize(self.arcs.len(), 0);
        for &(upper, lower, edge_id) in &self.arcs {
            let pos = next[upper as usize] as usize;
            self.head[pos] = lower;
            self.edge_ids[pos] = edge_id;
            next[upper as usize] += 1;
        }
    }

    #[inline]
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.local_ids[node as usize].value().is_some()
    }

    #[cfg(test)]
    fn is_exit_point(&self, node: NodeId) -> bool {
        self.local_ids[node as usize].value().map_or(false, |local| self.exit_point[local as usize])
    }

    #[cfg(test)]
    fn exit_points(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().zip(self.exit_point.iter()).filter(|(_, &exit)| exit).map(|(&node, _)| node)
    }

    pub fn num_exit_points(&self) -> usize {
        self.num_exit_points
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.head.len()
    }

    /// Edges from `node` one step closer to the destinations, in search direction.
    pub fn downward_links(&self, node: NodeId) -> impl Iterator<Item = LinkWithId> + '_ {
        let range = match self.local_ids[node as usize].value() {
            Some(local) => neighbor_range(&self.first_out, local),
            None => 0..0,
        };
        self.head[range.clone()]
            .iter()
            .zip(self.edge_ids[range].iter())
            .map(|(&node, &edge_id)| LinkWithId { node, edge_id })
    }
}
