//! Static adjacency array representation.
//!
//! Nodes and arcs are identified by a unique id, going from `0` to `n-1` and `m-1` respectively.
//! We store the arcs using three collections: `first_out`, `head` and `edge_id`.
//! `head` and `edge_id` have each `m` elements, `first_out` has `n+1` elements.
//! The first element of `first_out` is always 0 and the last one `m`.
//! `head[first_out[x]..first_out[x+1]]` contains all neighbors of `x`.
//!
//! Arcs do not carry weights but the id of the road graph edge they were created from.
//! One edge which may be traversed in both directions shows up as two arcs with the same edge id.

use super::*;

#[derive(Debug, Clone)]
pub struct FirstOutGraph {
    // index of first arc of each node +1 entry in the end
    first_out: Vec<EdgeId>,
    // the node ids to which each arc points
    head: Vec<NodeId>,
    // the edge each arc belongs to
    edge_id: Vec<EdgeId>,
}

impl FirstOutGraph {
    /// Create a new `FirstOutGraph` from the three containers.
    pub fn new(first_out: Vec<EdgeId>, head: Vec<NodeId>, edge_id: Vec<EdgeId>) -> FirstOutGraph {
        assert!(first_out.len() < NodeId::MAX as usize);
        assert!(head.len() < EdgeId::MAX as usize);
        assert_eq!(first_out.first().copied(), Some(0));
        assert_eq!(first_out.last().map(|&m| m as usize), Some(head.len()));
        assert_eq!(edge_id.len(), head.len());

        FirstOutGraph { first_out, head, edge_id }
    }

    pub fn from_adjacency_lists(adjacency_lists: Vec<Vec<LinkWithId>>) -> FirstOutGraph {
        let first_out = degrees_to_first_out(adjacency_lists.iter().map(|links| links.len() as EdgeId)).collect();
        let (head, edge_id) = adjacency_lists
            .into_iter()
            .flat_map(|links| links.into_iter().map(|LinkWithId { node, edge_id }| (node, edge_id)))
            .unzip();

        FirstOutGraph::new(first_out, head, edge_id)
    }

    /// Borrow a slice of the first_out data
    pub fn first_out(&self) -> &[EdgeId] {
        &self.first_out
    }
    /// Borrow a slice of the head data
    pub fn head(&self) -> &[NodeId] {
        &self.head
    }
}

impl Graph for FirstOutGraph {
    fn num_nodes(&self) -> usize {
        self.first_out.len() - 1
    }

    fn num_arcs(&self) -> usize {
        self.head.len()
    }

    fn degree(&self, node: NodeId) -> usize {
        neighbor_range(&self.first_out, node).len()
    }
}

impl LinkIterable<LinkWithId> for FirstOutGraph {
    #[allow(clippy::type_complexity)]
    type Iter<'a> = std::iter::Map<std::iter::Zip<std::slice::Iter<'a, NodeId>, std::slice::Iter<'a, EdgeId>>, fn((&NodeId, &EdgeId)) -> LinkWithId>;

    #[inline]
    fn link_iter(&self, node: NodeId) -> Self::Iter<'_> {
        let range = neighbor_range(&self.first_out, node);
        self.head[range.clone()]
            .iter()
            .zip(self.edge_id[range].iter())
            .map(|(&node, &edge_id)| LinkWithId { node, edge_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterates_links_of_node() {
        let graph = FirstOutGraph::from_adjacency_lists(vec![
            vec![LinkWithId { node: 1, edge_id: 0 }, LinkWithId { node: 2, edge_id: 1 }],
            vec![],
            vec![LinkWithId { node: 0, edge_id: 1 }],
        ]);
        assert_eq!(graph.num_nodes(), 3);
        assert_eq!(graph.num_arcs(), 3);
        assert_eq!(graph.degree(1), 0);
        assert_eq!(graph.link_iter(2).collect::<Vec<_>>(), vec![LinkWithId { node: 0, edge_id: 1 }]);
        assert_eq!(graph.link_iter(0).map(|l| l.node).collect::<Vec<_>>(), vec![1, 2]);
    }
}
