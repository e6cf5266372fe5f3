//! Which edges the search phases may relax.

use crate::datastr::graph::*;

/// Additional restriction on the edges usable inside the core, e.g. avoided road types or borders.
pub trait EdgeFilter: Sync {
    fn accept(&self, edge_id: EdgeId, edge: &EdgeData) -> bool;
}

impl<F: Fn(EdgeId, &EdgeData) -> bool + Sync> EdgeFilter for F {
    fn accept(&self, edge_id: EdgeId, edge: &EdgeData) -> bool {
        self(edge_id, edge)
    }
}

/// Level based edge selection of the three search parts.
#[derive(Clone, Copy)]
pub struct CoreEdgeFilter<'a> {
    levels: ContractionLevels<'a>,
    restrictions: Option<&'a dyn EdgeFilter>,
}

impl<'a> CoreEdgeFilter<'a> {
    pub fn new(levels: ContractionLevels<'a>, restrictions: Option<&'a dyn EdgeFilter>) -> Self {
        CoreEdgeFilter { levels, restrictions }
    }

    /// Outside the core only edges towards equal or higher levels are used.
    /// Edges touching virtual nodes are always fine, virtual nodes have no meaningful level.
    #[inline]
    pub fn accept_upward(&self, base: NodeId, adj: NodeId) -> bool {
        self.levels.is_virtual(base) || self.levels.is_virtual(adj) || self.levels.level(base) <= self.levels.level(adj)
    }

    /// Inside the core, edges have to stay within the core and pass the additional restrictions.
    #[inline]
    pub fn accept_core(&self, link: LinkWithId, edge: &EdgeData) -> bool {
        self.levels.is_core(link.node) && self.restrictions.map_or(true, |r| r.accept(link.edge_id, edge))
    }

    /// The target graph is explored from the destinations against the search direction, towards higher levels.
    #[inline]
    pub fn accept_target_graph(&self, lower: NodeId, upper: NodeId) -> bool {
        self.accept_upward(lower, upper)
    }

    pub fn levels(&self) -> ContractionLevels<'a> {
        self.levels
    }
}
