//! Many-to-many cost matrices on contraction hierarchies with an uncontracted core.
//!
//! Turn restricted and otherwise hard to contract parts of the network stay uncontracted as the core,
//! everything else is contracted into a regular hierarchy around it.
//! A matrix query runs in two phases over one shared multi origin search forest:
//!
//! 1. All sources are relaxed upward at once. Core nodes are not expanded but recorded as entry points.
//! 2. A many-to-many search continues from the entry points through the core and leaves it at the exit points
//!    of the target graph, following the target graph down to the destinations.
//!    Paths which meet below the core never enter it, they are found by walking the target graph from
//!    upward search nodes directly.
//!
//! Both phases are label correcting: tree entries carry one cost per origin and are queued by an aggregated key,
//! so an entry may be settled several times until all of its costs are final.
//! Turn costs only apply at nodes whose entries are kept per incoming edge, which are the core nodes
//! (or, in approximate mode, just the turn restricted ones).
//!
//! When there are more sources than destinations, the search runs backward from the destinations
//! and the tables are transposed in the end.

use crate::{
    algo::{weighting::*, MatrixQueryServer},
    datastr::{graph::*, index_heap::IndexdMinHeap, timestamped_vector::TimestampedVector},
    matrix::*,
    util::{in_range_option::InRangeOption, NonNan},
};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

mod config;
pub mod filter;
mod metrics;
pub mod target_graph;
mod targets;
mod trace;
pub mod tree;
pub mod turns;

pub use self::config::*;
pub use self::filter::{CoreEdgeFilter, EdgeFilter};
use self::metrics::MetricsExtractor;
use self::target_graph::TargetGraph;
use self::targets::TargetMap;
pub use self::trace::*;
use self::tree::*;
use self::turns::turn_mode;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MatrixError {
    #[error("the graph has no contraction levels, core matrix queries need a contraction hierarchy")]
    NotContracted,
    #[error("location at node {node} is outside of the graph with {num_nodes} nodes")]
    NodeOutOfRange { node: NodeId, num_nodes: usize },
}

/// Counters of the last query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub swapped: bool,
    pub visited_nodes: usize,
    pub core_entry_points: usize,
    pub core_exit_points: usize,
    pub target_graph_nodes: usize,
    pub target_graph_edges: usize,
    pub tree_entries: usize,
    pub budget_exhausted: bool,
}

/// Matrix query server, one per thread.
/// Borrows graph, weighting and edge filter, all per query state is owned and reused between queries.
pub struct Server<'a, W> {
    graph: &'a RoadGraph,
    levels: ContractionLevels<'a>,
    weighting: &'a W,
    restrictions: Option<&'a dyn EdgeFilter>,
    config: MatrixConfig,

    direction: Direction,
    origins: usize,
    forest: MultiTreeForest,
    node_slots: TimestampedVector<InRangeOption<Slot>>,
    edge_slots: HashMap<(NodeId, EdgeId), Slot>,
    queue: IndexdMinHeap<State>,
    target_graph: TargetGraph,
    targets: TargetMap,
    entry_points: Vec<Slot>,
    // items of the entry currently relaxed, as they were when it was popped
    scratch: Vec<CostItem>,
    links: Vec<LinkWithId>,
    destinations: Vec<Option<NodeId>>,
    stats: SearchStats,
}

impl<'a, W: Weighting> Server<'a, W> {
    pub fn new(graph: &'a RoadGraph, weighting: &'a W, config: MatrixConfig) -> Result<Self, MatrixError> {
        let levels = graph.levels().ok_or(MatrixError::NotContracted)?;
        let n = graph.num_nodes();

        Ok(Server {
            graph,
            levels,
            weighting,
            restrictions: None,
            config,
            direction: Direction::Forward,
            origins: 0,
            forest: MultiTreeForest::new(0),
            node_slots: TimestampedVector::new(n, InRangeOption::NONE),
            edge_slots: HashMap::new(),
            queue: IndexdMinHeap::new(0),
            target_graph: TargetGraph::new(n),
            targets: TargetMap::new(),
            entry_points: Vec::new(),
            scratch: Vec::new(),
            links: Vec::new(),
            destinations: Vec::new(),
            stats: SearchStats::default(),
        })
    }

    /// Restrict the edges usable inside the core.
    pub fn with_edge_filter(mut self, restrictions: &'a dyn EdgeFilter) -> Self {
        self.restrictions = Some(restrictions);
        self
    }

    pub fn config(&self) -> &MatrixConfig {
        &self.config
    }

    /// Counters of the last query.
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    pub fn compute(&mut self, request: &MatrixRequest) -> Result<MatrixResult, MatrixError> {
        self.compute_traced(request, &mut NoTrace)
    }

    /// Like `compute`, reporting search events to `trace`.
    pub fn compute_traced<T: SearchTrace>(&mut self, request: &MatrixRequest, trace: &mut T) -> Result<MatrixResult, MatrixError> {
        self.validate(&request.sources)?;
        self.validate(&request.destinations)?;

        let swap = self.config.should_swap(request.sources.len(), request.destinations.len());
        let (sources, destinations) = if swap {
            (&request.destinations, &request.sources)
        } else {
            (&request.sources, &request.destinations)
        };
        self.direction = if swap { Direction::Backward } else { Direction::Forward };
        self.reset(sources.len());
        self.stats.swapped = swap;

        let extractor = MetricsExtractor::new(request.metrics, request.units);
        let mut tables = MatrixTables::new(request.metrics, sources.len(), destinations.len());

        if !sources.has_valid_nodes() || !destinations.has_valid_nodes() {
            extractor.set_empty_values(&mut tables);
        } else {
            let filter = self.filter();
            self.target_graph.build(self.graph, &filter, destinations.nodes(), self.direction);
            self.targets.reset(sources.nodes(), destinations.nodes());

            self.fill_edges_outside_core(sources.nodes(), trace);
            self.fill_edges_in_core(trace);

            extractor.calc_values(&self.targets, destinations.nodes(), &mut tables);
        }

        self.destinations.clear();
        self.destinations.extend_from_slice(destinations.nodes());
        self.stats.core_entry_points = self.entry_points.len();
        self.stats.core_exit_points = self.target_graph.num_exit_points();
        self.stats.target_graph_nodes = self.target_graph.num_nodes();
        self.stats.target_graph_edges = self.target_graph.num_edges();
        self.stats.tree_entries = self.forest.len();

        if swap {
            tables = tables.transposed();
        }

        Ok(MatrixResult {
            sources: request.sources.coordinates(),
            destinations: request.destinations.coordinates(),
            tables,
        })
    }

    /// Replay the path of the last query from `source` to `destination` into `trace`,
    /// destination first. Returns `false` if there is no such path.
    /// Indices refer to the request as passed to `compute`, not to the possibly swapped search.
    pub fn trace_path<T: SearchTrace>(&self, source: usize, destination: usize, trace: &mut T) -> bool {
        let (origin, target) = if self.stats.swapped { (destination, source) } else { (source, destination) };
        if origin >= self.origins {
            return false;
        }
        let Some(mut node) = self.destinations.get(target).copied().flatten() else {
            return false;
        };
        let Some(mut item) = self.targets.items(node).map(|items| items[origin]) else {
            return false;
        };
        if !item.is_reached() {
            return false;
        }

        for _ in 0..=self.forest.len() {
            trace.path_step(node, item.edge, item.weight);
            match item.parent.value() {
                Some(parent) => {
                    node = self.forest.entry(parent).node;
                    item = self.forest.items(parent)[origin];
                }
                None => return true,
            }
        }
        false
    }

    fn validate(&self, locations: &MatrixLocations) -> Result<(), MatrixError> {
        let num_nodes = self.graph.num_nodes();
        match locations.nodes().iter().flatten().find(|&&node| node as usize >= num_nodes) {
            Some(&node) => Err(MatrixError::NodeOutOfRange { node, num_nodes }),
            None => Ok(()),
        }
    }

    fn filter(&self) -> CoreEdgeFilter<'a> {
        CoreEdgeFilter::new(self.levels, self.restrictions)
    }

    fn reset(&mut self, origins: usize) {
        self.origins = origins;
        self.forest.reset(origins);
        self.node_slots.reset();
        self.edge_slots.clear();
        self.queue.clear();
        self.entry_points.clear();
        self.stats = SearchStats::default();
    }

    fn budget_exhausted(&self) -> bool {
        self.stats.visited_nodes > self.config.max_visited_nodes
    }

    // Entries of these nodes are kept per incoming edge, turn costs are charged at them and nowhere else.
    fn is_edge_based(&self, node: NodeId) -> bool {
        self.weighting.has_turn_costs() && self.levels.is_core(node) && (!self.config.approximate || self.levels.is_turn_restricted(node))
    }

    fn existing_slot(&self, node: NodeId, edge: EdgeId) -> Option<Slot> {
        if self.is_edge_based(node) {
            self.edge_slots.get(&(node, edge)).copied()
        } else {
            self.node_slots.get(node as usize).value()
        }
    }

    fn create_slot(&mut self, node: NodeId, edge: EdgeId, original_edge: EdgeId) -> Slot {
        let slot = self.forest.add_entry(node, edge, original_edge);
        self.queue.reserve_index(self.forest.len());
        if self.is_edge_based(node) {
            self.edge_slots.insert((node, edge), slot);
        } else {
            self.node_slots.set(node as usize, InRangeOption::some(slot));
        }
        slot
    }

    fn enqueue(&mut self, slot: Slot) {
        let key = self.config.priority.key(self.forest.items(slot));
        self.queue.push_or_update(State { key: NonNan::assume(key), slot });
    }

    fn update_target(&mut self, slot: Slot) {
        let node = self.forest.entry(slot).node;
        if self.targets.is_target(node) {
            self.targets.fold(node, self.forest.items(slot));
        }
    }

    fn prepare_source_nodes<T: SearchTrace>(&mut self, sources: &[Option<NodeId>], trace: &mut T) {
        for (origin, &node) in sources.iter().enumerate() {
            let Some(node) = node else {
                continue;
            };
            // coinciding sources share one entry
            let slot = match self.existing_slot(node, NO_EDGE) {
                Some(slot) => slot,
                None => self.create_slot(node, NO_EDGE, NO_EDGE),
            };
            trace.improved(node, origin, INFINITY, 0.0);
            self.forest.items_mut(slot)[origin] = CostItem::root();
            self.enqueue(slot);
            self.update_target(slot);
        }
    }

    fn fill_edges_outside_core<T: SearchTrace>(&mut self, sources: &[Option<NodeId>], trace: &mut T) {
        self.prepare_source_nodes(sources, trace);
        let filter = self.filter();
        let graph = self.graph;

        while !self.budget_exhausted() {
            let Some(State { slot, .. }) = self.queue.pop() else {
                break;
            };
            let node = self.forest.entry(slot).node;
            self.stats.visited_nodes += 1;
            trace.settled(node, Phase::OutsideCore);

            if self.levels.is_core(node) {
                let entry = self.forest.entry_mut(slot);
                if !entry.entry_point {
                    entry.entry_point = true;
                    self.entry_points.push(slot);
                }
                continue;
            }

            self.links.clear();
            self.links
                .extend(graph.links(node, self.direction).filter(|link| filter.accept_upward(node, link.node)));
            self.relax_links(slot, trace);
        }
    }

    fn fill_edges_in_core<T: SearchTrace>(&mut self, trace: &mut T) {
        if self.budget_exhausted() {
            self.stats.budget_exhausted = true;
            return;
        }

        for i in 0..self.entry_points.len() {
            let slot = self.entry_points[i];
            self.seed(slot);
        }
        // upward search entries from which the destinations can be reached without the core
        for slot in 0..self.forest.len() as Slot {
            let node = self.forest.entry(slot).node;
            if !self.levels.is_core(node) && self.target_graph.contains_node(node) {
                self.seed(slot);
            }
        }

        let filter = self.filter();
        let graph = self.graph;

        while !self.budget_exhausted() {
            if self.config.priority == PriorityAggregation::Minimum {
                if let Some(state) = self.queue.peek() {
                    // queue keys are lower bounds for everything still to come
                    if state.key.value() >= self.targets.weight_bound() {
                        break;
                    }
                }
            }
            let Some(State { slot, .. }) = self.queue.pop() else {
                break;
            };
            let node = self.forest.entry(slot).node;
            self.stats.visited_nodes += 1;
            trace.settled(node, Phase::InCore);

            self.links.clear();
            if self.levels.is_core(node) {
                self.links.extend(
                    graph
                        .links(node, self.direction)
                        .filter(|&link| filter.accept_core(link, graph.edge(link.edge_id))),
                );
            }
            self.links.extend(self.target_graph.downward_links(node));
            self.relax_links(slot, trace);
        }

        self.stats.budget_exhausted = self.budget_exhausted();
    }

    // Make all reached costs of an entry count as new for the core phase.
    fn seed(&mut self, slot: Slot) {
        let mut any = false;
        for item in self.forest.items_mut(slot) {
            if item.is_reached() {
                item.update = true;
                any = true;
            }
        }
        if any {
            self.enqueue(slot);
        }
    }

    // Relax `self.links` from the entry at `slot`, for all origins with costs improved since its last relaxation.
    fn relax_links<T: SearchTrace>(&mut self, slot: Slot, trace: &mut T) {
        let base = self.forest.entry(slot).node;
        self.scratch.clear();
        self.scratch.extend_from_slice(self.forest.items(slot));
        for item in self.forest.items_mut(slot) {
            item.update = false;
        }

        let links = std::mem::take(&mut self.links);
        for &link in &links {
            self.relax(slot, base, link, trace);
        }
        self.links = links;
    }

    fn relax<T: SearchTrace>(&mut self, parent: Slot, base: NodeId, link: LinkWithId, trace: &mut T) {
        let graph = self.graph;
        let edge = graph.edge(link.edge_id);
        let (first, last) = edge.turn_edges(link.edge_id, self.direction);
        let (first_original, last_original) = (graph.edge(first).original, graph.edge(last).original);
        let turns = self.is_edge_based(base);
        let mut target = self.existing_slot(link.node, link.edge_id);
        let mut improved = false;

        for origin in 0..self.origins {
            let item = self.scratch[origin];
            if !item.update || !item.is_reached() {
                continue;
            }
            let mode = if turns {
                turn_mode(item.turn_edge, item.original_edge, first, first_original)
            } else {
                TurnMode::Unrestricted
            };
            let edge_weight = self
                .weighting
                .calc_weight(graph, link.edge_id, base, self.direction, item.original_edge, mode);
            if edge_weight == INFINITY {
                continue;
            }
            let weight = item.weight + edge_weight;
            let current = target.map_or(INFINITY, |slot| self.forest.items(slot)[origin].weight);
            if weight >= current {
                continue;
            }

            let slot = match target {
                Some(slot) => slot,
                None => {
                    let slot = self.create_slot(link.node, link.edge_id, last_original);
                    target = Some(slot);
                    slot
                }
            };
            let turn_duration = self
                .weighting
                .calc_turn_duration(graph, link.edge_id, base, self.direction, item.original_edge, mode);
            trace.improved(link.node, origin, current, weight);
            self.forest.items_mut(slot)[origin].improve(CostItem {
                weight,
                distance: item.distance + edge.distance,
                duration: item.duration + edge.duration + turn_duration,
                edge: link.edge_id,
                turn_edge: last,
                original_edge: last_original,
                parent: InRangeOption::some(parent),
                update: true,
            });
            improved = true;
        }

        if let Some(slot) = target.filter(|_| improved) {
            self.enqueue(slot);
            self.update_target(slot);
        }
    }
}

impl<'a, W: Weighting> MatrixQueryServer for Server<'a, W> {
    type Error = MatrixError;

    fn matrix(&mut self, request: &MatrixRequest) -> Result<MatrixResult, MatrixError> {
        self.compute(request)
    }
}
