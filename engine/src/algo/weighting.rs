//! Edge and turn costs.
//!
//! A weighting turns the static edge attributes into the generalized costs the searches minimize.
//! Turn costs are looked up by original edge ids, so virtual pieces of an edge share the turn costs of the real edge.

use crate::datastr::graph::*;
use std::collections::HashMap;

/// Whether turn costs apply to a single transition between two edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnMode {
    Restricted,
    /// Turn costs and U-turn penalties are ignored.
    Unrestricted,
}

pub trait Weighting: Sync {
    /// Cost of traversing a road segment, turn costs excluded.
    fn edge_weight(&self, edge: &EdgeData) -> Weight;

    /// Cost of turning from original edge `from` onto original edge `to` at node `via`.
    fn turn_weight(&self, _from: EdgeId, _via: NodeId, _to: EdgeId) -> Weight {
        0.0
    }

    /// Time spent on the turn from `from` onto `to` at `via` in seconds.
    fn turn_duration(&self, _from: EdgeId, _via: NodeId, _to: EdgeId) -> f64 {
        0.0
    }

    fn has_turn_costs(&self) -> bool {
        false
    }

    /// Cost of relaxing `edge_id` from `via`, when the search arrived at `via` over `prev_original`.
    ///
    /// Backward searches arrive at `via` over the edge which is actually used after `edge_id`,
    /// so the turn is looked up in travel direction.
    /// Shortcuts carry their contraction time weight, turns onto them are looked up with their first base edge at `via`.
    fn calc_weight(&self, graph: &RoadGraph, edge_id: EdgeId, via: NodeId, direction: Direction, prev_original: EdgeId, turn_mode: TurnMode) -> Weight {
        let edge = graph.edge(edge_id);
        let weight = match edge.kind {
            EdgeKind::Shortcut { weight, .. } => weight,
            EdgeKind::Base => self.edge_weight(edge),
        };
        if weight == INFINITY || !self.has_turn_costs() || prev_original == NO_EDGE || turn_mode == TurnMode::Unrestricted {
            return weight;
        }
        let (from, to) = in_travel_direction(prev_original, entry_original(graph, edge_id, direction), direction);
        weight + self.turn_weight(from, via, to)
    }

    /// Turn time for the same transition `calc_weight` charges turn costs for.
    fn calc_turn_duration(&self, graph: &RoadGraph, edge_id: EdgeId, via: NodeId, direction: Direction, prev_original: EdgeId, turn_mode: TurnMode) -> f64 {
        if !self.has_turn_costs() || prev_original == NO_EDGE || turn_mode == TurnMode::Unrestricted {
            return 0.0;
        }
        let (from, to) = in_travel_direction(prev_original, entry_original(graph, edge_id, direction), direction);
        self.turn_duration(from, via, to)
    }
}

// Original id of the base edge `edge_id` starts with at the node it is relaxed from.
fn entry_original(graph: &RoadGraph, edge_id: EdgeId, direction: Direction) -> EdgeId {
    let (near, _) = graph.edge(edge_id).turn_edges(edge_id, direction);
    graph.edge(near).original
}

fn in_travel_direction(prev: EdgeId, current: EdgeId, direction: Direction) -> (EdgeId, EdgeId) {
    match direction {
        Direction::Forward => (prev, current),
        Direction::Backward => (current, prev),
    }
}

/// Turn costs and restrictions by `(from, via, to)` original edges.
#[derive(Debug, Clone, Default)]
pub struct TurnCostTable {
    costs: HashMap<(EdgeId, NodeId, EdgeId), Weight>,
    u_turn_cost: Weight,
}

impl TurnCostTable {
    /// `u_turn_cost` applies when leaving a node over the edge one arrived on, `INFINITY` forbids U-turns.
    pub fn new(u_turn_cost: Weight) -> TurnCostTable {
        TurnCostTable {
            costs: HashMap::new(),
            u_turn_cost,
        }
    }

    pub fn add_turn_cost(&mut self, from: EdgeId, via: NodeId, to: EdgeId, cost: Weight) {
        self.costs.insert((from, via, to), cost);
    }

    pub fn restrict_turn(&mut self, from: EdgeId, via: NodeId, to: EdgeId) {
        self.add_turn_cost(from, via, to, INFINITY);
    }

    pub fn cost(&self, from: EdgeId, via: NodeId, to: EdgeId) -> Weight {
        match self.costs.get(&(from, via, to)) {
            Some(&cost) => cost,
            None if from == to => self.u_turn_cost,
            None => 0.0,
        }
    }
}

/// Travel time in seconds, turn costs count as time.
#[derive(Debug, Clone, Default)]
pub struct FastestWeighting {
    turn_costs: Option<TurnCostTable>,
}

impl FastestWeighting {
    pub fn new() -> FastestWeighting {
        FastestWeighting { turn_costs: None }
    }

    pub fn with_turn_costs(turn_costs: TurnCostTable) -> FastestWeighting {
        FastestWeighting { turn_costs: Some(turn_costs) }
    }
}

impl Weighting for FastestWeighting {
    fn edge_weight(&self, edge: &EdgeData) -> Weight {
        edge.duration
    }

    fn turn_weight(&self, from: EdgeId, via: NodeId, to: EdgeId) -> Weight {
        self.turn_costs.as_ref().map(|t| t.cost(from, via, to)).unwrap_or(0.0)
    }

    fn turn_duration(&self, from: EdgeId, via: NodeId, to: EdgeId) -> f64 {
        self.turn_weight(from, via, to)
    }

    fn has_turn_costs(&self) -> bool {
        self.turn_costs.is_some()
    }
}

/// Distance in meters.
/// Forbidden turns stay forbidden, finite turn costs only show up in durations.
#[derive(Debug, Clone, Default)]
pub struct ShortestWeighting {
    turn_costs: Option<TurnCostTable>,
}

impl ShortestWeighting {
    pub fn new() -> ShortestWeighting {
        ShortestWeighting { turn_costs: None }
    }

    pub fn with_turn_costs(turn_costs: TurnCostTable) -> ShortestWeighting {
        ShortestWeighting { turn_costs: Some(turn_costs) }
    }
}

impl Weighting for ShortestWeighting {
    fn edge_weight(&self, edge: &EdgeData) -> Weight {
        edge.distance
    }

    fn turn_weight(&self, from: EdgeId, via: NodeId, to: EdgeId) -> Weight {
        match &self.turn_costs {
            Some(t) if t.cost(from, via, to) == INFINITY => INFINITY,
            _ => 0.0,
        }
    }

    fn turn_duration(&self, from: EdgeId, via: NodeId, to: EdgeId) -> f64 {
        self.turn_costs.as_ref().map(|t| t.cost(from, via, to)).unwrap_or(0.0)
    }

    fn has_turn_costs(&self) -> bool {
        self.turn_costs.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 0 --e0-- 1 --e1-- 2, with a shortcut from 0 to 2
    fn graph() -> RoadGraph {
        let mut builder = GraphBuilder::new(3);
        builder.add_edge(0, 1, 100.0, 10.0, true, true);
        builder.add_edge(1, 2, 200.0, 20.0, true, true);
        builder.add_shortcut(0, 2, [0, 1], 30.0);
        builder.build().unwrap()
    }

    #[test]
    fn turn_costs_are_oriented_in_travel_direction() {
        let graph = graph();
        let mut turns = TurnCostTable::new(50.0);
        turns.add_turn_cost(0, 1, 1, 5.0);
        let weighting = FastestWeighting::with_turn_costs(turns);

        assert_eq!(weighting.calc_weight(&graph, 1, 1, Direction::Forward, 0, TurnMode::Restricted), 25.0);
        // a backward search arriving at 1 over e1 relaxes e0, which is traveled before e1
        assert_eq!(weighting.calc_weight(&graph, 0, 1, Direction::Backward, 1, TurnMode::Restricted), 15.0);
        // the reverse turn has no cost
        assert_eq!(weighting.calc_weight(&graph, 0, 1, Direction::Forward, 1, TurnMode::Restricted), 10.0);
    }

    #[test]
    fn u_turns_only_in_restricted_mode() {
        let graph = graph();
        let weighting = FastestWeighting::with_turn_costs(TurnCostTable::new(50.0));
        assert_eq!(weighting.calc_weight(&graph, 0, 1, Direction::Forward, 0, TurnMode::Restricted), 60.0);
        assert_eq!(weighting.calc_weight(&graph, 0, 1, Direction::Forward, 0, TurnMode::Unrestricted), 10.0);
        assert_eq!(weighting.calc_turn_duration(&graph, 0, 1, Direction::Forward, 0, TurnMode::Restricted), 50.0);
    }

    #[test]
    fn turns_onto_shortcuts_use_their_end_edges() {
        let graph = graph();
        let mut turns = TurnCostTable::new(INFINITY);
        turns.add_turn_cost(7, 0, 0, 4.0);
        turns.add_turn_cost(1, 2, 9, 6.0);
        turns.restrict_turn(7, 0, 2);
        let weighting = FastestWeighting::with_turn_costs(turns);
        assert_eq!(weighting.calc_weight(&graph, 2, 0, Direction::Forward, 7, TurnMode::Restricted), 34.0);
        assert_eq!(weighting.calc_turn_duration(&graph, 2, 0, Direction::Forward, 7, TurnMode::Restricted), 4.0);
        // backward searches enter the shortcut at its head, over e1
        assert_eq!(weighting.calc_weight(&graph, 2, 2, Direction::Backward, 9, TurnMode::Restricted), 36.0);
        assert_eq!(weighting.calc_weight(&graph, 2, 0, Direction::Forward, 7, TurnMode::Unrestricted), 30.0);
    }

    #[test]
    fn shortest_only_respects_restrictions() {
        let graph = graph();
        let mut turns = TurnCostTable::new(50.0);
        turns.restrict_turn(0, 1, 1);
        let weighting = ShortestWeighting::with_turn_costs(turns);
        assert_eq!(weighting.calc_weight(&graph, 1, 1, Direction::Forward, 0, TurnMode::Restricted), INFINITY);
        assert_eq!(weighting.calc_weight(&graph, 0, 1, Direction::Forward, 0, TurnMode::Restricted), 100.0);
        assert_eq!(weighting.calc_turn_duration(&graph, 0, 1, Direction::Forward, 0, TurnMode::Restricted), 50.0);
    }
}
