//! Tuning knobs of matrix queries.

/// Default limit for the number of nodes settled per query, summed over both search phases.
#[cfg(not(override_max_visited_nodes))]
pub const MAX_VISITED_NODES: usize = 100_000_000;
#[cfg(override_max_visited_nodes)]
pub const MAX_VISITED_NODES: usize = include!(concat!(env!("OUT_DIR"), "/CORE_MATRIX_MAX_VISITED_NODES"));

/// How the per origin weights of a tree entry are combined into its queue key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriorityAggregation {
    /// Mean over all reached origins.
    /// Tends to settle entries which are good for many origins first.
    #[default]
    Average,
    /// Smallest weight over all reached origins.
    /// A lower bound for everything derived from the entry, which allows stopping the core search
    /// as soon as no destination can improve anymore.
    Minimum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixConfig {
    pub max_visited_nodes: usize,
    /// Only core nodes on the turn restricted level are handled edge based.
    pub approximate: bool,
    pub priority: PriorityAggregation,
    /// Search from the destinations when there are fewer of them than sources.
    pub allow_swap: bool,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        MatrixConfig {
            max_visited_nodes: MAX_VISITED_NODES,
            approximate: false,
            priority: PriorityAggregation::default(),
            allow_swap: true,
        }
    }
}

impl MatrixConfig {
    pub fn with_max_visited_nodes(mut self, max_visited_nodes: usize) -> Self {
        self.max_visited_nodes = max_visited_nodes;
        self
    }

    pub fn with_priority(mut self, priority: PriorityAggregation) -> Self {
        self.priority = priority;
        self
    }

    pub fn approximate(mut self, approximate: bool) -> Self {
        self.approximate = approximate;
        self
    }

    pub fn allow_swap(mut self, allow_swap: bool) -> Self {
        self.allow_swap = allow_swap;
        self
    }

    /// Swap the roles of sources and destinations?
    pub fn should_swap(&self, num_sources: usize, num_destinations: usize) -> bool {
        self.allow_swap && num_sources > num_destinations
    }
}
