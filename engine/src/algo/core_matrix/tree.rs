//! The shared search forest of multi origin searches.
//!
//! Every origin grows its own shortest path tree, but all trees live in one arena of `TreeEntry`s.
//! An entry stands for a node (or, in the edge based part of the core, a node reached over a particular edge)
//! and holds one `CostItem` per origin.
//! Parent links are arena slots, so the forest is a plain append only `Vec` without any reference counting.

use super::config::PriorityAggregation;
use crate::{
    datastr::{graph::*, index_heap::Indexing},
    util::{in_range_option::InRangeOption, NonNan},
};

/// Index of a tree entry in the forest arena.
pub type Slot = u32;

/// Tentative path of one origin to one tree entry.
///
/// Distance and duration are summed up along the path while it is built,
/// parents may improve later on without the child noticing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostItem {
    pub weight: Weight,
    /// meters
    pub distance: f64,
    /// seconds, turn times included
    pub duration: f64,
    /// last edge of the path, `NO_EDGE` at the root
    pub edge: EdgeId,
    /// last base edge of the path, differs from `edge` for shortcuts
    pub turn_edge: EdgeId,
    /// original id of `turn_edge`
    pub original_edge: EdgeId,
    /// entry the path came from
    pub parent: InRangeOption<Slot>,
    /// improved since the entry was last relaxed
    pub update: bool,
}

impl CostItem {
    pub const UNREACHED: CostItem = CostItem {
        weight: INFINITY,
        distance: INFINITY,
        duration: INFINITY,
        edge: NO_EDGE,
        turn_edge: NO_EDGE,
        original_edge: NO_EDGE,
        parent: InRangeOption::NONE,
        update: false,
    };

    /// Start of the path of an origin.
    pub fn root() -> CostItem {
        CostItem {
            weight: 0.0,
            distance: 0.0,
            duration: 0.0,
            update: true,
            ..CostItem::UNREACHED
        }
    }

    #[inline]
    pub fn is_reached(&self) -> bool {
        self.weight < INFINITY
    }

    /// Take over `path` if it is strictly better.
    /// Weights never increase.
    #[inline]
    pub fn improve(&mut self, path: CostItem) -> bool {
        if path.weight < self.weight {
            *self = CostItem { update: true, ..path };
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeEntry {
    pub node: NodeId,
    /// edge the entry was created for, meaningful for edge based entries
    pub edge: EdgeId,
    pub original_edge: EdgeId,
    /// settled at the core boundary during the outside core phase
    pub entry_point: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MultiTreeForest {
    origins: usize,
    entries: Vec<TreeEntry>,
    // `origins` consecutive items per entry
    items: Vec<CostItem>,
}

impl MultiTreeForest {
    pub fn new(origins: usize) -> MultiTreeForest {
        MultiTreeForest {
            origins,
            ..Default::default()
        }
    }

    /// Drop all entries and resize for a new number of origins.
    pub fn reset(&mut self, origins: usize) {
        self.origins = origins;
        self.entries.clear();
        self.items.clear();
    }

    pub fn origins(&self) -> usize {
        self.origins
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry with all origins unreached.
    pub fn add_entry(&mut self, node: NodeId, edge: EdgeId, original_edge: EdgeId) -> Slot {
        let slot = self.entries.len() as Slot;
        self.entries.push(TreeEntry {
            node,
            edge,
            original_edge,
            entry_point: false,
        });
        self.items.resize(self.items.len() + self.origins, CostItem::UNREACHED);
        slot
    }

    #[inline]
    pub fn entry(&self, slot: Slot) -> &TreeEntry {
        &self.entries[slot as usize]
    }

    #[inline]
    pub fn entry_mut(&mut self, slot: Slot) -> &mut TreeEntry {
        &mut self.entries[slot as usize]
    }

    #[inline]
    pub fn items(&self, slot: Slot) -> &[CostItem] {
        let start = slot as usize * self.origins;
        &self.items[start..start + self.origins]
    }

    #[inline]
    pub fn items_mut(&mut self, slot: Slot) -> &mut [CostItem] {
        let start = slot as usize * self.origins;
        &mut self.items[start..start + self.origins]
    }
}

impl PriorityAggregation {
    /// Queue key over all reached items, `INFINITY` if there are none.
    pub fn key(self, items: &[CostItem]) -> Weight {
        let reached = items.iter().filter(|item| item.is_reached()).map(|item| item.weight);
        match self {
            PriorityAggregation::Minimum => reached.fold(INFINITY, Weight::min),
            PriorityAggregation::Average => {
                let (sum, count) = reached.fold((0.0, 0usize), |(sum, count), weight| (sum + weight, count + 1));
                if count == 0 {
                    INFINITY
                } else {
                    sum / count as Weight
                }
            }
        }
    }
}

/// Queue element, ordered by key with the slot as tie breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct State {
    pub key: NonNan,
    pub slot: Slot,
}

impl Indexing for State {
    #[inline]
    fn as_index(&self) -> usize {
        self.slot as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_are_laid_out_per_entry() {
        let mut forest = MultiTreeForest::new(3);
        let a = forest.add_entry(10, NO_EDGE, NO_EDGE);
        let b = forest.add_entry(11, 4, 4);
        forest.items_mut(b)[2] = CostItem::root();

        assert_eq!(forest.len(), 2);
        assert_eq!(forest.entry(b).node, 11);
        assert!(forest.items(a).iter().all(|item| !item.is_reached()));
        assert_eq!(forest.items(b)[2].weight, 0.0);
        assert!(!forest.items(b)[1].is_reached());

        forest.reset(1);
        assert!(forest.is_empty());
        let c = forest.add_entry(5, NO_EDGE, NO_EDGE);
        assert_eq!(forest.items(c).len(), 1);
    }

    fn path(weight: Weight, edge: EdgeId, parent: Slot) -> CostItem {
        CostItem {
            weight,
            distance: weight * 10.0,
            duration: weight,
            edge,
            turn_edge: edge,
            original_edge: edge,
            parent: InRangeOption::some(parent),
            update: false,
        }
    }

    #[test]
    fn improvements_are_strict() {
        let mut item = CostItem::UNREACHED;
        assert!(item.improve(path(10.0, 1, 0)));
        assert_eq!(item.parent.value(), Some(0));
        assert!(item.update);
        item.update = false;
        assert!(!item.improve(path(10.0, 2, 1)));
        assert!(!item.update);
        assert_eq!(item.edge, 1);
        assert!(item.improve(path(7.5, 2, 1)));
        assert_eq!((item.weight, item.distance, item.duration, item.edge), (7.5, 75.0, 7.5, 2));
    }

    #[test]
    fn key_aggregation_skips_unreached_items() {
        let mut items = [CostItem::UNREACHED; 3];
        assert_eq!(PriorityAggregation::Average.key(&items), INFINITY);
        items[0].weight = 2.0;
        items[2].weight = 6.0;
        assert_eq!(PriorityAggregation::Average.key(&items), 4.0);
        assert_eq!(PriorityAggregation::Minimum.key(&items), 2.0);
    }
}
