//! Best known costs of all origins at the destination nodes.

use super::tree::CostItem;
use crate::datastr::graph::*;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct TargetMap {
    origins: usize,
    // origins which actually have a source node, the others never reach anything
    valid_origins: Vec<usize>,
    // destination node -> index of its item block, `None` until reached
    index: HashMap<NodeId, Option<usize>>,
    items: Vec<CostItem>,
    // cached `weight_bound`, `None` when invalidated
    bound: Option<Weight>,
}

impl TargetMap {
    pub fn new() -> TargetMap {
        Default::default()
    }

    /// Forget everything and register a new set of destinations.
    pub fn reset(&mut self, sources: &[Option<NodeId>], destinations: &[Option<NodeId>]) {
        self.origins = sources.len();
        self.valid_origins.clear();
        self.valid_origins
            .extend(sources.iter().enumerate().filter(|(_, node)| node.is_some()).map(|(origin, _)| origin));
        self.index.clear();
        self.index.extend(destinations.iter().flatten().map(|&node| (node, None)));
        self.items.clear();
        self.bound = None;
    }

    #[inline]
    pub fn is_target(&self, node: NodeId) -> bool {
        self.index.contains_key(&node)
    }

    /// Number of distinct destination nodes.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Costs at `node`, `None` if it was never reached by any origin.
    pub fn items(&self, node: NodeId) -> Option<&[CostItem]> {
        self.index
            .get(&node)
            .copied()
            .flatten()
            .map(|block| &self.items[block * self.origins..(block + 1) * self.origins])
    }

    /// Take over all items of a tree entry at destination `node` which are better than the known ones.
    /// Returns whether anything improved.
    pub fn fold(&mut self, node: NodeId, candidates: &[CostItem]) -> bool {
        debug_assert_eq!(candidates.len(), self.origins);
        let block = match self.index.get(&node) {
            None => return false,
            Some(&Some(block)) => block,
            Some(&None) => {
                let block = self.items.len() / self.origins.max(1);
                self.index.insert(node, Some(block));
                self.items.resize(self.items.len() + self.origins, CostItem::UNREACHED);
                block
            }
        };

        let mut improved = false;
        for (known, candidate) in self.items[block * self.origins..(block + 1) * self.origins].iter_mut().zip(candidates) {
            if candidate.weight < known.weight {
                *known = CostItem { update: false, ..*candidate };
                improved = true;
            }
        }
        if improved {
            self.bound = None;
        }
        improved
    }

    /// Largest weight any destination still might improve from.
    /// `INFINITY` as long as some valid origin has not reached some destination.
    pub fn weight_bound(&mut self) -> Weight {
        if let Some(bound) = self.bound {
            return bound;
        }
        let mut bound: Weight = 0.0;
        for block in self.index.values().copied() {
            let Some(block) = block else {
                bound = INFINITY;
                break;
            };
            let items = &self.items[block * self.origins..(block + 1) * self.origins];
            for &origin in &self.valid_origins {
                bound = bound.max(items[origin].weight);
            }
        }
        self.bound = Some(bound);
        bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(weight: Weight) -> CostItem {
        CostItem { weight, ..CostItem::UNREACHED }
    }

    #[test]
    fn folds_only_improvements_at_destinations() {
        let mut targets = TargetMap::new();
        targets.reset(&[Some(0), Some(1)], &[Some(5), None, Some(6)]);
        assert_eq!(targets.len(), 2);
        assert!(targets.is_target(5));
        assert!(!targets.is_target(0));
        assert!(targets.items(5).is_none());

        assert!(!targets.fold(4, &[item(1.0), item(1.0)]));
        assert!(targets.fold(5, &[item(3.0), CostItem::UNREACHED]));
        assert!(targets.fold(5, &[item(4.0), item(2.0)]));
        assert!(!targets.fold(5, &[item(3.0), item(2.0)]));

        let items = targets.items(5).unwrap();
        assert_eq!((items[0].weight, items[1].weight), (3.0, 2.0));
    }

    #[test]
    fn bound_covers_all_valid_origins() {
        let mut targets = TargetMap::new();
        targets.reset(&[Some(0), None], &[Some(5), Some(6)]);
        assert_eq!(targets.weight_bound(), INFINITY);
        targets.fold(5, &[item(3.0), CostItem::UNREACHED]);
        assert_eq!(targets.weight_bound(), INFINITY);
        targets.fold(6, &[item(7.0), CostItem::UNREACHED]);
        // origin 1 has no source and is ignored
        assert_eq!(targets.weight_bound(), 7.0);
        targets.fold(6, &[item(1.0), CostItem::UNREACHED]);
        assert_eq!(targets.weight_bound(), 3.0);
    }
}
