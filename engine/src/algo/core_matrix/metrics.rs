//! Turning the final search forest into matrix tables.

use super::targets::TargetMap;
use crate::{datastr::graph::*, matrix::*};

pub struct MetricsExtractor {
    metrics: MatrixMetrics,
    units: DistanceUnit,
}

impl MetricsExtractor {
    pub fn new(metrics: MatrixMetrics, units: DistanceUnit) -> Self {
        MetricsExtractor { metrics, units }
    }

    /// Everything unreachable, for queries without a single valid source or destination.
    pub fn set_empty_values(&self, tables: &mut MatrixTables) {
        for table in [&mut tables.durations, &mut tables.distances, &mut tables.weights].into_iter().flatten() {
            table.iter_mut().for_each(|value| *value = UNREACHABLE);
        }
    }

    /// Fill one row per origin and one column per destination.
    /// All metrics of a cell come from the one path its weight belongs to.
    pub fn calc_values(&self, targets: &TargetMap, destinations: &[Option<NodeId>], tables: &mut MatrixTables) {
        debug_assert_eq!(tables.cols, destinations.len());
        self.set_empty_values(tables);

        for (col, node) in destinations.iter().enumerate() {
            let Some(items) = node.and_then(|node| targets.items(node)) else {
                continue;
            };

            for (origin, item) in items.iter().enumerate().filter(|(_, item)| item.is_reached()) {
                let index = origin * tables.cols + col;
                if let Some(weights) = &mut tables.weights {
                    weights[index] = item.weight;
                }
                if let Some(distances) = &mut tables.distances {
                    distances[index] = self.units.from_meters(item.distance);
                }
                if let Some(durations) = &mut tables.durations {
                    durations[index] = item.duration;
                }
            }
        }
    }
}
