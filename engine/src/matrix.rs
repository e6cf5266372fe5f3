//! Request and result types of matrix queries.

use crate::datastr::graph::NodeId;
use serde::{Deserialize, Serialize};
use std::ops::BitOr;

/// Table value for pairs without a path, or whose path was not found within the search budget.
pub const UNREACHABLE: f64 = -1.0;

/// Set of metrics a matrix should contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatrixMetrics(u8);

impl MatrixMetrics {
    pub const DURATION: MatrixMetrics = MatrixMetrics(1);
    pub const DISTANCE: MatrixMetrics = MatrixMetrics(2);
    pub const WEIGHT: MatrixMetrics = MatrixMetrics(4);
    pub const ALL: MatrixMetrics = MatrixMetrics(7);

    pub fn contains(self, other: MatrixMetrics) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for MatrixMetrics {
    type Output = MatrixMetrics;

    fn bitor(self, rhs: MatrixMetrics) -> MatrixMetrics {
        MatrixMetrics(self.0 | rhs.0)
    }
}

impl Default for MatrixMetrics {
    fn default() -> Self {
        MatrixMetrics::DURATION
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    #[serde(alias = "m")]
    Meters,
    #[serde(alias = "km")]
    Kilometers,
    #[serde(alias = "mi")]
    Miles,
}

impl DistanceUnit {
    pub fn from_meters(self, meters: f64) -> f64 {
        match self {
            DistanceUnit::Meters => meters,
            DistanceUnit::Kilometers => meters / 1000.0,
            DistanceUnit::Miles => meters / 1609.344,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

/// Locations of one side of a matrix, already snapped to graph nodes.
/// `None` marks a location which could not be matched to the graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatrixLocations {
    nodes: Vec<Option<NodeId>>,
    #[serde(default)]
    coordinates: Vec<Option<Coordinate>>,
}

impl MatrixLocations {
    /// Coordinates are optional, if given there has to be one per node.
    pub fn new(nodes: Vec<Option<NodeId>>, coordinates: Vec<Option<Coordinate>>) -> MatrixLocations {
        assert!(coordinates.is_empty() || coordinates.len() == nodes.len());
        MatrixLocations { nodes, coordinates }
    }

    pub fn from_nodes<I: IntoIterator<Item = NodeId>>(nodes: I) -> MatrixLocations {
        MatrixLocations {
            nodes: nodes.into_iter().map(Some).collect(),
            coordinates: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Option<NodeId>] {
        &self.nodes
    }

    pub fn has_valid_nodes(&self) -> bool {
        self.nodes.iter().any(Option::is_some)
    }

    /// One entry per location, `None` where no coordinate was given.
    pub fn coordinates(&self) -> Vec<Option<Coordinate>> {
        if self.coordinates.is_empty() {
            vec![None; self.nodes.len()]
        } else {
            self.coordinates.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatrixRequest {
    pub sources: MatrixLocations,
    pub destinations: MatrixLocations,
    #[serde(default)]
    pub metrics: MatrixMetrics,
    #[serde(default)]
    pub units: DistanceUnit,
}

impl MatrixRequest {
    pub fn new(sources: MatrixLocations, destinations: MatrixLocations, metrics: MatrixMetrics) -> MatrixRequest {
        MatrixRequest {
            sources,
            destinations,
            metrics,
            units: DistanceUnit::default(),
        }
    }
}

/// Row major value tables, one row per source.
/// A table is only present if its metric was requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixTables {
    pub rows: usize,
    pub cols: usize,
    pub durations: Option<Vec<f64>>,
    pub distances: Option<Vec<f64>>,
    pub weights: Option<Vec<f64>>,
}

impl MatrixTables {
    pub fn new(metrics: MatrixMetrics, rows: usize, cols: usize) -> MatrixTables {
        let table = |metric| if metrics.contains(metric) { Some(vec![UNREACHABLE; rows * cols]) } else { None };
        MatrixTables {
            rows,
            cols,
            durations: table(MatrixMetrics::DURATION),
            distances: table(MatrixMetrics::DISTANCE),
            weights: table(MatrixMetrics::WEIGHT),
        }
    }

    pub fn table(&self, metric: MatrixMetrics) -> Option<&[f64]> {
        match metric {
            MatrixMetrics::DURATION => self.durations.as_deref(),
            MatrixMetrics::DISTANCE => self.distances.as_deref(),
            MatrixMetrics::WEIGHT => self.weights.as_deref(),
            _ => None,
        }
    }

    /// Mirror the tables along the diagonal, rows become columns.
    pub fn transposed(self) -> MatrixTables {
        let (rows, cols) = (self.rows, self.cols);
        let flip = |table: Option<Vec<f64>>| table.map(|table| transpose(&table, rows, cols));
        MatrixTables {
            rows: cols,
            cols: rows,
            durations: flip(self.durations),
            distances: flip(self.distances),
            weights: flip(self.weights),
        }
    }
}

/// Transpose a row major `rows x cols` table into a row major `cols x rows` table.
///
/// A search run with swapped roles produces `value(dst, src)` at `dst * src_count + src`.
/// Transposing moves it to `src * dst_count + dst`.
pub fn transpose(table: &[f64], rows: usize, cols: usize) -> Vec<f64> {
    assert_eq!(table.len(), rows * cols);
    let mut transposed = vec![0.0; table.len()];
    for row in 0..rows {
        for col in 0..cols {
            transposed[col * rows + row] = table[row * cols + col];
        }
    }
    transposed
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixResult {
    pub sources: Vec<Option<Coordinate>>,
    pub destinations: Vec<Option<Coordinate>>,
    #[serde(flatten)]
    pub tables: MatrixTables,
}

impl MatrixResult {
    /// Value for one pair, `None` if the metric was not requested.
    pub fn get(&self, metric: MatrixMetrics, source: usize, destination: usize) -> Option<f64> {
        assert!(source < self.tables.rows && destination < self.tables.cols);
        self.tables.table(metric).map(|table| table[source * self.tables.cols + destination])
    }
}
