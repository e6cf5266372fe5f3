//! Search algorithms for travel cost matrices.

use crate::matrix::{MatrixRequest, MatrixResult};

pub mod core_matrix;
pub mod weighting;

/// Common interface of matrix query servers.
///
/// Servers borrow the graph and own all per query state, so each thread needs its own server.
/// Running a query invalidates whatever state the previous query left behind.
pub trait MatrixQueryServer {
    type Error;

    fn matrix(&mut self, request: &MatrixRequest) -> Result<MatrixResult, Self::Error>;
}
