//! Many-to-many travel cost matrices on contraction hierarchies with an uncontracted core.
//!
//! The interesting stuff lives in `algo::core_matrix`.
//! `datastr` contains the graph representation and the priority queue the searches are built on.

#[macro_use]
pub mod report;
pub mod algo;
pub mod cli;
pub mod datastr;
pub mod io;
pub mod matrix;
pub mod util;

#[allow(dead_code)]
mod built_info {
    // The file has been placed there by the build script.
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}
