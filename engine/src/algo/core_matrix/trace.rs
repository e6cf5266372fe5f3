//! Hooks for looking into a running search.
//!
//! All methods default to doing nothing and the searches are generic over the hook,
//! so `NoTrace` compiles down to the plain search.

use crate::datastr::graph::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    OutsideCore,
    InCore,
}

pub trait SearchTrace {
    /// A tree entry at `node` was taken from the queue.
    fn settled(&mut self, _node: NodeId, _phase: Phase) {}

    /// The cost of `origin` at `node` went from `old` to `new`.
    fn improved(&mut self, _node: NodeId, _origin: usize, _old: Weight, _new: Weight) {}

    /// One step of a reconstructed path, reported from the destination back to the origin.
    /// `edge` is the edge the path used to get to `node`, `NO_EDGE` at the origin.
    fn path_step(&mut self, _node: NodeId, _edge: EdgeId, _weight: Weight) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoTrace;

impl SearchTrace for NoTrace {}
