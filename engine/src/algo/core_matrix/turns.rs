//! Telling real turns apart from transitions between virtual pieces of one road.
//!
//! When a location is snapped onto an edge, the edge is split into virtual edges which all carry the id of the real edge.
//! Moving from one virtual piece onto its sibling is driving straight on along the same road.
//! Looked up by original edge ids it would look exactly like a U-turn though.
//! Leaving over the very same edge id one arrived on is a real U-turn and has to pay for it.

use crate::algo::weighting::TurnMode;
use crate::datastr::graph::EdgeId;

/// Turn handling for relaxing `edge` after arriving over `prev_edge`.
#[inline]
pub fn turn_mode(prev_edge: EdgeId, prev_original: EdgeId, edge: EdgeId, original: EdgeId) -> TurnMode {
    if prev_edge == edge || prev_original != original {
        TurnMode::Restricted
    } else {
        TurnMode::Unrestricted
    }
}
