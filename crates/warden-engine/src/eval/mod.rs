//! Static evaluation: the leaf scorer consulted by quiescence search.

pub mod material;
pub mod phase;
pub mod pst;

use warden_core::Position;

use crate::analysis::AnalysisResult;

pub use material::MaterialEvaluator;
pub use phase::{MAX_PHASE, game_phase};
pub use pst::PstEvaluator;

/// Turns a position into a static score.
///
/// Implementations must be deterministic and White-relative, and adding
/// material to a side must never lower that side's score. The returned
/// result is an estimate: `needs_deeper` is set and the depth provenance is 0.
pub trait Evaluator: Send + Sync {
    fn evaluate<P: Position>(&self, pos: &P) -> AnalysisResult;
}

impl<E: Evaluator> Evaluator for &E {
    fn evaluate<P: Position>(&self, pos: &P) -> AnalysisResult {
        (**self).evaluate(pos)
    }
}
